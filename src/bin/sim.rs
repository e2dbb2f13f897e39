use rand::{rngs::SmallRng, SeedableRng};
use sea_battle::{transport::in_memory, Grid, MatchEngine, PeerSession};
use serde_json::json;
use tokio::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;

    let mut rng1 = SmallRng::seed_from_u64(seed1);
    let mut rng2 = SmallRng::seed_from_u64(seed2);

    let g1 = Grid::with_random_fleet(&mut rng1);
    let g2 = Grid::with_random_fleet(&mut rng2);
    let e1 = MatchEngine::online(g1, true, SmallRng::seed_from_u64(seed1));
    let e2 = MatchEngine::online(g2, false, SmallRng::seed_from_u64(seed2));

    let (l1, l2) = in_memory::pair(Duration::from_secs(5));
    let mut host = PeerSession::new(e1, l1)?;
    let mut guest = PeerSession::new(e2, l2)?;

    let (res1, res2) = tokio::try_join!(host.autoplay(&mut rng1), guest.autoplay(&mut rng2))?;

    let winner = match (res1.local_won, res2.local_won) {
        (Some(true), Some(false)) => Some("player1"),
        (Some(false), Some(true)) => Some("player2"),
        _ => None,
    };

    let result = json!({
        "player1": {"won": res1.local_won, "shots": res1.shots_fired},
        "player2": {"won": res2.local_won, "shots": res2.shots_fired},
        "winner": winner,
    });

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
