#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use sea_battle::{
    cli::{coord_label, describe_shot, parse_coord, parse_placement, render_grid},
    init_logging,
    transport::tcp,
    GameMode, Grid, MatchEngine, MatchEvent, PeerSession, SaveStore, Seat, Settings, SharedStats,
    StatsStore, TurnDelay, FLEET, GRID_SIZE,
};

#[cfg(feature = "std")]
use clap::{Parser, Subcommand};
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use std::path::PathBuf;
#[cfg(feature = "std")]
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
#[cfg(feature = "std")]
use tokio::sync::oneshot;
#[cfg(feature = "std")]
use tokio::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    /// Directory holding saved matches.
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,
    /// File holding win/loss statistics.
    #[arg(long, global = true)]
    stats_file: Option<PathBuf>,
    /// Computer think-time in milliseconds.
    #[arg(long, global = true)]
    think_ms: Option<u64>,
    #[arg(long, global = true, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[cfg(feature = "std")]
enum Commands {
    /// Play against the computer.
    Solo {
        /// Resume a saved match instead of starting a new one.
        #[arg(long)]
        load: Option<String>,
        /// Place your fleet by hand.
        #[arg(long)]
        manual: bool,
    },
    /// Two players taking turns at one terminal.
    Hotseat,
    /// Host an online match and wait for a peer.
    Host {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        manual: bool,
    },
    /// Join an online match.
    Join {
        #[arg(long, default_value = "127.0.0.1:5000")]
        connect: String,
        #[arg(long)]
        manual: bool,
    },
    /// Show or reset the win/loss statistics.
    Stats {
        #[arg(long)]
        reset: bool,
    },
    /// List saved matches.
    Saves,
}

#[cfg(feature = "std")]
type Input = Lines<BufReader<Stdin>>;

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut settings = Settings::default();
    if let Some(dir) = cli.save_dir {
        settings.save_dir = dir;
    }
    if let Some(path) = cli.stats_file {
        settings.stats_path = path;
    }
    if let Some(ms) = cli.think_ms {
        settings.think_time = Duration::from_millis(ms);
    }
    let mut rng = if let Some(s) = cli.seed {
        println!("Using fixed seed: {} (game will be reproducible)", s);
        SmallRng::seed_from_u64(s)
    } else {
        let mut seed_rng = rand::rng();
        SmallRng::from_rng(&mut seed_rng)
    };

    let stats = SharedStats::new(StatsStore::open(&settings.stats_path));
    let saves = SaveStore::new(&settings.save_dir);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match cli.command {
        Commands::Solo { load, manual } => {
            let engine = match load {
                Some(name) => {
                    let snapshot = saves.load(&name)?;
                    if snapshot.mode != GameMode::VsComputer {
                        anyhow::bail!("{:?} is not a match against the computer", name);
                    }
                    MatchEngine::restore(snapshot, SmallRng::from_rng(&mut rng))?
                }
                None => {
                    let human = fleet(&mut input, &mut rng, manual).await?;
                    let computer = Grid::with_random_fleet(&mut rng);
                    MatchEngine::vs_computer(human, computer, SmallRng::from_rng(&mut rng))
                }
            };
            let engine = engine.with_scoreboard(Box::new(stats.clone()));
            run_solo(engine, &mut input, &saves, settings.think_time).await?;
        }
        Commands::Hotseat => {
            let one = Grid::with_random_fleet(&mut rng);
            let two = Grid::with_random_fleet(&mut rng);
            let engine = MatchEngine::hotseat(one, two, SmallRng::from_rng(&mut rng))
                .with_scoreboard(Box::new(stats.clone()));
            run_hotseat(engine, &mut input).await?;
        }
        Commands::Host { port, manual } => {
            let local = fleet(&mut input, &mut rng, manual).await?;
            let port = port.unwrap_or(settings.port);
            println!("Waiting for a player to connect on port {}...", port);
            let listener = tcp::bind(("0.0.0.0", port)).await?;
            let (link, addr) = tcp::accept(&listener, Duration::from_secs(3600)).await?;
            println!("Player connected from {}", addr);
            let engine = MatchEngine::online(local, true, SmallRng::from_rng(&mut rng))
                .with_scoreboard(Box::new(stats.clone()));
            run_online(PeerSession::new(engine, link)?, &mut input).await?;
        }
        Commands::Join { connect, manual } => {
            let local = fleet(&mut input, &mut rng, manual).await?;
            println!("Connecting to {}...", connect);
            let link = tcp::connect(connect.as_str(), settings.io_timeout).await?;
            println!("Connected successfully!");
            let engine = MatchEngine::online(local, false, SmallRng::from_rng(&mut rng))
                .with_scoreboard(Box::new(stats.clone()));
            run_online(PeerSession::new(engine, link)?, &mut input).await?;
        }
        Commands::Stats { reset } => {
            if reset {
                stats.reset()?;
                println!("Statistics reset.");
            }
            print!("{}", stats.snapshot()?.summary());
        }
        Commands::Saves => {
            let names = saves.list()?;
            if names.is_empty() {
                println!("No saved matches in {}", saves.dir().display());
            }
            for name in names {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "std")]
async fn prompt(input: &mut Input, text: &str) -> anyhow::Result<Option<String>> {
    use std::io::Write;
    print!("{}", text);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?.map(|l| l.trim().to_string()))
}

/// Random fleet, or one placed ship by ship from the terminal. An empty line
/// places the rest of the fleet at random.
#[cfg(feature = "std")]
async fn fleet(input: &mut Input, rng: &mut SmallRng, manual: bool) -> anyhow::Result<Grid> {
    if !manual {
        return Ok(Grid::with_random_fleet(rng));
    }
    let mut grid = Grid::new();
    println!("Place your ships (e.g. A5 H). Press enter to place the rest at random.");
    for (i, &len) in FLEET.iter().enumerate() {
        loop {
            print!("{}", render_grid(&grid, true));
            let Some(line) = prompt(input, &format!("Ship {} (length {}): ", i + 1, len)).await?
            else {
                anyhow::bail!("input closed during placement");
            };
            if line.is_empty() {
                return Ok(complete_fleet(grid, i, rng));
            }
            match parse_placement(&line) {
                Some((c, horizontal)) if grid.place(len, c.row, c.col, horizontal) => break,
                Some(_) => println!("That ship does not fit there."),
                None => println!("Invalid input"),
            }
        }
    }
    Ok(grid)
}

#[cfg(feature = "std")]
fn complete_fleet(mut grid: Grid, from: usize, rng: &mut SmallRng) -> Grid {
    use rand::Rng;
    for &len in &FLEET[from..] {
        let placed = (0..10_000).any(|_| {
            let horizontal: bool = rng.random();
            let r = rng.random_range(0..GRID_SIZE);
            let c = rng.random_range(0..GRID_SIZE);
            grid.place(len, r, c, horizontal)
        });
        if !placed {
            println!("No room left for the remaining ships, placing the whole fleet at random.");
            return Grid::with_random_fleet(rng);
        }
    }
    grid
}

#[cfg(feature = "std")]
fn show(engine: &MatchEngine, title: &str) {
    println!("\nOpponent board:");
    print!("{}", render_grid(engine.opponent_grid(), false));
    println!("\n{}:", title);
    print!("{}", render_grid(engine.my_grid(), true));
}

#[cfg(feature = "std")]
async fn run_solo(
    mut engine: MatchEngine,
    input: &mut Input,
    saves: &SaveStore,
    think_time: Duration,
) -> anyhow::Result<()> {
    let mut delay = TurnDelay::new(think_time);
    while !engine.is_game_over() {
        if engine.active_side() == Seat::Second {
            println!("Computer is thinking...");
            let (tx, rx) = oneshot::channel();
            delay.schedule(move || {
                let _ = tx.send(());
            });
            if rx.await.is_err() {
                break;
            }
            if let Some(report) = engine.computer_shot() {
                println!("Computer fires at {}", describe_shot(&report));
            }
            continue;
        }
        show(&engine, "Your board");
        let Some(line) = prompt(input, "Your shot (e.g. B7), 'save <name>' or 'quit': ").await?
        else {
            break;
        };
        if line == "quit" {
            break;
        }
        if let Some(name) = line.strip_prefix("save ") {
            match saves.save(name, &engine.snapshot()) {
                Ok(path) => println!("Saved to {}", path.display()),
                Err(e) => println!("Could not save: {:#}", e),
            }
            continue;
        }
        let Some(c) = parse_coord(&line) else {
            println!("Invalid input");
            continue;
        };
        match engine.fire(c.row, c.col)? {
            Some(report) => println!("{}", describe_shot(&report)),
            None => println!("Not your turn."),
        }
    }
    delay.cancel();
    finish_local(&mut engine);
    Ok(())
}

#[cfg(feature = "std")]
async fn run_hotseat(mut engine: MatchEngine, input: &mut Input) -> anyhow::Result<()> {
    while !engine.is_game_over() {
        let player = if engine.active_side() == Seat::First { 1 } else { 2 };
        if engine.is_switch_pending() {
            let next = 3 - player;
            if prompt(input, &format!("Pass the terminal to player {} and press enter ", next))
                .await?
                .is_none()
            {
                break;
            }
            engine.acknowledge_handoff();
            print!("\x1b[2J\x1b[H");
            continue;
        }
        show(&engine, &format!("Player {} board", player));
        let Some(line) = prompt(input, &format!("Player {}, your shot: ", player)).await? else {
            break;
        };
        if line == "quit" {
            break;
        }
        match parse_coord(&line) {
            Some(c) => {
                if let Some(report) = engine.fire(c.row, c.col)? {
                    println!("{}", describe_shot(&report));
                }
            }
            None => println!("Invalid input"),
        }
    }
    if let Some(winner) = engine.winner() {
        let n = if winner == Seat::First { 1 } else { 2 };
        println!("\nGAME OVER: player {} wins!", n);
    }
    report_stats_error(&mut engine);
    Ok(())
}

#[cfg(feature = "std")]
fn finish_local(engine: &mut MatchEngine) {
    if engine.is_game_over() {
        show(engine, "Your board");
        match engine.winner() {
            Some(Seat::First) => println!("\nVICTORY! You have sunk all enemy ships!"),
            _ => println!("\nDEFEAT. All your ships have been destroyed."),
        }
    }
    report_stats_error(engine);
}

#[cfg(feature = "std")]
fn report_stats_error(engine: &mut MatchEngine) {
    if let Some(e) = engine.take_stats_error() {
        eprintln!("Could not update statistics: {:#}", e);
    }
}

#[cfg(feature = "std")]
async fn run_online(mut session: PeerSession, input: &mut Input) -> anyhow::Result<()> {
    let mut events = session.start().await;
    let mut result = None;
    loop {
        for event in events.drain(..) {
            match event {
                MatchEvent::OpponentReady => println!("Opponent is ready."),
                MatchEvent::TurnChanged { my_turn: true } => {
                    show(session.engine(), "Your board");
                    println!("Your turn. Enter a target (e.g. B7) or 'quit'.");
                }
                MatchEvent::TurnChanged { my_turn: false } => {
                    println!("Waiting for opponent's move...")
                }
                MatchEvent::LocalShotResult(report) => println!("{}", describe_shot(&report)),
                MatchEvent::IncomingShot(report) => {
                    println!("Opponent fires at {}", describe_shot(&report))
                }
                MatchEvent::GameOver { local_won } => result = Some(local_won),
                MatchEvent::NetworkError(e) => println!("Network error: {}", e),
            }
        }
        if session.is_closed() {
            break;
        }
        tokio::select! {
            inbound = session.recv() => match inbound {
                Some(inbound) => events = session.handle(inbound).await,
                None => break,
            },
            line = input.next_line() => match line?.map(|l| l.trim().to_string()) {
                None => events = session.leave().await,
                Some(l) if l == "quit" => events = session.leave().await,
                Some(l) => match parse_coord(&l) {
                    Some(c) => {
                        events = session.fire(c.row, c.col).await?;
                        if session.protocol().pending_shot() == Some(c) {
                            println!("Firing at {}...", coord_label(c));
                        } else {
                            println!("You cannot fire there now.");
                        }
                    }
                    None => println!("Invalid input"),
                },
            },
        }
    }
    session.shutdown().await;
    match result {
        Some(true) => println!("\nVICTORY!"),
        Some(false) => println!("\nDEFEAT."),
        None => println!("\nMatch abandoned."),
    }
    Ok(())
}
