use rand::{rngs::SmallRng, SeedableRng};
use sea_battle::transport::{in_memory, tcp};
use sea_battle::{Grid, Link, MatchEngine, MatchEvent, PeerSession, ShotOutcome};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{timeout, Duration};

const IO_TIMEOUT: Duration = Duration::from_secs(5);

fn grid_with(ships: &[(usize, usize, usize, bool)]) -> Grid {
    let mut grid = Grid::new();
    for &(len, r, c, horizontal) in ships {
        assert!(grid.place(len, r, c, horizontal));
    }
    grid
}

fn session(grid: Grid, host: bool, link: Link) -> PeerSession {
    let engine = MatchEngine::online(grid, host, SmallRng::seed_from_u64(11));
    PeerSession::new(engine, link).unwrap()
}

async fn next(session: &mut PeerSession) -> Vec<MatchEvent> {
    timeout(IO_TIMEOUT, session.next_events())
        .await
        .expect("peer went quiet")
        .expect("session closed")
}

/// Host and guest over an in-memory pipe, READY already exchanged.
async fn started_pair() -> (PeerSession, PeerSession) {
    let (a, b) = in_memory::pair(IO_TIMEOUT);
    let mut host = session(grid_with(&[(1, 9, 9, true)]), true, a);
    let mut guest = session(grid_with(&[(2, 0, 0, true), (1, 5, 5, true)]), false, b);
    host.start().await;
    guest.start().await;
    assert_eq!(
        next(&mut host).await,
        vec![MatchEvent::OpponentReady, MatchEvent::TurnChanged { my_turn: true }]
    );
    assert_eq!(
        next(&mut guest).await,
        vec![MatchEvent::OpponentReady, MatchEvent::TurnChanged { my_turn: false }]
    );
    (host, guest)
}

#[tokio::test]
async fn shots_travel_both_ways() {
    let (mut host, mut guest) = started_pair().await;

    assert!(host.fire(0, 0).await.unwrap().is_empty());
    let incoming = next(&mut guest).await;
    match &incoming[0] {
        MatchEvent::IncomingShot(report) => assert_eq!(report.outcome, ShotOutcome::Hit),
        other => panic!("unexpected event {:?}", other),
    }
    let result = next(&mut host).await;
    match &result[0] {
        MatchEvent::LocalShotResult(report) => assert_eq!(report.outcome, ShotOutcome::Hit),
        other => panic!("unexpected event {:?}", other),
    }
    assert!(host.engine().is_my_turn());

    host.fire(4, 4).await.unwrap();
    let incoming = next(&mut guest).await;
    assert!(incoming.contains(&MatchEvent::TurnChanged { my_turn: true }));
    let result = next(&mut host).await;
    assert!(result.contains(&MatchEvent::TurnChanged { my_turn: false }));
    assert!(guest.engine().is_my_turn());
    assert!(!host.engine().is_my_turn());
}

#[tokio::test]
async fn leaving_hands_the_win_to_the_peer() {
    let (mut host, mut guest) = started_pair().await;

    let events = guest.leave().await;
    assert_eq!(events, vec![MatchEvent::GameOver { local_won: false }]);
    assert!(guest.is_closed());

    assert_eq!(next(&mut host).await, vec![MatchEvent::GameOver { local_won: true }]);
    assert!(host.is_closed());
    assert!(host.next_events().await.is_none());
}

#[tokio::test]
async fn vanished_peer_counts_as_a_network_win() {
    let (mut host, guest) = started_pair().await;
    drop(guest);

    let events = next(&mut host).await;
    assert!(matches!(events[0], MatchEvent::NetworkError(_)));
    assert_eq!(events[1], MatchEvent::GameOver { local_won: true });
    assert!(host.engine().is_game_over());
    assert!(host.is_closed());
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let (a, _b) = in_memory::pair(IO_TIMEOUT);
    let mut s = session(grid_with(&[(1, 0, 0, true)]), true, a);
    s.shutdown().await;
    s.shutdown().await;
    assert!(s.is_closed());
    assert!(s.recv().await.is_none());
    assert!(s.leave().await.is_empty());
}

#[tokio::test]
async fn junk_from_the_peer_is_skipped() {
    let (ours, mut theirs) = tokio::io::duplex(4096);
    let mut s = session(
        grid_with(&[(1, 0, 0, true)]),
        false,
        Link::from_stream(ours, IO_TIMEOUT),
    );
    s.start().await;

    let mut buf = [0u8; 6];
    theirs.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"READY\n");

    let long = "X".repeat(2_000);
    theirs
        .write_all(format!("HELLO\nSHOT 99 99\n{}\nREADY\n", long).as_bytes())
        .await
        .unwrap();

    let mut seen = Vec::new();
    while seen.is_empty() {
        seen = next(&mut s).await;
    }
    assert_eq!(
        seen,
        vec![MatchEvent::OpponentReady, MatchEvent::TurnChanged { my_turn: false }]
    );

    theirs.write_all(b"SHOT 0 0\n").await.unwrap();
    let events = next(&mut s).await;
    assert!(events.contains(&MatchEvent::GameOver { local_won: false }));

    let mut reply = String::new();
    theirs.read_to_string(&mut reply).await.unwrap();
    assert_eq!(reply, "RESULT SUNK 0,0\nGAME_OVER WIN\n");
}

#[tokio::test]
async fn autoplay_over_a_pipe_has_one_winner() {
    for seed in 0..3u64 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let (a, b) = in_memory::pair(IO_TIMEOUT);
        let mut host = session(Grid::with_random_fleet(&mut rng), true, a);
        let mut guest = session(Grid::with_random_fleet(&mut rng), false, b);
        let mut rng_a = SmallRng::seed_from_u64(seed + 100);
        let mut rng_b = SmallRng::seed_from_u64(seed + 200);

        let (ra, rb) = timeout(
            Duration::from_secs(30),
            async { tokio::try_join!(host.autoplay(&mut rng_a), guest.autoplay(&mut rng_b)) },
        )
        .await
        .expect("match did not finish")
        .unwrap();

        assert_eq!(ra.local_won.map(|w| !w), rb.local_won);
        assert!(ra.local_won.is_some());
        assert!(ra.shots_fired >= 1 && rb.shots_fired >= 1);
        let loser = if ra.local_won == Some(true) { &guest } else { &host };
        assert!(loser.engine().my_grid().all_sunk());
    }
}

#[tokio::test]
async fn autoplay_over_loopback_tcp() {
    let listener = tcp::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepting = tokio::spawn(async move { tcp::accept(&listener, IO_TIMEOUT).await });
    let guest_link = tcp::connect(addr, IO_TIMEOUT).await.unwrap();
    let (host_link, _) = accepting.await.unwrap().unwrap();

    let mut rng = SmallRng::seed_from_u64(42);
    let mut host = session(Grid::with_random_fleet(&mut rng), true, host_link);
    let mut guest = session(Grid::with_random_fleet(&mut rng), false, guest_link);
    let mut rng_b = SmallRng::seed_from_u64(43);

    let (ra, rb) = timeout(
        Duration::from_secs(30),
        async { tokio::try_join!(host.autoplay(&mut rng), guest.autoplay(&mut rng_b)) },
    )
    .await
    .expect("match did not finish")
    .unwrap();
    assert_eq!(ra.local_won.map(|w| !w), rb.local_won);
    assert!(ra.local_won.is_some());
}
