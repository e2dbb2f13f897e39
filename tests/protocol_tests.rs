use sea_battle::{Coord, Message, ShotOutcome};

#[test]
fn messages_encode_to_the_wire_grammar() {
    assert_eq!(Message::Ready.encode(), "READY");
    assert_eq!(Message::Shot(Coord::new(2, 7)).encode(), "SHOT 2 7");
    assert_eq!(
        Message::Result { outcome: ShotOutcome::Miss, cells: vec![] }.encode(),
        "RESULT MISS"
    );
    assert_eq!(
        Message::Result { outcome: ShotOutcome::Hit, cells: vec![] }.encode(),
        "RESULT HIT"
    );
    assert_eq!(
        Message::Result {
            outcome: ShotOutcome::Sunk,
            cells: vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)],
        }
        .encode(),
        "RESULT SUNK 0,0;1,0;2,0"
    );
    assert_eq!(Message::GameOver { receiver_wins: true }.encode(), "GAME_OVER WIN");
    assert_eq!(Message::GameOver { receiver_wins: false }.encode(), "GAME_OVER LOSE");
    assert_eq!(Message::Disconnect.encode(), "DISCONNECT");
}

#[test]
fn well_formed_lines_parse() {
    assert_eq!(Message::parse("READY"), Some(Message::Ready));
    assert_eq!(Message::parse("  SHOT   9 0 "), Some(Message::Shot(Coord::new(9, 0))));
    assert_eq!(
        Message::parse("RESULT HIT"),
        Some(Message::Result { outcome: ShotOutcome::Hit, cells: vec![] })
    );
    assert_eq!(
        Message::parse("RESULT SUNK 4,4"),
        Some(Message::Result {
            outcome: ShotOutcome::Sunk,
            cells: vec![Coord::new(4, 4)],
        })
    );
    assert_eq!(
        Message::parse("RESULT SUNK"),
        Some(Message::Result { outcome: ShotOutcome::Sunk, cells: vec![] })
    );
    assert_eq!(
        Message::parse("GAME_OVER LOSE"),
        Some(Message::GameOver { receiver_wins: false })
    );
    assert_eq!(Message::parse("DISCONNECT\r"), Some(Message::Disconnect));
}

#[test]
fn malformed_lines_are_rejected() {
    for line in [
        "",
        "   ",
        "ready",
        "HELLO",
        "SHOT",
        "SHOT 1",
        "SHOT a b",
        "SHOT -1 2",
        "SHOT 10 0",
        "SHOT 1 2 3",
        "RESULT",
        "RESULT ALREADY",
        "RESULT SUNK 1;2",
        "RESULT SUNK 1,2;11,0",
        "RESULT HIT 1,2",
        "GAME_OVER",
        "GAME_OVER DRAW",
        "DISCONNECT now",
    ] {
        assert_eq!(Message::parse(line), None, "{:?} should be rejected", line);
    }
}

#[test]
fn parse_reads_what_encode_writes() {
    let samples = [
        Message::Ready,
        Message::Shot(Coord::new(0, 9)),
        Message::Result {
            outcome: ShotOutcome::Sunk,
            cells: vec![Coord::new(6, 6), Coord::new(6, 7)],
        },
        Message::GameOver { receiver_wins: true },
        Message::Disconnect,
    ];
    for msg in samples {
        assert_eq!(Message::parse(&msg.encode()), Some(msg));
    }
}
