//! Sans-IO state machine for one side of an online match.
//!
//! `PeerProtocol` owns the local `MatchEngine` and turns user actions and
//! decoded peer messages into a `Reaction`: the messages to send, the events
//! to show, and whether the connection should be closed. It never touches a
//! socket, so the async session and the tests drive it the same way.

use alloc::string::String;
use alloc::vec::Vec;

use crate::common::{Coord, ShotOutcome, ShotReport};
use crate::game::{GameMode, MatchEngine, MatchError};
use crate::protocol::Message;
use crate::turns::Seat;

/// Notices for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// The peer announced READY.
    OpponentReady,
    /// Who may fire next. Emitted when the match becomes active and on every
    /// change afterwards.
    TurnChanged { my_turn: bool },
    /// The peer reported the result of our shot.
    LocalShotResult(ShotReport),
    /// The peer fired at our grid.
    IncomingShot(ShotReport),
    GameOver { local_won: bool },
    /// The connection failed; the match ended in our favour if it was running.
    NetworkError(String),
}

/// What the caller must do after feeding the protocol an input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub outbound: Vec<Message>,
    pub events: Vec<MatchEvent>,
    pub close: bool,
}

impl Reaction {
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.events.is_empty() && !self.close
    }
}

#[derive(Debug)]
pub struct PeerProtocol {
    engine: MatchEngine,
    sent_ready: bool,
    peer_ready: bool,
    pending_shot: Option<Coord>,
}

impl PeerProtocol {
    /// Wrap an online engine.
    pub fn new(engine: MatchEngine) -> Result<Self, MatchError> {
        if engine.mode() != GameMode::Online {
            return Err(MatchError::WrongMode {
                expected: GameMode::Online,
                actual: engine.mode(),
            });
        }
        Ok(Self {
            engine,
            sent_ready: false,
            peer_ready: false,
            pending_shot: None,
        })
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MatchEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> MatchEngine {
        self.engine
    }

    /// Both sides have exchanged READY.
    pub fn is_started(&self) -> bool {
        self.sent_ready && self.peer_ready
    }

    /// Started and not yet over.
    pub fn is_active(&self) -> bool {
        self.is_started() && !self.engine.is_game_over()
    }

    pub fn pending_shot(&self) -> Option<Coord> {
        self.pending_shot
    }

    /// Announce READY. Only the first call sends anything.
    pub fn start(&mut self) -> Reaction {
        let mut reaction = Reaction::default();
        if self.sent_ready {
            return reaction;
        }
        self.sent_ready = true;
        reaction.outbound.push(Message::Ready);
        if self.peer_ready {
            self.announce_start(&mut reaction);
        }
        reaction
    }

    /// Fire at the peer. A shot that is not allowed right now (match not
    /// active, peer's turn, a shot already in flight, cell already known)
    /// yields an empty reaction.
    pub fn fire(&mut self, row: usize, col: usize) -> Result<Reaction, MatchError> {
        let allowed = self.engine.can_fire_remote(row, col)?;
        if !allowed || !self.is_active() || self.pending_shot.is_some() {
            return Ok(Reaction::default());
        }
        let coord = Coord::new(row, col);
        self.pending_shot = Some(coord);
        Ok(Reaction {
            outbound: alloc::vec![Message::Shot(coord)],
            ..Reaction::default()
        })
    }

    /// Feed one raw line from the peer. Malformed lines are dropped.
    pub fn handle_line(&mut self, line: &str) -> Reaction {
        match Message::parse(line) {
            Some(msg) => self.handle_message(msg),
            None => {
                log::debug!("dropping malformed line {:?}", line);
                Reaction::default()
            }
        }
    }

    pub fn handle_message(&mut self, msg: Message) -> Reaction {
        log::debug!("received {}", msg);
        match msg {
            Message::Ready => self.on_ready(),
            Message::Shot(coord) => self.on_shot(coord),
            Message::Result { outcome, cells } => self.on_result(outcome, &cells),
            Message::GameOver { receiver_wins } => self.on_game_over(receiver_wins),
            Message::Disconnect => self.on_disconnect(),
        }
    }

    /// The stream failed or reached EOF.
    pub fn handle_transport_failure(&mut self, reason: &str) -> Reaction {
        let mut reaction = Reaction {
            close: true,
            ..Reaction::default()
        };
        if self.engine.is_game_over() {
            log::debug!("connection ended after the match: {}", reason);
            return reaction;
        }
        log::warn!("connection to peer lost: {}", reason);
        reaction.events.push(MatchEvent::NetworkError(String::from(reason)));
        if self.is_started() {
            self.conclude(true, &mut reaction);
        }
        reaction
    }

    /// Leave the match. The leaver loses a match in progress.
    pub fn leave(&mut self) -> Reaction {
        let mut reaction = Reaction {
            outbound: alloc::vec![Message::Disconnect],
            close: true,
            ..Reaction::default()
        };
        if self.is_active() {
            self.conclude(false, &mut reaction);
        }
        reaction
    }

    fn on_ready(&mut self) -> Reaction {
        let mut reaction = Reaction::default();
        if self.peer_ready {
            log::warn!("peer sent READY twice");
            return reaction;
        }
        self.peer_ready = true;
        reaction.events.push(MatchEvent::OpponentReady);
        if self.sent_ready {
            self.announce_start(&mut reaction);
        }
        reaction
    }

    fn on_shot(&mut self, coord: Coord) -> Reaction {
        let mut reaction = Reaction::default();
        if !self.is_active() || self.engine.active_side() != Seat::Second {
            log::warn!("ignoring out-of-turn SHOT at {}", coord);
            return reaction;
        }
        let report = match self.engine.apply_incoming_shot(coord.row, coord.col) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("ignoring SHOT at {}: {}", coord, e);
                return reaction;
            }
        };
        let cells = report
            .ship
            .and_then(|ship| self.engine.grid(Seat::First).ship(ship))
            .filter(|ship| ship.is_sunk())
            .map(|ship| ship.cells().to_vec())
            .unwrap_or_default();
        reaction.outbound.push(Message::Result {
            outcome: report.outcome,
            cells,
        });
        reaction.events.push(MatchEvent::IncomingShot(report));
        if self.engine.is_game_over() {
            reaction.outbound.push(Message::GameOver { receiver_wins: true });
            reaction.events.push(MatchEvent::GameOver { local_won: false });
            reaction.close = true;
        } else if self.engine.active_side() == Seat::First {
            reaction.events.push(MatchEvent::TurnChanged { my_turn: true });
        }
        reaction
    }

    fn on_result(&mut self, outcome: ShotOutcome, cells: &[Coord]) -> Reaction {
        let mut reaction = Reaction::default();
        let Some(coord) = self.pending_shot.take() else {
            log::warn!("ignoring RESULT with no shot in flight");
            return reaction;
        };
        let report = match self
            .engine
            .apply_remote_result(coord.row, coord.col, outcome, cells)
        {
            Ok(report) => report,
            Err(e) => {
                log::warn!("ignoring RESULT for {}: {}", coord, e);
                return reaction;
            }
        };
        reaction.events.push(MatchEvent::LocalShotResult(report));
        if self.engine.is_game_over() {
            reaction.events.push(MatchEvent::GameOver { local_won: true });
            reaction.close = true;
        } else if self.engine.active_side() == Seat::Second {
            reaction.events.push(MatchEvent::TurnChanged { my_turn: false });
        }
        reaction
    }

    fn on_game_over(&mut self, receiver_wins: bool) -> Reaction {
        let mut reaction = Reaction {
            close: true,
            ..Reaction::default()
        };
        if self.engine.is_game_over() {
            return reaction;
        }
        if !self.is_started() {
            log::warn!("GAME_OVER before the match started");
        }
        self.conclude(receiver_wins, &mut reaction);
        reaction
    }

    fn on_disconnect(&mut self) -> Reaction {
        let mut reaction = Reaction {
            close: true,
            ..Reaction::default()
        };
        log::info!("peer disconnected");
        if self.is_active() {
            self.conclude(true, &mut reaction);
        }
        reaction
    }

    fn announce_start(&mut self, reaction: &mut Reaction) {
        log::info!("online match active, {} fires first", match self.engine.active_side() {
            Seat::First => "this side",
            Seat::Second => "the peer",
        });
        reaction.events.push(MatchEvent::TurnChanged {
            my_turn: self.engine.is_my_turn(),
        });
    }

    fn conclude(&mut self, local_won: bool, reaction: &mut Reaction) {
        self.pending_shot = None;
        if self.engine.conclude_remote(local_won).is_ok() {
            reaction.events.push(MatchEvent::GameOver { local_won });
        }
    }
}
