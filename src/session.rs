//! Async driver for one online match.
//!
//! `PeerSession` feeds the protocol state machine from two sources, the local
//! player's actions and the reader task's channel, and performs the I/O each
//! `Reaction` asks for. All engine access goes through `&mut self`, so the
//! engine is only ever touched by the session's owner.

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ai::Targeting;
use crate::common::ShotOutcome;
use crate::config::GRID_SIZE;
use crate::game::MatchEngine;
use crate::protocol::peer::{MatchEvent, PeerProtocol, Reaction};
use crate::transport::{Inbound, Link, Transport};
use crate::turns::Seat;

/// How an automatically played match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplaySummary {
    /// `None` if the match ended without a verdict.
    pub local_won: Option<bool>,
    pub shots_fired: usize,
}

pub struct PeerSession {
    protocol: PeerProtocol,
    transport: Box<dyn Transport>,
    inbound: mpsc::Receiver<Inbound>,
    reader: JoinHandle<()>,
    closed: bool,
}

impl PeerSession {
    pub fn new(engine: MatchEngine, link: Link) -> anyhow::Result<Self> {
        let protocol = PeerProtocol::new(engine)?;
        Ok(Self {
            protocol,
            transport: link.transport,
            inbound: link.inbound,
            reader: link.reader,
            closed: false,
        })
    }

    pub fn protocol(&self) -> &PeerProtocol {
        &self.protocol
    }

    pub fn engine(&self) -> &MatchEngine {
        self.protocol.engine()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Send READY.
    pub async fn start(&mut self) -> Vec<MatchEvent> {
        let reaction = self.protocol.start();
        self.apply(reaction).await
    }

    /// Fire at the peer. Returns no events when the shot is not allowed now;
    /// the result arrives later through `next_events`.
    pub async fn fire(&mut self, row: usize, col: usize) -> anyhow::Result<Vec<MatchEvent>> {
        let reaction = self.protocol.fire(row, col)?;
        Ok(self.apply(reaction).await)
    }

    /// Wait for the next item from the peer and process it. `None` once the
    /// session is closed.
    pub async fn next_events(&mut self) -> Option<Vec<MatchEvent>> {
        let inbound = self.recv().await?;
        Some(self.handle(inbound).await)
    }

    /// Wait for the next item from the reader task without processing it.
    /// Cancel-safe, so it can race user input in `select!`. `None` once the
    /// session is closed.
    pub async fn recv(&mut self) -> Option<Inbound> {
        if self.closed {
            return None;
        }
        Some(self.inbound.recv().await.unwrap_or(Inbound::Closed))
    }

    /// Process one item obtained from `recv`.
    pub async fn handle(&mut self, inbound: Inbound) -> Vec<MatchEvent> {
        let reaction = match inbound {
            Inbound::Line(line) => self.protocol.handle_line(&line),
            Inbound::Closed => self.protocol.handle_transport_failure("connection closed by peer"),
            Inbound::Failed(e) => self.protocol.handle_transport_failure(&e),
        };
        self.apply(reaction).await
    }

    /// Tell the peer we are leaving and close the connection.
    pub async fn leave(&mut self) -> Vec<MatchEvent> {
        if self.closed {
            return Vec::new();
        }
        let reaction = self.protocol.leave();
        self.apply(reaction).await
    }

    /// Stop the reader and close the stream. Safe to call more than once.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.reader.abort();
        if let Err(e) = self.transport.close().await {
            log::debug!("closing peer stream: {}", e);
        }
    }

    /// Play the whole match with the computer's targeting, until the session
    /// closes.
    pub async fn autoplay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<AutoplaySummary> {
        let mut targeting = Targeting::new();
        let mut summary = AutoplaySummary {
            local_won: None,
            shots_fired: 0,
        };
        let mut events = self.start().await;
        loop {
            for event in events.drain(..) {
                match event {
                    MatchEvent::LocalShotResult(report) => {
                        let cells = report
                            .ship
                            .and_then(|s| self.engine().grid(Seat::Second).ship(s))
                            .map(|s| s.cells().to_vec())
                            .unwrap_or_default();
                        targeting.handle_shot_result(report.coord, report.outcome, &cells);
                    }
                    MatchEvent::GameOver { local_won } => summary.local_won = Some(local_won),
                    _ => {}
                }
            }
            if self.closed {
                break;
            }
            let ready = self.protocol.is_active()
                && self.engine().is_my_turn()
                && self.protocol.pending_shot().is_none();
            if !ready {
                match self.next_events().await {
                    Some(next) => events = next,
                    None => break,
                }
                continue;
            }
            let mut target = None;
            for _ in 0..GRID_SIZE * GRID_SIZE {
                let c = targeting.choose_target(rng);
                if self.engine().can_fire_remote(c.row, c.col)? {
                    target = Some(c);
                    break;
                }
                targeting.handle_shot_result(c, ShotOutcome::AlreadyShot, &[]);
            }
            let Some(c) = target else {
                anyhow::bail!("no untried cell left to fire at");
            };
            events = self.fire(c.row, c.col).await?;
            summary.shots_fired += 1;
        }
        Ok(summary)
    }

    async fn apply(&mut self, reaction: Reaction) -> Vec<MatchEvent> {
        let Reaction {
            outbound,
            mut events,
            close,
        } = reaction;
        let mut close = close;
        for msg in &outbound {
            if let Err(e) = self.transport.send(msg).await {
                let failure = self.protocol.handle_transport_failure(&e.to_string());
                events.extend(failure.events);
                close = true;
                break;
            }
        }
        if close {
            self.shutdown().await;
        }
        events
    }
}

impl Drop for PeerSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
