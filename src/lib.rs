#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod ai;
mod bitboard;
mod common;
mod config;
mod game;
mod grid;
mod ship;
mod turns;
pub mod protocol;
#[cfg(feature = "std")]
pub mod cli;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod persist;
#[cfg(feature = "std")]
pub mod schedule;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod transport;

pub use ai::*;
pub use bitboard::{BitBoard, BitBoardError, CellSet};
pub use common::*;
pub use config::*;
pub use game::*;
pub use grid::*;
pub use protocol::peer::{MatchEvent, PeerProtocol, Reaction};
pub use protocol::Message;
pub use ship::*;
pub use turns::*;
#[cfg(feature = "std")]
pub use logging::{init_logging, LOG_ENV};
#[cfg(feature = "std")]
pub use persist::{SaveStore, SharedStats, Stats, StatsStore, Tally};
#[cfg(feature = "std")]
pub use schedule::TurnDelay;
#[cfg(feature = "std")]
pub use session::PeerSession;
#[cfg(feature = "std")]
pub use transport::{Inbound, LineTransport, Link, Transport};
