//! Line protocol spoken between two peers.
//!
//! One message per line, tokens separated by whitespace:
//!
//! ```text
//! READY
//! SHOT <row> <col>
//! RESULT <MISS|HIT|SUNK> [<row,col;row,col;...>]
//! GAME_OVER <WIN|LOSE>
//! DISCONNECT
//! ```
//!
//! The GAME_OVER token is the verdict for the receiver: a side whose fleet has
//! just gone down sends `GAME_OVER WIN`.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::common::{Coord, ShotOutcome};

pub mod peer;

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Ready,
    Shot(Coord),
    /// Reply to a SHOT. Cells are only listed for `Sunk`.
    Result {
        outcome: ShotOutcome,
        cells: Vec<Coord>,
    },
    GameOver {
        receiver_wins: bool,
    },
    Disconnect,
}

impl Message {
    /// Wire form without the line terminator.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode one line. `None` for anything malformed, including coordinates
    /// outside the grid.
    pub fn parse(line: &str) -> Option<Message> {
        let mut tokens = line.split_whitespace();
        let msg = match tokens.next()? {
            "READY" => Message::Ready,
            "SHOT" => {
                let row = tokens.next()?.parse().ok()?;
                let col = tokens.next()?.parse().ok()?;
                Message::Shot(Coord::checked(row, col).ok()?)
            }
            "RESULT" => {
                let outcome = match tokens.next()? {
                    "MISS" => ShotOutcome::Miss,
                    "HIT" => ShotOutcome::Hit,
                    "SUNK" => ShotOutcome::Sunk,
                    _ => return None,
                };
                let cells = match (outcome, tokens.next()) {
                    (ShotOutcome::Sunk, Some(list)) => parse_cells(list)?,
                    (_, None) => Vec::new(),
                    (_, Some(_)) => return None,
                };
                Message::Result { outcome, cells }
            }
            "GAME_OVER" => match tokens.next()? {
                "WIN" => Message::GameOver { receiver_wins: true },
                "LOSE" => Message::GameOver { receiver_wins: false },
                _ => return None,
            },
            "DISCONNECT" => Message::Disconnect,
            _ => return None,
        };
        if tokens.next().is_some() {
            return None;
        }
        Some(msg)
    }
}

fn parse_cells(list: &str) -> Option<Vec<Coord>> {
    list.split(';')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (r, c) = pair.split_once(',')?;
            Coord::checked(r.trim().parse().ok()?, c.trim().parse().ok()?).ok()
        })
        .collect()
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Ready => f.write_str("READY"),
            Message::Shot(c) => write!(f, "SHOT {} {}", c.row, c.col),
            Message::Result { outcome, cells } => {
                let token = match outcome {
                    ShotOutcome::Hit => "HIT",
                    ShotOutcome::Sunk => "SUNK",
                    ShotOutcome::Miss | ShotOutcome::AlreadyShot => "MISS",
                };
                write!(f, "RESULT {}", token)?;
                if *outcome == ShotOutcome::Sunk && !cells.is_empty() {
                    f.write_str(" ")?;
                    for (i, c) in cells.iter().enumerate() {
                        if i > 0 {
                            f.write_str(";")?;
                        }
                        write!(f, "{},{}", c.row, c.col)?;
                    }
                }
                Ok(())
            }
            Message::GameOver { receiver_wins } => {
                write!(f, "GAME_OVER {}", if *receiver_wins { "WIN" } else { "LOSE" })
            }
            Message::Disconnect => f.write_str("DISCONNECT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn sunk_result_lists_cells() {
        let msg = Message::Result {
            outcome: ShotOutcome::Sunk,
            cells: vec![Coord::new(3, 3), Coord::new(3, 4)],
        };
        assert_eq!(msg.encode(), "RESULT SUNK 3,3;3,4");
        assert_eq!(Message::parse("RESULT SUNK 3,3;3,4"), Some(msg));
    }

    #[test]
    fn trailing_garbage_is_malformed() {
        assert_eq!(Message::parse("READY now"), None);
        assert_eq!(Message::parse("RESULT MISS 1,1"), None);
        assert_eq!(Message::parse("SHOT 1"), None);
    }
}
