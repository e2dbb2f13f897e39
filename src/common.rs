//! Common types: coordinates, shot outcomes and grid errors.

use core::fmt;

use crate::config::GRID_SIZE;
use crate::ship::ShipRef;

/// A cell position, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Checked constructor for externally supplied coordinates.
    pub fn checked(row: usize, col: usize) -> Result<Self, GridError> {
        if row < GRID_SIZE && col < GRID_SIZE {
            Ok(Self { row, col })
        } else {
            Err(GridError::OutOfBounds { row, col })
        }
    }

    pub fn in_bounds(&self) -> bool {
        self.row < GRID_SIZE && self.col < GRID_SIZE
    }

    /// The in-bounds orthogonal neighbours (down, up, right, left).
    pub fn orthogonal(self) -> impl Iterator<Item = Coord> {
        const DIRS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        DIRS.into_iter().filter_map(move |(dr, dc)| self.offset(dr, dc))
    }

    /// Shifted coordinate, or `None` when it would leave the grid.
    pub fn offset(self, dr: isize, dc: isize) -> Option<Coord> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        let c = Coord { row, col };
        c.in_bounds().then_some(c)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Coord { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Result of firing at a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ShotOutcome {
    Miss,
    Hit,
    Sunk,
    /// The cell had already been resolved; nothing changed.
    AlreadyShot,
}

impl ShotOutcome {
    /// HIT and SUNK let the shooter fire again.
    pub fn keeps_turn(self) -> bool {
        matches!(self, ShotOutcome::Hit | ShotOutcome::Sunk)
    }
}

/// Outcome of a shot plus the ship it struck, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotReport {
    pub coord: Coord,
    pub outcome: ShotOutcome,
    pub ship: Option<ShipRef>,
}

impl ShotReport {
    pub(crate) fn miss(coord: Coord) -> Self {
        Self {
            coord,
            outcome: ShotOutcome::Miss,
            ship: None,
        }
    }

    pub(crate) fn already(coord: Coord) -> Self {
        Self {
            coord,
            outcome: ShotOutcome::AlreadyShot,
            ship: None,
        }
    }
}

/// Errors returned by grid operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Coordinate outside the 10×10 grid.
    OutOfBounds { row: usize, col: usize },
    /// Restored grid contents contradict themselves.
    CorruptState(&'static str),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfBounds { row, col } => write!(
                f,
                "coordinate ({}, {}) is outside the {}x{} grid",
                row, col, GRID_SIZE, GRID_SIZE
            ),
            GridError::CorruptState(why) => write!(f, "corrupt grid state: {}", why),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GridError {}
