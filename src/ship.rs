//! Ships and the handles that refer to them.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::common::Coord;

/// Orientation of a ship on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn from_horizontal(horizontal: bool) -> Self {
        if horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    /// Cells of a run of `length` starting at (`row`, `col`). May leave the grid.
    pub fn run(self, length: usize, row: usize, col: usize) -> impl Iterator<Item = Coord> {
        (0..length).map(move |i| match self {
            Orientation::Horizontal => Coord::new(row, col + i),
            Orientation::Vertical => Coord::new(row + i, col),
        })
    }
}

static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one grid instance. A reset or restored grid gets a fresh id, so
/// handles issued before are no longer accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridId(u64);

impl GridId {
    pub(crate) fn fresh() -> Self {
        GridId(NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a ship: the grid that placed it plus its index in that grid's fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShipRef {
    pub(crate) grid: GridId,
    pub(crate) index: usize,
}

impl ShipRef {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn grid(&self) -> GridId {
        self.grid
    }
}

/// A placed ship. Its cells are fixed at placement; only the hit counter moves.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    cells: Vec<Coord>,
    hits: usize,
}

impl Ship {
    pub(crate) fn new(cells: Vec<Coord>) -> Self {
        Self { cells, hits: 0 }
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn is_sunk(&self) -> bool {
        self.hits == self.cells.len()
    }

    pub(crate) fn register_hit(&mut self) {
        if self.hits < self.cells.len() {
            self.hits += 1;
        }
    }

    /// Used for ships revealed by a remote SUNK report.
    pub(crate) fn force_sunk(&mut self) {
        self.hits = self.cells.len();
    }
}
