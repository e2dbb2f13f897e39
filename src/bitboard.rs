//! Fixed-size cell sets packed into an unsigned integer.
//!
//! A `BitBoard<T, N>` records a subset of the cells of an `N×N` grid. The grid
//! model uses one for ship occupancy (to answer buffer-zone queries in a single
//! AND) and the targeting memory uses one for the set of tried coordinates.

use core::ops::{BitOrAssign, Not};
use core::{fmt, mem};
use num_traits::{PrimInt, Unsigned, Zero};

use crate::common::Coord;
use crate::config::GRID_SIZE;

/// Cell set sized for the game grid.
pub type CellSet = BitBoard<u128, GRID_SIZE>;

/// Errors returned by bitboard operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitBoardError {
    /// Requested board size N*N exceeds capacity of `T::BITS`.
    SizeTooLarge { n: usize, capacity: usize },
    /// Row or column index is out of bounds [0..N).
    IndexOutOfBounds { row: usize, col: usize },
}

impl fmt::Display for BitBoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitBoardError::SizeTooLarge { n, capacity } => {
                write!(f, "board of {} cells exceeds {} bits", n * n, capacity)
            }
            BitBoardError::IndexOutOfBounds { row, col } => {
                write!(f, "cell ({}, {}) is outside the board", row, col)
            }
        }
    }
}

/// A subset of the cells of an N×N grid stored in the unsigned integer `T`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BitBoard<T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

impl<T, const N: usize> BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    const BOARD_BITS: usize = N * N;

    #[inline]
    fn mask() -> T {
        if Self::BOARD_BITS == mem::size_of::<T>() * 8 {
            !T::zero()
        } else {
            (T::one() << Self::BOARD_BITS) - T::one()
        }
    }

    /// Empty set.
    #[inline]
    pub fn new() -> Self {
        BitBoard { bits: T::zero() }
    }

    /// Fallible constructor: returns `Err(SizeTooLarge)` if N*N > T::BITS.
    pub fn try_new() -> Result<Self, BitBoardError> {
        let capacity = mem::size_of::<T>() * 8;
        if Self::BOARD_BITS > capacity {
            Err(BitBoardError::SizeTooLarge { n: N, capacity })
        } else {
            Ok(Self::new())
        }
    }

    /// Set containing every cell of the board.
    pub fn full() -> Self {
        BitBoard { bits: Self::mask() }
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_zero()
    }

    /// Gets the bit at (row, col).
    pub fn get(&self, row: usize, col: usize) -> Result<bool, BitBoardError> {
        Self::check_bounds(row, col)?;
        Ok(((self.bits >> (row * N + col)) & T::one()) != T::zero())
    }

    /// Sets the bit at (row, col).
    pub fn set(&mut self, row: usize, col: usize) -> Result<(), BitBoardError> {
        Self::check_bounds(row, col)?;
        self.bits = self.bits | (T::one() << (row * N + col));
        Ok(())
    }

    /// Membership test that treats off-board coordinates as absent.
    #[inline]
    pub fn contains(&self, coord: Coord) -> bool {
        self.get(coord.row, coord.col).unwrap_or(false)
    }

    /// Adds `coord`; off-board coordinates are ignored.
    #[inline]
    pub fn insert(&mut self, coord: Coord) {
        let _ = self.set(coord.row, coord.col);
    }

    pub fn clear_all(&mut self) {
        self.bits = T::zero();
    }

    /// The set grown by one cell in all eight directions, clipped to the board.
    /// Every cell of `self` is part of its own halo.
    pub fn halo(&self) -> Self {
        let mut out = *self;
        for (row, col) in self.iter_set_bits() {
            for r in row.saturating_sub(1)..=(row + 1).min(N - 1) {
                for c in col.saturating_sub(1)..=(col + 1).min(N - 1) {
                    out.bits = out.bits | (T::one() << (r * N + c));
                }
            }
        }
        out
    }

    /// True when the two sets share at least one cell.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.bits & other.bits).is_zero()
    }

    #[inline]
    fn check_bounds(row: usize, col: usize) -> Result<(), BitBoardError> {
        if row >= N || col >= N {
            Err(BitBoardError::IndexOutOfBounds { row, col })
        } else {
            Ok(())
        }
    }

    #[inline]
    fn from_raw(raw: T) -> Self {
        BitBoard {
            bits: raw & Self::mask(),
        }
    }

    /// Builds a set from `(row, col)` positions, failing on the first one off the board.
    pub fn from_cells<I>(iter: I) -> Result<Self, BitBoardError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut board = Self::new();
        for (r, c) in iter {
            board.set(r, c)?;
        }
        Ok(board)
    }

    /// Iterator over `(row, col)` of every member, row-major.
    pub fn iter_set_bits(&self) -> SetBits<'_, T, N> {
        SetBits {
            board: self,
            idx: 0,
        }
    }
}

impl<T, const N: usize> Default for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitBoard<{}>:", N)?;
        for r in 0..N {
            for c in 0..N {
                let bit = if self.get(r, c).unwrap_or(false) { '■' } else { '□' };
                write!(f, "{} ", bit)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over the set bits of a bitboard.
#[derive(Clone, Copy)]
pub struct SetBits<'a, T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    board: &'a BitBoard<T, N>,
    idx: usize,
}

impl<'a, T, const N: usize> Iterator for SetBits<'a, T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < N * N {
            let idx = self.idx;
            self.idx += 1;
            if ((self.board.bits >> idx) & T::one()) != T::zero() {
                return Some((idx / N, idx % N));
            }
        }
        None
    }
}

impl<T, const N: usize> BitOrAssign for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits = self.bits | rhs.bits;
    }
}

/// Complement within the board bounds.
impl<T, const N: usize> Not for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn not(self) -> Self {
        Self::from_raw(!self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halo_of_corner_cell_is_clipped() {
        let set = CellSet::from_cells([(0, 0)]).unwrap();
        let halo = set.halo();
        assert_eq!(halo.count_ones(), 4);
        assert!(halo.contains(Coord::new(1, 1)));
        assert!(!halo.contains(Coord::new(2, 0)));
    }

    #[test]
    fn halo_of_horizontal_run() {
        let set = CellSet::from_cells([(3, 3), (3, 4)]).unwrap();
        // 3 rows by 4 columns
        assert_eq!(set.halo().count_ones(), 12);
    }

    #[test]
    fn complement_stays_on_board() {
        let empty = CellSet::new();
        assert_eq!((!empty).count_ones(), GRID_SIZE * GRID_SIZE);
        assert_eq!(CellSet::full(), !empty);
    }

    #[test]
    fn try_new_rejects_oversized_boards() {
        assert!(BitBoard::<u64, 8>::try_new().is_ok());
        assert!(matches!(
            BitBoard::<u8, 3>::try_new(),
            Err(BitBoardError::SizeTooLarge { .. })
        ));
    }

    #[test]
    fn out_of_bounds_access_is_an_error() {
        let mut set = CellSet::new();
        assert_eq!(
            set.set(GRID_SIZE, 0),
            Err(BitBoardError::IndexOutOfBounds { row: GRID_SIZE, col: 0 })
        );
        assert!(!set.contains(Coord::new(0, GRID_SIZE)));
    }
}
