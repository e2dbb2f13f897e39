//! Hunt/target search used by the computer opponent.
//!
//! The searcher keeps memory across the whole match: every coordinate it has
//! tried, a queue of follow-up candidates around unresolved hits, and the hits
//! on the ship currently being finished off. Once two hits line up, follow-ups
//! are restricted to that axis and the two ends of the hit run are tried first.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use rand::Rng;

use crate::bitboard::CellSet;
use crate::common::{Coord, ShotOutcome};
use crate::config::GRID_SIZE;
use crate::ship::Orientation;

/// Search memory of the computer opponent. Serializable so saved games resume
/// mid-hunt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Targeting {
    tried: CellSet,
    queue: VecDeque<Coord>,
    hits: Vec<Coord>,
}

impl Targeting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, as at the start of a match.
    pub fn reset(&mut self) {
        self.tried.clear_all();
        self.queue.clear();
        self.hits.clear();
    }

    pub fn tried(&self) -> &CellSet {
        &self.tried
    }

    /// Hits on the ship currently being hunted, in the order they landed.
    pub fn unresolved_hits(&self) -> &[Coord] {
        &self.hits
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Coord> {
        self.queue.iter()
    }

    /// True while at least one hit has not been resolved into a sinking.
    pub fn is_targeting(&self) -> bool {
        !self.hits.is_empty()
    }

    /// Axis revealed by the first two unresolved hits.
    pub fn orientation(&self) -> Option<Orientation> {
        let (a, b) = match self.hits.as_slice() {
            [a, b, ..] => (a, b),
            _ => return None,
        };
        if a.row == b.row {
            Some(Orientation::Horizontal)
        } else if a.col == b.col {
            Some(Orientation::Vertical)
        } else {
            None
        }
    }

    /// Next coordinate to fire at. Never returns a coordinate already tried
    /// unless the whole grid has been.
    pub fn choose_target<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Coord {
        self.prune_queue();

        if let Some(c) = self.select_along_line(rng) {
            return c;
        }

        if !self.queue.is_empty() {
            let idx = rng.random_range(0..self.queue.len());
            if let Some(c) = self.queue.remove(idx) {
                return c;
            }
        }

        self.hunt(rng)
    }

    /// Feed back the outcome of a shot at `coord`. For `Sunk`, `sunk_cells` are
    /// the cells of the ship that went down; its whole perimeter becomes tried.
    pub fn handle_shot_result(&mut self, coord: Coord, outcome: ShotOutcome, sunk_cells: &[Coord]) {
        self.tried.insert(coord);
        match outcome {
            ShotOutcome::Hit => self.register_hit(coord),
            ShotOutcome::Sunk => {
                let mut body = CellSet::new();
                body.insert(coord);
                for &c in sunk_cells.iter().chain(self.hits.iter()) {
                    body.insert(c);
                }
                self.tried |= body.halo();
                self.hits.clear();
                self.queue.clear();
            }
            ShotOutcome::Miss | ShotOutcome::AlreadyShot => {}
        }
        self.prune_queue();
    }

    fn hunt<R: Rng + ?Sized>(&self, rng: &mut R) -> Coord {
        let remaining: Vec<(usize, usize)> = (!self.tried).iter_set_bits().collect();
        if remaining.is_empty() {
            return Coord::new(0, 0);
        }
        Coord::from(remaining[rng.random_range(0..remaining.len())])
    }

    fn select_along_line<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Coord> {
        let orientation = self.orientation()?;
        let (lo, hi) = match orientation {
            Orientation::Horizontal => {
                let row = self.hits[0].row;
                let min = self.hits.iter().map(|h| h.col).min()?;
                let max = self.hits.iter().map(|h| h.col).max()?;
                (
                    Coord::new(row, min).offset(0, -1),
                    Coord::new(row, max).offset(0, 1),
                )
            }
            Orientation::Vertical => {
                let col = self.hits[0].col;
                let min = self.hits.iter().map(|h| h.row).min()?;
                let max = self.hits.iter().map(|h| h.row).max()?;
                (
                    Coord::new(min, col).offset(-1, 0),
                    Coord::new(max, col).offset(1, 0),
                )
            }
        };
        let ends = if rng.random_bool(0.5) { [lo, hi] } else { [hi, lo] };
        ends.into_iter().flatten().find(|c| self.is_available(*c))
    }

    fn register_hit(&mut self, coord: Coord) {
        if !self.hits.contains(&coord) {
            self.hits.push(coord);
        }
        for n in coord.orthogonal() {
            if self.is_available(n) && !self.queue.contains(&n) {
                self.queue.push_back(n);
            }
        }
        self.enforce_orientation();
    }

    fn enforce_orientation(&mut self) {
        let Some(orientation) = self.orientation() else {
            return;
        };
        let anchor = self.hits[0];
        self.queue.retain(|c| match orientation {
            Orientation::Horizontal => c.row == anchor.row,
            Orientation::Vertical => c.col == anchor.col,
        });
    }

    fn prune_queue(&mut self) {
        let tried = self.tried;
        self.queue.retain(|c| c.in_bounds() && !tried.contains(*c));
    }

    fn is_available(&self, c: Coord) -> bool {
        c.row < GRID_SIZE && c.col < GRID_SIZE && !self.tried.contains(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn first_hit_queues_orthogonal_neighbours() {
        let mut ai = Targeting::new();
        ai.handle_shot_result(Coord::new(0, 0), ShotOutcome::Hit, &[]);
        let mut queued: Vec<Coord> = ai.candidates().copied().collect();
        queued.sort();
        assert_eq!(queued, [Coord::new(0, 1), Coord::new(1, 0)]);
    }

    #[test]
    fn vertical_lock_prunes_horizontal_candidates() {
        let mut ai = Targeting::new();
        ai.handle_shot_result(Coord::new(4, 4), ShotOutcome::Hit, &[]);
        ai.handle_shot_result(Coord::new(5, 4), ShotOutcome::Hit, &[]);
        assert_eq!(ai.orientation(), Some(Orientation::Vertical));
        assert!(ai.candidates().all(|c| c.col == 4));
    }

    #[test]
    fn blocked_end_falls_back_to_the_other() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut ai = Targeting::new();
        ai.handle_shot_result(Coord::new(2, 0), ShotOutcome::Hit, &[]);
        ai.handle_shot_result(Coord::new(2, 1), ShotOutcome::Hit, &[]);
        for _ in 0..16 {
            assert_eq!(ai.clone().choose_target(&mut rng), Coord::new(2, 2));
        }
    }
}
