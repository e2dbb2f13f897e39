//! One player's 10×10 field and its fleet.

use alloc::vec::Vec;
use core::fmt;
use rand::Rng;

use crate::bitboard::CellSet;
use crate::common::{Coord, GridError, ShotOutcome, ShotReport};
use crate::config::{FLEET, GRID_SIZE, MAX_PLACEMENT_ATTEMPTS};
use crate::ship::{GridId, Orientation, Ship, ShipRef};

/// Fleet restarts allowed before `auto_place_fleet` gives up.
const MAX_FLEET_RESTARTS: usize = 64;

/// State of one grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    ship: Option<usize>,
    shot: bool,
    hit: bool,
    forced_miss: bool,
}

impl Cell {
    /// Index of the ship occupying this cell in its grid's fleet.
    pub fn ship_index(&self) -> Option<usize> {
        self.ship
    }

    pub fn has_ship(&self) -> bool {
        self.ship.is_some()
    }

    pub fn is_shot(&self) -> bool {
        self.shot
    }

    pub fn is_hit(&self) -> bool {
        self.shot && self.hit
    }

    pub fn is_miss(&self) -> bool {
        self.shot && !self.hit
    }

    /// Miss filled in by the halo around a sunk ship rather than by a shot.
    pub fn is_forced_miss(&self) -> bool {
        self.forced_miss
    }
}

/// A grid: cells, fleet and the occupancy mask used for buffer-zone checks.
///
/// A *virtual* grid stands in for a remote opponent: nothing about its fleet is
/// known locally, and it is filled from reported shot results instead.
pub struct Grid {
    id: GridId,
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
    ships: Vec<Ship>,
    occupied: CellSet,
    virtual_fleet: bool,
}

impl Grid {
    /// Empty grid, ready for manual placement.
    pub fn new() -> Self {
        Self {
            id: GridId::fresh(),
            cells: [[Cell::default(); GRID_SIZE]; GRID_SIZE],
            ships: Vec::new(),
            occupied: CellSet::new(),
            virtual_fleet: false,
        }
    }

    /// Grid pre-populated with a random legal fleet.
    pub fn with_random_fleet<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut grid = Self::new();
        grid.auto_place_fleet(rng);
        grid
    }

    /// Grid for the remote side of an online match.
    pub fn new_virtual() -> Self {
        Self {
            virtual_fleet: true,
            ..Self::new()
        }
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_fleet
    }

    pub fn fleet_template(&self) -> &'static [usize] {
        &FLEET
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Resolve a handle; `None` for handles issued by another grid.
    pub fn ship(&self, ship: ShipRef) -> Option<&Ship> {
        if ship.grid != self.id {
            return None;
        }
        self.ships.get(ship.index)
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell, GridError> {
        let c = Coord::checked(row, col)?;
        Ok(&self.cells[c.row][c.col])
    }

    /// Occupancy of every placed or revealed ship.
    pub fn occupied(&self) -> CellSet {
        self.occupied
    }

    /// Unshot cells in row-major order.
    pub fn available_targets(&self) -> Vec<Coord> {
        let mut out = Vec::new();
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if !cell.shot {
                    out.push(Coord::new(r, c));
                }
            }
        }
        out
    }

    /// Removes every ship and clears every shot. Handles issued before are invalidated.
    pub fn clear_fleet(&mut self) {
        self.id = GridId::fresh();
        self.cells = [[Cell::default(); GRID_SIZE]; GRID_SIZE];
        self.ships.clear();
        self.occupied.clear_all();
    }

    /// Clears the grid and places a fresh random fleet.
    pub fn reset_fleet<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.clear_fleet();
        self.auto_place_fleet(rng)
    }

    /// True iff the run stays on the grid and neither it nor its halo touches a ship.
    pub fn can_place(&self, length: usize, row: usize, col: usize, horizontal: bool) -> bool {
        self.run_mask(length, row, col, Orientation::from_horizontal(horizontal))
            .is_some_and(|run| !self.occupied.intersects(&run.halo()))
    }

    /// Places a ship if `can_place` allows it; otherwise leaves the grid untouched.
    pub fn place(&mut self, length: usize, row: usize, col: usize, horizontal: bool) -> bool {
        if self.virtual_fleet || !self.can_place(length, row, col, horizontal) {
            return false;
        }
        let cells: Vec<Coord> = Orientation::from_horizontal(horizontal)
            .run(length, row, col)
            .collect();
        self.bind_ship(Ship::new(cells));
        true
    }

    /// Places the whole canonical fleet at random, replacing any ships present.
    ///
    /// Each ship gets `MAX_PLACEMENT_ATTEMPTS` random samples, then a scan of every
    /// position from a random starting point. Should a ship still not fit, the
    /// fleet is cleared and placement starts over.
    pub fn auto_place_fleet<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        for restart in 0..MAX_FLEET_RESTARTS {
            if restart > 0 {
                log::warn!("fleet placement restarted (attempt {})", restart + 1);
            }
            self.clear_fleet();
            if FLEET.iter().all(|&len| self.place_randomly(rng, len)) {
                return true;
            }
        }
        log::error!("unable to place the fleet after {} restarts", MAX_FLEET_RESTARTS);
        self.clear_fleet();
        false
    }

    fn place_randomly<R: Rng + ?Sized>(&mut self, rng: &mut R, length: usize) -> bool {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let horizontal: bool = rng.random();
            let row = rng.random_range(0..GRID_SIZE);
            let col = rng.random_range(0..GRID_SIZE);
            if self.place(length, row, col, horizontal) {
                return true;
            }
        }
        log::debug!("random placement of a {}-ship failed, scanning", length);
        let start = rng.random_range(0..GRID_SIZE * GRID_SIZE * 2);
        (0..GRID_SIZE * GRID_SIZE * 2)
            .map(|i| (start + i) % (GRID_SIZE * GRID_SIZE * 2))
            .any(|slot| {
                let cell = slot / 2;
                self.place(length, cell / GRID_SIZE, cell % GRID_SIZE, slot % 2 == 0)
            })
    }

    /// Fires at (row, col). Repeats return `AlreadyShot` and change nothing.
    pub fn fire_at(&mut self, row: usize, col: usize) -> Result<ShotReport, GridError> {
        let coord = Coord::checked(row, col)?;
        let cell = &mut self.cells[row][col];
        if cell.shot {
            return Ok(ShotReport::already(coord));
        }
        cell.shot = true;
        let Some(index) = cell.ship else {
            return Ok(ShotReport::miss(coord));
        };
        cell.hit = true;
        let ship = &mut self.ships[index];
        ship.register_hit();
        let outcome = if ship.is_sunk() {
            ShotOutcome::Sunk
        } else {
            ShotOutcome::Hit
        };
        Ok(ShotReport {
            coord,
            outcome,
            ship: Some(self.ship_ref(index)),
        })
    }

    /// Marks every unshot neighbour of a sunk ship as a miss. Returns false, and
    /// changes nothing, for a ship from another grid or one still afloat.
    pub fn mark_miss_halo(&mut self, ship: ShipRef) -> bool {
        let Some(target) = self.ship(ship) else {
            log::warn!("miss halo requested for a ship of another grid");
            return false;
        };
        if !target.is_sunk() {
            return false;
        }
        let mut body = CellSet::new();
        for &c in target.cells() {
            body.insert(c);
        }
        for (r, c) in body.halo().iter_set_bits() {
            let cell = &mut self.cells[r][c];
            if !cell.shot && cell.ship.is_none() {
                cell.shot = true;
                cell.forced_miss = true;
            }
        }
        true
    }

    /// Every ship sunk. An empty fleet never counts; a virtual fleet counts once
    /// the whole template has been revealed sunk.
    pub fn all_sunk(&self) -> bool {
        if self.ships.is_empty() {
            return false;
        }
        if self.virtual_fleet {
            return self.ships.len() >= FLEET.len() && self.ships.iter().all(Ship::is_sunk);
        }
        self.ships.iter().all(Ship::is_sunk)
    }

    pub fn sunk_count(&self) -> usize {
        self.ships.iter().filter(|s| s.is_sunk()).count()
    }

    /// Applies a result reported by the remote owner of a virtual grid.
    ///
    /// `sunk_cells` is only read for `Sunk`: the listed cells, plus the fired
    /// cell, become a revealed sunk ship.
    pub fn record_remote_outcome(
        &mut self,
        row: usize,
        col: usize,
        outcome: ShotOutcome,
        sunk_cells: &[Coord],
    ) -> Result<ShotReport, GridError> {
        let coord = Coord::checked(row, col)?;
        if self.cells[row][col].shot || outcome == ShotOutcome::AlreadyShot {
            return Ok(ShotReport::already(coord));
        }
        match outcome {
            ShotOutcome::Miss => {
                self.cells[row][col].shot = true;
                Ok(ShotReport::miss(coord))
            }
            ShotOutcome::Hit => {
                let cell = &mut self.cells[row][col];
                cell.shot = true;
                cell.hit = true;
                Ok(ShotReport {
                    coord,
                    outcome,
                    ship: None,
                })
            }
            ShotOutcome::Sunk => {
                let mut cells: Vec<Coord> = Vec::with_capacity(sunk_cells.len() + 1);
                for &c in sunk_cells.iter().chain(core::iter::once(&coord)) {
                    let taken = self.cell(c.row, c.col).map(|cell| cell.has_ship());
                    if taken == Ok(false) && !cells.contains(&c) {
                        cells.push(c);
                    }
                }
                for c in &cells {
                    let cell = &mut self.cells[c.row][c.col];
                    cell.shot = true;
                    cell.hit = true;
                    cell.forced_miss = false;
                }
                let mut ship = Ship::new(cells);
                ship.force_sunk();
                let index = self.bind_ship(ship);
                Ok(ShotReport {
                    coord,
                    outcome,
                    ship: Some(self.ship_ref(index)),
                })
            }
            ShotOutcome::AlreadyShot => Ok(ShotReport::already(coord)),
        }
    }

    fn ship_ref(&self, index: usize) -> ShipRef {
        ShipRef {
            grid: self.id,
            index,
        }
    }

    fn bind_ship(&mut self, ship: Ship) -> usize {
        let index = self.ships.len();
        for c in ship.cells() {
            self.cells[c.row][c.col].ship = Some(index);
            self.occupied.insert(*c);
        }
        self.ships.push(ship);
        index
    }

    fn run_mask(
        &self,
        length: usize,
        row: usize,
        col: usize,
        orientation: Orientation,
    ) -> Option<CellSet> {
        if length == 0 {
            return None;
        }
        let mut run = CellSet::new();
        for c in orientation.run(length, row, col) {
            if !c.in_bounds() {
                return None;
            }
            run.insert(c);
        }
        Some(run)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("id", &self.id)
            .field("virtual", &self.virtual_fleet)
            .field("ships", &self.ships)
            .finish()
    }
}

/// Serializable grid contents for saving games.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GridState {
    pub cells: [[Cell; GRID_SIZE]; GRID_SIZE],
    pub ships: Vec<Ship>,
    pub virtual_fleet: bool,
}

impl From<&Grid> for GridState {
    fn from(g: &Grid) -> Self {
        GridState {
            cells: g.cells,
            ships: g.ships.clone(),
            virtual_fleet: g.virtual_fleet,
        }
    }
}

impl TryFrom<GridState> for Grid {
    type Error = GridError;

    /// A restored grid is a new grid: it gets a fresh identity. Contents that
    /// could not have come from play are rejected.
    fn try_from(state: GridState) -> Result<Self, GridError> {
        let mut occupied = CellSet::new();
        for (index, ship) in state.ships.iter().enumerate() {
            if ship.is_empty() {
                return Err(GridError::CorruptState("ship without cells"));
            }
            let mut hit = 0;
            for &c in ship.cells() {
                if !c.in_bounds() {
                    return Err(GridError::CorruptState("ship cell off the board"));
                }
                let cell = &state.cells[c.row][c.col];
                if cell.ship != Some(index) {
                    return Err(GridError::CorruptState("ship cell not linked to its ship"));
                }
                if cell.is_hit() {
                    hit += 1;
                }
                occupied.insert(c);
            }
            if hit != ship.hits() {
                return Err(GridError::CorruptState("hit counter disagrees with the cells"));
            }
        }
        for (r, row) in state.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(index) = cell.ship {
                    let linked = state
                        .ships
                        .get(index)
                        .is_some_and(|ship| ship.cells().contains(&Coord::new(r, c)));
                    if !linked {
                        return Err(GridError::CorruptState("cell names a missing ship"));
                    }
                }
                if (cell.hit || cell.forced_miss) && !cell.shot {
                    return Err(GridError::CorruptState("hit or miss on an unshot cell"));
                }
                if cell.forced_miss && cell.ship.is_some() {
                    return Err(GridError::CorruptState("forced miss on a ship"));
                }
            }
        }
        Ok(Grid {
            id: GridId::fresh(),
            cells: state.cells,
            ships: state.ships,
            occupied,
            virtual_fleet: state.virtual_fleet,
        })
    }
}
