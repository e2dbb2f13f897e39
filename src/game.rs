//! The match engine: both grids, the turn strategy and the outcome policy.
//!
//! After every shot that changes the target grid the engine applies the same
//! three steps regardless of mode: halo a sunk ship, end the match when the
//! target fleet is gone, otherwise let the turn strategy decide who fires next.

use alloc::boxed::Box;
use core::fmt;
use rand::rngs::SmallRng;

use crate::ai::Targeting;
use crate::common::{Coord, GridError, ShotOutcome, ShotReport};
use crate::grid::{Grid, GridState};
use crate::turns::{ComputerTurns, HotseatTurns, RemoteTurns, Seat, TurnPolicy, Turns};

/// Upper bound on shots in one computer turn; a grid has 100 cells.
const MAX_COMPUTER_SHOTS: usize = 128;

/// Kind of match. Statistics are kept per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameMode {
    VsComputer,
    Hotseat,
    Online,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::VsComputer => "vs computer",
            GameMode::Hotseat => "local",
            GameMode::Online => "online",
        };
        f.write_str(name)
    }
}

/// Errors returned by the match engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Coordinate outside the grid.
    InvalidCoordinate(GridError),
    /// Operation belongs to another match type.
    WrongMode { expected: GameMode, actual: GameMode },
    /// Operation needs a match played on this machine (vs computer or hot-seat).
    LocalOnly { actual: GameMode },
    /// A saved match contradicts itself.
    InvalidSnapshot(&'static str),
    /// The match has already ended.
    GameOver,
}

impl From<GridError> for MatchError {
    fn from(err: GridError) -> Self {
        MatchError::InvalidCoordinate(err)
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::InvalidCoordinate(e) => write!(f, "invalid coordinate: {}", e),
            MatchError::WrongMode { expected, actual } => write!(
                f,
                "operation requires a {} match, this is a {} match",
                expected, actual
            ),
            MatchError::LocalOnly { actual } => {
                write!(f, "operation requires a local match, this is an {} match", actual)
            }
            MatchError::InvalidSnapshot(why) => write!(f, "invalid saved match: {}", why),
            MatchError::GameOver => write!(f, "the match is over"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MatchError {}

/// Receiver of finished-match results, injected at construction.
pub trait Scoreboard {
    /// Record one finished match from the first seat's point of view.
    fn record(&mut self, mode: GameMode, won: bool) -> anyhow::Result<()>;
}

/// Everything needed to resume a match.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchSnapshot {
    pub mode: GameMode,
    pub grids: [GridState; 2],
    pub turns: Turns,
    pub game_over: bool,
    pub winner: Option<Seat>,
    pub targeting: Option<Targeting>,
}

pub struct MatchEngine {
    mode: GameMode,
    grids: [Grid; 2],
    turns: Turns,
    game_over: bool,
    winner: Option<Seat>,
    targeting: Option<Targeting>,
    rng: SmallRng,
    scoreboard: Option<Box<dyn Scoreboard + Send>>,
    stats_error: Option<anyhow::Error>,
}

impl MatchEngine {
    /// Human (`First`) against computer (`Second`); the human opens.
    pub fn vs_computer(human: Grid, computer: Grid, rng: SmallRng) -> Self {
        Self::build(
            GameMode::VsComputer,
            [human, computer],
            Turns::Computer(ComputerTurns::new(Seat::First)),
            Some(Targeting::new()),
            rng,
        )
    }

    /// Two players on one machine; player one opens.
    pub fn hotseat(one: Grid, two: Grid, rng: SmallRng) -> Self {
        Self::build(
            GameMode::Hotseat,
            [one, two],
            Turns::Hotseat(HotseatTurns::new(Seat::First)),
            None,
            rng,
        )
    }

    /// Local side of an online match. The peer's grid is virtual.
    pub fn online(local: Grid, local_starts: bool, rng: SmallRng) -> Self {
        let first = if local_starts { Seat::First } else { Seat::Second };
        Self::build(
            GameMode::Online,
            [local, Grid::new_virtual()],
            Turns::Remote(RemoteTurns::new(first)),
            None,
            rng,
        )
    }

    fn build(
        mode: GameMode,
        grids: [Grid; 2],
        turns: Turns,
        targeting: Option<Targeting>,
        rng: SmallRng,
    ) -> Self {
        log::info!("{} match started", mode);
        Self {
            mode,
            grids,
            turns,
            game_over: false,
            winner: None,
            targeting,
            rng,
            scoreboard: None,
            stats_error: None,
        }
    }

    /// Attach the statistics service that finished matches are reported to.
    pub fn with_scoreboard(mut self, scoreboard: Box<dyn Scoreboard + Send>) -> Self {
        self.scoreboard = Some(scoreboard);
        self
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn grid(&self, seat: Seat) -> &Grid {
        &self.grids[seat.index()]
    }

    /// Grid defended by the side at the controls: the human, the player about
    /// to shoot, or the local player.
    pub fn my_grid(&self) -> &Grid {
        self.grid(self.my_seat())
    }

    pub fn opponent_grid(&self) -> &Grid {
        self.grid(self.my_seat().other())
    }

    fn my_seat(&self) -> Seat {
        match self.mode {
            GameMode::Hotseat => self.turns.active_side(),
            GameMode::VsComputer | GameMode::Online => Seat::First,
        }
    }

    pub fn active_side(&self) -> Seat {
        self.turns.active_side()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }

    /// Whether the side at the controls may fire now.
    pub fn is_my_turn(&self) -> bool {
        if self.game_over {
            return false;
        }
        match self.mode {
            GameMode::Hotseat => self.turns.accepts_shot(),
            GameMode::VsComputer | GameMode::Online => self.turns.active_side() == Seat::First,
        }
    }

    pub fn is_switch_pending(&self) -> bool {
        self.turns.is_switch_pending()
    }

    pub fn targeting(&self) -> Option<&Targeting> {
        self.targeting.as_ref()
    }

    /// Statistics failure from the last recorded result, if any. The match is
    /// unaffected; the caller decides how to surface it.
    pub fn take_stats_error(&mut self) -> Option<anyhow::Error> {
        self.stats_error.take()
    }

    /// Fire at the opponent of the side at the controls.
    ///
    /// Returns `Ok(None)` when the shot is not allowed right now: match over,
    /// computer's turn, or a hot-seat hand-off pending. Online matches fire
    /// through the peer protocol instead.
    pub fn fire(&mut self, row: usize, col: usize) -> Result<Option<ShotReport>, MatchError> {
        Coord::checked(row, col)?;
        self.require_local()?;
        if !self.is_my_turn() {
            return Ok(None);
        }
        let target = self.turns.active_side().other();
        let report = self.grids[target.index()].fire_at(row, col)?;
        self.settle(target, &report);
        Ok(Some(report))
    }

    /// One computer shot at the human grid. `None` outside the computer's turn.
    pub fn computer_shot(&mut self) -> Option<ShotReport> {
        if self.mode != GameMode::VsComputer
            || self.game_over
            || self.turns.active_side() != Seat::Second
        {
            return None;
        }
        let targeting = self.targeting.get_or_insert_with(Targeting::new);
        let target = targeting.choose_target(&mut self.rng);
        let report = self.grids[Seat::First.index()]
            .fire_at(target.row, target.col)
            .ok()?;
        let human = &self.grids[Seat::First.index()];
        let sunk_cells: &[Coord] = match report.ship {
            Some(ship) if report.outcome == ShotOutcome::Sunk => {
                human.ship(ship).map(|s| s.cells()).unwrap_or(&[])
            }
            _ => &[],
        };
        targeting.handle_shot_result(target, report.outcome, sunk_cells);
        self.settle(Seat::First, &report);
        Some(report)
    }

    /// Let the computer shoot until it misses or the match ends. Returns the
    /// last shot, or `None` if it was not the computer's turn.
    pub fn run_computer_turn(&mut self) -> Option<ShotReport> {
        let mut last = None;
        for _ in 0..MAX_COMPUTER_SHOTS {
            match self.computer_shot() {
                Some(report) => last = Some(report),
                None => break,
            }
        }
        last
    }

    /// Pass control to the other hot-seat player after a miss.
    pub fn acknowledge_handoff(&mut self) -> bool {
        if self.mode != GameMode::Hotseat || self.game_over {
            return false;
        }
        self.turns.acknowledge_handoff()
    }

    /// Whether the local side of an online match may send a shot at (row, col).
    pub fn can_fire_remote(&self, row: usize, col: usize) -> Result<bool, MatchError> {
        self.require(GameMode::Online)?;
        let cell = self.grid(Seat::Second).cell(row, col)?;
        Ok(self.is_my_turn() && !cell.is_shot())
    }

    /// The peer fired at our grid. This side is authoritative for the result.
    ///
    /// A repeated coordinate is answered with the cell's recorded result
    /// (`Hit` or `Miss`) and the turn rule is applied to it as well, so that
    /// both sides keep inferring the same turn.
    pub fn apply_incoming_shot(&mut self, row: usize, col: usize) -> Result<ShotReport, MatchError> {
        self.require(GameMode::Online)?;
        if self.game_over {
            return Err(MatchError::GameOver);
        }
        let local = &mut self.grids[Seat::First.index()];
        let mut report = local.fire_at(row, col)?;
        if report.outcome == ShotOutcome::AlreadyShot {
            report.outcome = if local.cell(row, col)?.is_hit() {
                ShotOutcome::Hit
            } else {
                ShotOutcome::Miss
            };
            log::warn!("peer fired at {} again, replaying {:?}", report.coord, report.outcome);
            self.turns.resolve_after_shot(report.outcome);
            return Ok(report);
        }
        self.settle(Seat::First, &report);
        Ok(report)
    }

    /// The peer reported the result of our shot at (row, col).
    pub fn apply_remote_result(
        &mut self,
        row: usize,
        col: usize,
        outcome: ShotOutcome,
        sunk_cells: &[Coord],
    ) -> Result<ShotReport, MatchError> {
        self.require(GameMode::Online)?;
        if self.game_over {
            return Err(MatchError::GameOver);
        }
        let report =
            self.grids[Seat::Second.index()].record_remote_outcome(row, col, outcome, sunk_cells)?;
        if report.outcome == ShotOutcome::AlreadyShot {
            if outcome != ShotOutcome::AlreadyShot {
                self.turns.resolve_after_shot(outcome);
            }
            return Ok(report);
        }
        self.settle(Seat::Second, &report);
        Ok(report)
    }

    /// End an online match from outside the grids: GAME_OVER, DISCONNECT or a
    /// broken connection. Ignored once the match is over.
    pub fn conclude_remote(&mut self, local_won: bool) -> Result<(), MatchError> {
        self.require(GameMode::Online)?;
        if self.game_over {
            return Ok(());
        }
        self.finish(if local_won { Seat::First } else { Seat::Second });
        Ok(())
    }

    /// Start over with freshly placed fleets. Not available online.
    pub fn reset_game(&mut self) -> Result<(), MatchError> {
        self.require_local()?;
        for grid in self.grids.iter_mut() {
            grid.reset_fleet(&mut self.rng);
        }
        self.turns = match self.mode {
            GameMode::Hotseat => Turns::Hotseat(HotseatTurns::new(Seat::First)),
            _ => Turns::Computer(ComputerTurns::new(Seat::First)),
        };
        if let Some(t) = self.targeting.as_mut() {
            t.reset();
        }
        self.game_over = false;
        self.winner = None;
        log::info!("{} match restarted", self.mode);
        Ok(())
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            mode: self.mode,
            grids: [GridState::from(&self.grids[0]), GridState::from(&self.grids[1])],
            turns: self.turns,
            game_over: self.game_over,
            winner: self.winner,
            targeting: self.targeting.clone(),
        }
    }

    /// Rebuild an engine from a snapshot. Grids get fresh identities.
    ///
    /// Snapshots come from disk, so everything the engine relies on is checked
    /// before the engine is built.
    pub fn restore(snapshot: MatchSnapshot, rng: SmallRng) -> Result<Self, MatchError> {
        let turns_fit = matches!(
            (snapshot.mode, &snapshot.turns),
            (GameMode::VsComputer, Turns::Computer(_))
                | (GameMode::Hotseat, Turns::Hotseat(_))
                | (GameMode::Online, Turns::Remote(_))
        );
        if !turns_fit {
            return Err(MatchError::InvalidSnapshot("turn state belongs to another mode"));
        }
        if snapshot.game_over != snapshot.winner.is_some() {
            return Err(MatchError::InvalidSnapshot("winner disagrees with game over flag"));
        }
        let [a, b] = snapshot.grids;
        let grids = [restore_grid(a)?, restore_grid(b)?];
        let remote = snapshot.mode == GameMode::Online;
        if grids[0].is_virtual() || grids[1].is_virtual() != remote {
            return Err(MatchError::InvalidSnapshot("virtual grid in the wrong seat"));
        }
        let targeting = match snapshot.mode {
            GameMode::VsComputer => Some(snapshot.targeting.unwrap_or_default()),
            _ => snapshot.targeting,
        };
        log::info!("{} match restored", snapshot.mode);
        Ok(Self {
            mode: snapshot.mode,
            grids,
            turns: snapshot.turns,
            game_over: snapshot.game_over,
            winner: snapshot.winner,
            targeting,
            rng,
            scoreboard: None,
            stats_error: None,
        })
    }

    fn require_local(&self) -> Result<(), MatchError> {
        if self.mode == GameMode::Online {
            return Err(MatchError::LocalOnly { actual: self.mode });
        }
        Ok(())
    }

    fn require(&self, mode: GameMode) -> Result<(), MatchError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(MatchError::WrongMode {
                expected: mode,
                actual: self.mode,
            })
        }
    }

    fn settle(&mut self, target: Seat, report: &ShotReport) {
        if report.outcome == ShotOutcome::AlreadyShot {
            return;
        }
        let grid = &mut self.grids[target.index()];
        if report.outcome == ShotOutcome::Sunk {
            if let Some(ship) = report.ship {
                grid.mark_miss_halo(ship);
            }
        }
        if grid.all_sunk() {
            self.finish(target.other());
        } else {
            self.turns.resolve_after_shot(report.outcome);
        }
    }

    fn finish(&mut self, winner: Seat) {
        self.game_over = true;
        self.winner = Some(winner);
        let won = winner == Seat::First;
        log::info!("{} match over, first seat {}", self.mode, if won { "won" } else { "lost" });
        if let Some(board) = self.scoreboard.as_mut() {
            if let Err(e) = board.record(self.mode, won) {
                log::warn!("could not record {} result: {}", self.mode, e);
                self.stats_error = Some(e);
            }
        }
    }
}

fn restore_grid(state: GridState) -> Result<Grid, MatchError> {
    Grid::try_from(state).map_err(|e| match e {
        GridError::CorruptState(why) => MatchError::InvalidSnapshot(why),
        GridError::OutOfBounds { .. } => MatchError::InvalidSnapshot("cell off the board"),
    })
}

impl fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchEngine")
            .field("mode", &self.mode)
            .field("turns", &self.turns)
            .field("game_over", &self.game_over)
            .field("winner", &self.winner)
            .finish()
    }
}
