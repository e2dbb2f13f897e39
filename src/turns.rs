//! Turn-resolution strategies, one per match type.
//!
//! All three apply the same rule after a shot that changed something: a MISS
//! hands the turn over, a HIT or SUNK keeps it. They differ in how the hand-over
//! happens. The computer and remote strategies flip at once; the hot-seat
//! strategy closes a gate until the players acknowledge the swap.

use crate::common::ShotOutcome;

/// One of the two sides of a match.
///
/// * vs-computer: `First` is the human, `Second` the computer.
/// * hot-seat: player one and player two.
/// * remote: `First` is the local player, `Second` the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }
}

/// What a strategy decided after a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnChange {
    /// The shooter fires again.
    Keep,
    /// The other side is now active.
    Pass,
    /// The other side will be active once the hand-off is acknowledged.
    AwaitHandoff,
}

/// Interface shared by the turn strategies.
pub trait TurnPolicy {
    /// Side entitled to the next shot.
    fn active_side(&self) -> Seat;

    /// Apply the turn rule for a shot that changed the target grid.
    fn resolve_after_shot(&mut self, outcome: ShotOutcome) -> TurnChange;

    /// False while a hand-off is pending.
    fn accepts_shot(&self) -> bool {
        true
    }

    /// Complete a pending hand-off. Returns whether one was pending.
    fn acknowledge_handoff(&mut self) -> bool {
        false
    }
}

fn flip_on_miss(active: &mut Seat, outcome: ShotOutcome) -> TurnChange {
    if outcome.keeps_turn() {
        TurnChange::Keep
    } else {
        *active = active.other();
        TurnChange::Pass
    }
}

/// Human against computer; a single turn flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ComputerTurns {
    active: Seat,
}

impl ComputerTurns {
    pub fn new(active: Seat) -> Self {
        Self { active }
    }
}

impl TurnPolicy for ComputerTurns {
    fn active_side(&self) -> Seat {
        self.active
    }

    fn resolve_after_shot(&mut self, outcome: ShotOutcome) -> TurnChange {
        flip_on_miss(&mut self.active, outcome)
    }
}

/// Two players sharing one input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct HotseatTurns {
    active: Seat,
    pending_switch: bool,
}

impl HotseatTurns {
    pub fn new(active: Seat) -> Self {
        Self {
            active,
            pending_switch: false,
        }
    }

    pub fn is_switch_pending(&self) -> bool {
        self.pending_switch
    }
}

impl TurnPolicy for HotseatTurns {
    fn active_side(&self) -> Seat {
        self.active
    }

    fn resolve_after_shot(&mut self, outcome: ShotOutcome) -> TurnChange {
        if outcome.keeps_turn() {
            TurnChange::Keep
        } else {
            self.pending_switch = true;
            TurnChange::AwaitHandoff
        }
    }

    fn accepts_shot(&self) -> bool {
        !self.pending_switch
    }

    fn acknowledge_handoff(&mut self) -> bool {
        if !self.pending_switch {
            return false;
        }
        self.pending_switch = false;
        self.active = self.active.other();
        true
    }
}

/// Online match; the flag moves only on observed SHOT/RESULT traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoteTurns {
    active: Seat,
}

impl RemoteTurns {
    pub fn new(active: Seat) -> Self {
        Self { active }
    }
}

impl TurnPolicy for RemoteTurns {
    fn active_side(&self) -> Seat {
        self.active
    }

    fn resolve_after_shot(&mut self, outcome: ShotOutcome) -> TurnChange {
        flip_on_miss(&mut self.active, outcome)
    }
}

/// The closed set of strategies, kept as an enum so the engine can snapshot it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Turns {
    Computer(ComputerTurns),
    Hotseat(HotseatTurns),
    Remote(RemoteTurns),
}

impl Turns {
    fn policy(&self) -> &dyn TurnPolicy {
        match self {
            Turns::Computer(t) => t,
            Turns::Hotseat(t) => t,
            Turns::Remote(t) => t,
        }
    }

    fn policy_mut(&mut self) -> &mut dyn TurnPolicy {
        match self {
            Turns::Computer(t) => t,
            Turns::Hotseat(t) => t,
            Turns::Remote(t) => t,
        }
    }

    pub fn is_switch_pending(&self) -> bool {
        matches!(self, Turns::Hotseat(t) if t.is_switch_pending())
    }
}

impl TurnPolicy for Turns {
    fn active_side(&self) -> Seat {
        self.policy().active_side()
    }

    fn resolve_after_shot(&mut self, outcome: ShotOutcome) -> TurnChange {
        self.policy_mut().resolve_after_shot(outcome)
    }

    fn accepts_shot(&self) -> bool {
        self.policy().accepts_shot()
    }

    fn acknowledge_handoff(&mut self) -> bool {
        self.policy_mut().acknowledge_handoff()
    }
}
