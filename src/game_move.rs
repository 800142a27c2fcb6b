use crate::side::{SideId, SideStatus};

/// Priority tiers for solver-proposed moves.
///
/// Lower discriminants sort first, so `Highest` wins a plain ascending sort.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum MovePriority {
    /// Forced moves: hanging sides, intersections, link continuations,
    /// satisfied cell budgets.
    Highest,
    /// One-shot paired-requirement patterns found by the initial inspection.
    High,
    /// Link-sizing deductions against cell budgets.
    Normal,
    /// Pattern deductions that consult theoretical budgets or loop shape.
    Low,
    /// Last-resort inferences: face-to-face loops and faction separation.
    Lowest,
}

/// A proposed or applied status change for one side.
///
/// A pending move records the status it expects to overwrite; applying it
/// when the side has since changed silently discards it. Applied moves live
/// in the board history and reverse by swapping new and previous status.
#[derive(Clone, Debug)]
pub struct GameMove {
    pub(crate) side: SideId,
    pub(crate) new_status: SideStatus,
    pub(crate) prev_status: SideStatus,
    pub(crate) priority: MovePriority,
    pub(crate) reason: String,
    pub(crate) from_solver: bool,
}

impl GameMove {
    pub(crate) fn solver(
        side: SideId,
        new_status: SideStatus,
        priority: MovePriority,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            side,
            new_status,
            prev_status: SideStatus::Unset,
            priority,
            reason: reason.into(),
            from_solver: true,
        }
    }

    pub(crate) fn manual(side: SideId, new_status: SideStatus, prev_status: SideStatus) -> Self {
        Self {
            side,
            new_status,
            prev_status,
            priority: MovePriority::Highest,
            reason: String::from("Manual toggle."),
            from_solver: false,
        }
    }

    /// The side this move sets.
    pub fn side(&self) -> SideId {
        self.side
    }

    /// The status the move sets the side to.
    pub fn new_status(&self) -> SideStatus {
        self.new_status
    }

    /// The status the move expects to overwrite.
    pub fn prev_status(&self) -> SideStatus {
        self.prev_status
    }

    /// The move's priority tier.
    pub fn priority(&self) -> MovePriority {
        self.priority
    }

    /// Human-readable explanation of the deduction behind the move.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Whether the solver proposed this move (as opposed to a manual toggle).
    pub fn from_solver(&self) -> bool {
        self.from_solver
    }

    /// This move with new and previous status swapped.
    pub fn reversed(&self) -> Self {
        Self {
            side: self.side,
            new_status: self.prev_status,
            prev_status: self.new_status,
            priority: self.priority,
            reason: self.reason.clone(),
            from_solver: self.from_solver,
        }
    }
}
