//! Movement validation.
//!
//! [`validate_move`] is a pure decision function. It reads geometry and an
//! occupancy view and never mutates either, so it can run speculatively or
//! concurrently against the same snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Position, SpaceGeometry};
use crate::ids::SessionId;

/// Read-only lookup of which session, if any, occupies a cell.
pub trait OccupancyView {
    fn occupant_at(&self, position: Position) -> Option<SessionId>;
}

impl OccupancyView for std::collections::HashMap<Position, SessionId> {
    fn occupant_at(&self, position: Position) -> Option<SessionId> {
        self.get(&position).copied()
    }
}

/// Why a move was refused. Serialized by name on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// Destination is further than the configured step limit.
    StepTooLarge,
    OutOfBounds,
    BlockedByElement,
    OccupiedBySession,
}

impl MoveRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StepTooLarge => "StepTooLarge",
            Self::OutOfBounds => "OutOfBounds",
            Self::BlockedByElement => "BlockedByElement",
            Self::OccupiedBySession => "OccupiedBySession",
        }
    }
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDecision {
    Accept,
    Reject(MoveRejection),
}

impl MoveDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// A requested destination as the client sent it. It only becomes a grid
/// [`Position`] once it fits the cell coordinate range; anything wider lies
/// outside every space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub x: i64,
    pub y: i64,
}

impl Destination {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The grid cell, if the coordinates fit one.
    pub fn cell(&self) -> Option<Position> {
        Some(Position::new(
            i32::try_from(self.x).ok()?,
            i32::try_from(self.y).ok()?,
        ))
    }

    /// Chebyshev distance from `from`, without overflow.
    pub fn step_distance_from(&self, from: Position) -> u64 {
        let dx = self.x.abs_diff(i64::from(from.x));
        let dy = self.y.abs_diff(i64::from(from.y));
        dx.max(dy)
    }
}

impl From<Position> for Destination {
    fn from(position: Position) -> Self {
        Self::new(i64::from(position.x), i64::from(position.y))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Optional rules layered on top of the fixed bounds/element/occupancy checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementRules {
    /// Maximum Chebyshev distance of a single move. `None` disables the rule.
    pub max_step: Option<u32>,
}

/// Decide whether `mover` may go from `current` to `proposed`.
///
/// Rules are evaluated in order and the first failure wins:
/// step limit (when configured), bounds, static elements, other sessions.
/// Staying on one's own cell is accepted.
pub fn validate_move(
    geometry: &SpaceGeometry,
    occupancy: &impl OccupancyView,
    rules: MovementRules,
    mover: SessionId,
    current: Position,
    proposed: impl Into<Destination>,
) -> MoveDecision {
    let proposed = proposed.into();
    if let Some(max_step) = rules.max_step {
        if proposed.step_distance_from(current) > u64::from(max_step) {
            return MoveDecision::Reject(MoveRejection::StepTooLarge);
        }
    }

    let Some(proposed) = proposed.cell().filter(|&cell| geometry.in_bounds(cell)) else {
        return MoveDecision::Reject(MoveRejection::OutOfBounds);
    };

    if geometry.is_blocked(proposed) {
        return MoveDecision::Reject(MoveRejection::BlockedByElement);
    }

    match occupancy.occupant_at(proposed) {
        Some(other) if other != mover => MoveDecision::Reject(MoveRejection::OccupiedBySession),
        _ => MoveDecision::Accept,
    }
}
