//! Metaverse Domain - core types and rules for shared 2-D spaces.
//!
//! Everything here is pure: no I/O, no async, no locking. The engine owns
//! the concurrency; this crate owns the invariants.

pub mod error;
pub mod geometry;
pub mod ids;
pub mod movement;
pub mod session;
pub mod value_objects;

pub use error::DomainError;
pub use geometry::{Dimensions, ElementFootprint, Position, SpaceGeometry};
pub use ids::{ConnectionId, SessionId};
pub use movement::{validate_move, Destination, MoveDecision, MoveRejection, MovementRules, OccupancyView};
pub use session::Session;
pub use value_objects::{Identity, SpaceId};
