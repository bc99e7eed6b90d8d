//! In-memory state storage modules.
//!
//! Stores manage runtime state that lives only as long as the process:
//! - `SpaceRegistry` - live sessions and occupancy, one lock per space
//! - `broadcaster` - ordered fan-out of events to a space's sessions

pub mod broadcaster;
pub mod space_registry;

pub use broadcaster::{deliver, Audience, DeliveryReport};
pub use space_registry::{
    EmptySpacePolicy, Outbox, RegistryError, SpaceGuard, SpaceRegistry, SpaceState,
};
