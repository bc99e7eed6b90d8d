//! Value objects - validated newtypes with no identity of their own.

mod names;

pub use names::{Identity, SpaceId};
