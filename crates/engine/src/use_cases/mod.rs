//! Use cases - User story orchestration.

pub mod coordinator;

pub use coordinator::{Connection, ConnectionState, Coordinator, CoordinatorError};
