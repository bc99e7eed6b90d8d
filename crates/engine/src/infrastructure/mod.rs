//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod config;
pub mod identity;
pub mod ports;
pub mod spaces;
