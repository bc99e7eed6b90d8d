//! Metaverse Engine - space session coordinator.
//!
//! This crate exposes internal modules for integration testing.

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;
