//! Metaverse Shared - wire types for space clients
//!
//! This crate contains the message types exchanged over a space WebSocket:
//! - `ClientMessage` (client → coordinator)
//! - `ServerMessage` (coordinator → client)
//! - Payload DTOs and error codes
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, serde_json, uuid, and `metaverse-domain`
//!    for the shared rejection vocabulary
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - use raw `uuid::Uuid` and `String` in DTOs

pub mod messages;
pub mod responses;

pub use messages::{ClientMessage, ServerMessage};
pub use responses::{DimensionsData, ElementData, ErrorCode, OccupantData, PositionData};

// Rejection reasons are shared vocabulary with the domain validator.
pub use metaverse_domain::MoveRejection;
