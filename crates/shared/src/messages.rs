//! WebSocket message types for client-coordinator communication
//!
//! Every frame is a JSON object `{"type": ..., "payload": {...}}`. Tags are
//! kebab-case and payload fields camelCase.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing variants requires major version bump
//! - Renaming variants is a breaking change

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::responses::{DimensionsData, ElementData, ErrorCode, OccupantData, PositionData};
use metaverse_domain::MoveRejection;

// =============================================================================
// Client Messages (client → coordinator)
// =============================================================================

/// Messages from a client to the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Bind this connection to a space
    Join { space_id: String, token: String },
    /// Move to an absolute cell. Coordinates are wider than any space so
    /// far-off targets are rejected as out of bounds rather than unparseable.
    Move { x: i64, y: i64 },
    /// Leave the space and close the session
    Leave {},
}

impl ClientMessage {
    /// Tag name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Move { .. } => "move",
            Self::Leave {} => "leave",
        }
    }
}

// =============================================================================
// Server Messages (coordinator → client)
// =============================================================================

/// Messages from the coordinator to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Sent to the joining connection only
    SpaceJoined {
        space_id: String,
        /// The joiner's own session
        session_id: Uuid,
        user_id: String,
        spawn: PositionData,
        dimensions: DimensionsData,
        elements: Vec<ElementData>,
        /// Everyone else already in the space, in join order
        occupants: Vec<OccupantData>,
    },
    /// Someone else joined the space
    UserJoined {
        session_id: Uuid,
        user_id: String,
        identity: String,
        x: i32,
        y: i32,
    },
    /// Someone else moved
    Movement {
        session_id: Uuid,
        user_id: String,
        x: i32,
        y: i32,
    },
    /// The sender's move was refused; `x`/`y` is its unchanged position
    MovementRejected { reason: MoveRejection, x: i32, y: i32 },
    /// Someone else left or disconnected
    UserLeft {
        session_id: Uuid,
        user_id: String,
        identity: String,
    },
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    /// Tag name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SpaceJoined { .. } => "space-joined",
            Self::UserJoined { .. } => "user-joined",
            Self::Movement { .. } => "movement",
            Self::MovementRejected { .. } => "movement-rejected",
            Self::UserLeft { .. } => "user-left",
            Self::Error { .. } => "error",
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}
