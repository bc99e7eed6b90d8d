//! Payload DTOs and error classification for server messages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use metaverse_domain::{Dimensions, ElementFootprint, Position, Session};

// =============================================================================
// Error Codes
// =============================================================================

/// Error classification codes carried by `ServerMessage::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Token was missing, invalid, or expired
    AuthError,
    /// The requested space does not exist
    NotFound,
    /// The connection already holds a session
    AlreadyJoined,
    /// Message was malformed or not valid in the current state
    ProtocolError,
    /// The space has no free cell to spawn into
    SpaceFull,
    /// Unexpected server-side failure; the connection will be closed
    InternalError,
}

// =============================================================================
// Geometry DTOs
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionData {
    pub x: i32,
    pub y: i32,
}

impl From<Position> for PositionData {
    fn from(p: Position) -> Self {
        Self { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionsData {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for DimensionsData {
    fn from(d: Dimensions) -> Self {
        Self {
            width: d.width(),
            height: d.height(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementData {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl From<&ElementFootprint> for ElementData {
    fn from(e: &ElementFootprint) -> Self {
        Self {
            x: e.x,
            y: e.y,
            width: e.width,
            height: e.height,
        }
    }
}

// =============================================================================
// Occupants
// =============================================================================

/// A session already present in a space, as listed in `space-joined`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupantData {
    pub session_id: Uuid,
    pub user_id: String,
    pub identity: String,
    pub x: i32,
    pub y: i32,
}

impl From<&Session> for OccupantData {
    fn from(session: &Session) -> Self {
        let position = session.position();
        Self {
            session_id: session.id().to_uuid(),
            user_id: session.identity().to_string(),
            identity: session.identity().to_string(),
            x: position.x,
            y: position.y,
        }
    }
}
