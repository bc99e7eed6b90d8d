//! A participant's live presence inside one space.

use crate::geometry::Position;
use crate::ids::{ConnectionId, SessionId};
use crate::value_objects::{Identity, SpaceId};

/// Live session state. Created on join, moved only through validated moves,
/// dropped on leave or disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    connection_id: ConnectionId,
    identity: Identity,
    space_id: SpaceId,
    position: Position,
}

impl Session {
    pub fn new(
        connection_id: ConnectionId,
        identity: Identity,
        space_id: SpaceId,
        position: Position,
    ) -> Self {
        Self {
            id: SessionId::new(),
            connection_id,
            identity,
            space_id,
            position,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Only called after the move has been validated against the space.
    pub fn relocate(&mut self, position: Position) {
        self.position = position;
    }
}
