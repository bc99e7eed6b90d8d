//! Per-connection state.

use tokio::sync::mpsc::error::TrySendError;

use metaverse_domain::{ConnectionId, SessionId, SpaceId};
use metaverse_shared::ServerMessage;

use crate::stores::Outbox;

/// Lifecycle of one connection. `Closed` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unauthenticated,
    Joined {
        space_id: SpaceId,
        session_id: SessionId,
    },
    Closed,
}

/// A transport connection as seen by the coordinator.
///
/// Owned by the task reading the socket, so messages from one connection are
/// handled one at a time.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbox: Outbox,
    state: ConnectionState,
}

impl Connection {
    pub fn new(id: ConnectionId, outbox: Outbox) -> Self {
        Self {
            id,
            outbox,
            state: ConnectionState::Unauthenticated,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ConnectionState::Closed)
    }

    pub(crate) fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    pub(super) fn set_joined(&mut self, space_id: SpaceId, session_id: SessionId) {
        self.state = ConnectionState::Joined {
            space_id,
            session_id,
        };
    }

    /// Move to `Closed`, returning the previous state.
    pub(super) fn close(&mut self) -> ConnectionState {
        std::mem::replace(&mut self.state, ConnectionState::Closed)
    }

    /// Enqueue a direct reply. Never blocks; a full queue drops the reply.
    pub fn reply(&self, message: ServerMessage) {
        match self.outbox.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => tracing::warn!(
                connection_id = %self.id,
                event = msg.kind(),
                "Outbound queue full, reply dropped"
            ),
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
