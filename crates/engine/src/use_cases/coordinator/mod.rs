//! Space session coordinator.
//!
//! Drives each connection through `Unauthenticated -> Joined -> Closed` and
//! applies join, move, leave and disconnect to the space registry. All
//! mutations and broadcasts for a space happen under that space's lock.

mod connection;
mod error;
mod events;

use std::sync::Arc;

use metaverse_domain::{
    validate_move, Destination, MoveDecision, MovementRules, Session, SessionId, SpaceId,
};
use metaverse_shared::ClientMessage;

use crate::infrastructure::ports::{IdentityVerifier, SpaceMetadataStore};
use crate::stores::{deliver, Audience, SpaceRegistry};

pub use connection::{Connection, ConnectionState};
pub use error::CoordinatorError;

pub struct Coordinator {
    registry: Arc<SpaceRegistry>,
    identity: Arc<dyn IdentityVerifier>,
    spaces: Arc<dyn SpaceMetadataStore>,
    rules: MovementRules,
}

impl Coordinator {
    pub fn new(
        registry: Arc<SpaceRegistry>,
        identity: Arc<dyn IdentityVerifier>,
        spaces: Arc<dyn SpaceMetadataStore>,
        rules: MovementRules,
    ) -> Self {
        Self {
            registry,
            identity,
            spaces,
            rules,
        }
    }

    pub fn registry(&self) -> &Arc<SpaceRegistry> {
        &self.registry
    }

    /// Apply one client message to `conn`.
    ///
    /// Replies and broadcasts that succeed are enqueued on the relevant
    /// outboxes. Failures are returned for the caller to report.
    pub async fn handle(
        &self,
        conn: &mut Connection,
        message: ClientMessage,
    ) -> Result<(), CoordinatorError> {
        admit(conn.state(), &message)?;
        match message {
            ClientMessage::Join { space_id, token } => self.join(conn, &space_id, &token).await,
            ClientMessage::Move { x, y } => self.move_to(conn, Destination::new(x, y)).await,
            ClientMessage::Leave {} => self.leave(conn).await,
        }
    }

    /// Transport went away. Removes the session if there is one; a no-op
    /// once the connection is closed.
    pub async fn disconnect(&self, conn: &mut Connection) {
        if let ConnectionState::Joined {
            space_id,
            session_id,
        } = conn.close()
        {
            if let Err(e) = self.remove_session(&space_id, session_id).await {
                tracing::error!(
                    connection_id = %conn.id(),
                    space_id = %space_id,
                    session_id = %session_id,
                    error = %e,
                    "Failed to remove session on disconnect"
                );
            }
        }
    }

    async fn join(
        &self,
        conn: &mut Connection,
        space_id: &str,
        token: &str,
    ) -> Result<(), CoordinatorError> {
        let space_id = SpaceId::new(space_id)
            .map_err(|e| CoordinatorError::protocol(format!("invalid spaceId: {}", e)))?;

        let identity = self.identity.verify(token).await.map_err(|e| {
            tracing::info!(connection_id = %conn.id(), error = %e, "Join rejected: bad token");
            CoordinatorError::from(e)
        })?;
        let geometry = self.spaces.get_space_geometry(&space_id).await?;

        let mut space = self.registry.open_space(&space_id, geometry).await;
        space.ensure_healthy()?;

        let Some(spawn) = space.spawn_cell() else {
            self.registry.release_if_empty(&mut space);
            return Err(CoordinatorError::SpaceFull(space_id));
        };

        let session = Session::new(conn.id(), identity, space_id.clone(), spawn);
        let occupants = space.list_sessions();
        space.register_session(session.clone(), conn.outbox())?;

        deliver(
            &space,
            Audience::Only(session.id()),
            &events::space_joined(&session, space.geometry(), &occupants),
        );
        let report = deliver(
            &space,
            Audience::AllExcept(session.id()),
            &events::user_joined(&session),
        );

        conn.set_joined(space_id.clone(), session.id());
        tracing::info!(
            connection_id = %conn.id(),
            space_id = %space_id,
            session_id = %session.id(),
            identity = %session.identity(),
            spawn = %spawn,
            notified = report.delivered,
            "Session joined space"
        );
        Ok(())
    }

    async fn move_to(&self, conn: &mut Connection, destination: Destination) -> Result<(), CoordinatorError> {
        let (space_id, session_id) = joined(conn)?;
        let mut space = self
            .registry
            .lock_space(&space_id)
            .await
            .ok_or_else(|| CoordinatorError::internal(format!("space {} is not active", space_id)))?;
        space.ensure_healthy()?;

        let current = space
            .session(session_id)
            .map(Session::position)
            .ok_or_else(|| {
                CoordinatorError::internal(format!("session {} missing from space", session_id))
            })?;

        match validate_move(space.geometry(), &*space, self.rules, session_id, current, destination) {
            MoveDecision::Accept => {
                let proposed = destination.cell().ok_or_else(|| {
                    CoordinatorError::internal(format!("accepted move to {} is not a cell", destination))
                })?;
                space.relocate(session_id, proposed)?;
                if let Some(session) = space.session(session_id) {
                    let event = events::movement(session);
                    deliver(&space, Audience::AllExcept(session_id), &event);
                }
                tracing::debug!(
                    space_id = %space_id,
                    session_id = %session_id,
                    from = %current,
                    to = %proposed,
                    "Move accepted"
                );
                Ok(())
            }
            MoveDecision::Reject(reason) => {
                tracing::debug!(
                    space_id = %space_id,
                    session_id = %session_id,
                    from = %current,
                    to = %destination,
                    reason = %reason,
                    "Move rejected"
                );
                Err(CoordinatorError::Validation {
                    reason,
                    position: current,
                })
            }
        }
    }

    async fn leave(&self, conn: &mut Connection) -> Result<(), CoordinatorError> {
        let (space_id, session_id) = joined(conn)?;
        conn.close();
        self.remove_session(&space_id, session_id).await
    }

    async fn remove_session(
        &self,
        space_id: &SpaceId,
        session_id: SessionId,
    ) -> Result<(), CoordinatorError> {
        let mut space = self.registry.lock_space(space_id).await.ok_or_else(|| {
            CoordinatorError::internal(format!("space {} is not active", space_id))
        })?;
        let session = space.unregister_session(session_id)?;
        deliver(&space, Audience::All, &events::user_left(&session));
        self.registry.release_if_empty(&mut space);

        tracing::info!(
            space_id = %space_id,
            session_id = %session_id,
            identity = %session.identity(),
            remaining = space.len(),
            "Session left space"
        );
        Ok(())
    }
}

/// Reject messages that are illegal in the connection's current state.
fn admit(state: &ConnectionState, message: &ClientMessage) -> Result<(), CoordinatorError> {
    match (state, message) {
        (ConnectionState::Closed, _) => Err(CoordinatorError::protocol("connection is closed")),
        (ConnectionState::Joined { .. }, ClientMessage::Join { .. }) => {
            Err(CoordinatorError::AlreadyJoined)
        }
        (ConnectionState::Unauthenticated, ClientMessage::Join { .. })
        | (ConnectionState::Joined { .. }, _) => Ok(()),
        (ConnectionState::Unauthenticated, other) => Err(CoordinatorError::protocol(format!(
            "'{}' requires joining a space first",
            other.kind()
        ))),
    }
}

fn joined(conn: &Connection) -> Result<(SpaceId, SessionId), CoordinatorError> {
    match conn.state() {
        ConnectionState::Joined {
            space_id,
            session_id,
        } => Ok((space_id.clone(), *session_id)),
        _ => Err(CoordinatorError::protocol("not joined to a space")),
    }
}
