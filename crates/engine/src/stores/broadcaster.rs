//! Fan-out of server events to the sessions of one space.
//!
//! Delivery takes a `&SpaceState`, which is only reachable through the space
//! lock, so every event for a space is enqueued in the order the lock was
//! taken. Enqueueing never blocks: a full or closed outbox loses this event
//! and nothing else.

use tokio::sync::mpsc::error::TrySendError;

use metaverse_domain::{SessionId, SpaceId};
use metaverse_shared::ServerMessage;

use super::space_registry::{SpaceGuard, SpaceRegistry, SpaceState};

/// Who receives an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    All,
    AllExcept(SessionId),
    Only(SessionId),
}

impl Audience {
    fn includes(&self, session_id: SessionId) -> bool {
        match self {
            Self::All => true,
            Self::AllExcept(excluded) => *excluded != session_id,
            Self::Only(target) => *target == session_id,
        }
    }
}

/// Outcome of one delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Enqueue `message` for every session of `space` in `audience`.
pub fn deliver(space: &SpaceState, audience: Audience, message: &ServerMessage) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for (session_id, outbox) in space.outboxes() {
        if !audience.includes(session_id) {
            continue;
        }
        match outbox.try_send(message.clone()) {
            Ok(()) => report.delivered += 1,
            Err(TrySendError::Full(_)) => {
                report.dropped += 1;
                tracing::warn!(
                    space_id = %space.space_id(),
                    session_id = %session_id,
                    event = message.kind(),
                    "Outbound queue full, event dropped for session"
                );
            }
            Err(TrySendError::Closed(_)) => {
                report.dropped += 1;
                tracing::debug!(
                    space_id = %space.space_id(),
                    session_id = %session_id,
                    event = message.kind(),
                    "Outbound queue closed, event dropped for session"
                );
            }
        }
    }
    report
}

impl SpaceRegistry {
    /// Lock `space_id` and broadcast to everyone except `exclude`.
    ///
    /// Returns `None` if the space is not active.
    pub async fn broadcast(
        &self,
        space_id: &SpaceId,
        message: &ServerMessage,
        exclude: Option<SessionId>,
    ) -> Option<DeliveryReport> {
        let space: SpaceGuard = self.lock_space(space_id).await?;
        let audience = exclude.map_or(Audience::All, Audience::AllExcept);
        Some(deliver(&space, audience, message))
    }
}
