//! Space registry - live sessions per space.
//!
//! Each space is its own serialization point: a `tokio::sync::Mutex` around
//! [`SpaceState`], stored in a sharded `DashMap`. Join, move and leave for one
//! space take that space's lock; different spaces never share a lock.
//!
//! Broadcasts are delivered while the lock is held (see
//! [`super::broadcaster`]), which is what gives every observer the same
//! per-space order of events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};

use metaverse_domain::{OccupancyView, Position, Session, SessionId, SpaceGeometry, SpaceId};
use metaverse_shared::ServerMessage;

/// Sending half of a connection's bounded outbound queue.
pub type Outbox = mpsc::Sender<ServerMessage>;

/// What happens to a space entry once its last session leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySpacePolicy {
    /// Drop the entry immediately.
    Evict,
    /// Keep the entry until `sweep_expired` finds it empty for longer than `ttl`.
    Retain { ttl: Duration },
}

/// Errors raised by registry operations.
///
/// Everything except `SessionNotFound` indicates a broken invariant.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Session {0} is not registered in this space")]
    SessionNotFound(SessionId),
    #[error("Session {0} is already registered")]
    DuplicateSession(SessionId),
    #[error("Session belongs to space {actual}, not {expected}")]
    WrongSpace { expected: SpaceId, actual: SpaceId },
    #[error("Cell {0} is out of bounds, blocked, or occupied")]
    CellUnavailable(Position),
    #[error("Occupancy index inconsistent in space {space_id}: {detail}")]
    Inconsistent { space_id: SpaceId, detail: String },
    #[error("Space {0} is poisoned by an earlier consistency failure")]
    Poisoned(SpaceId),
}

#[derive(Debug)]
struct SessionEntry {
    session: Session,
    outbox: Outbox,
    joined_seq: u64,
}

/// Mutable state of one space. Only reachable through its lock.
#[derive(Debug)]
pub struct SpaceState {
    space_id: SpaceId,
    geometry: Arc<SpaceGeometry>,
    sessions: HashMap<SessionId, SessionEntry>,
    occupancy: HashMap<Position, SessionId>,
    next_seq: u64,
    emptied_at: Option<Instant>,
    evicted: bool,
    poisoned: bool,
}

impl SpaceState {
    fn new(space_id: SpaceId, geometry: Arc<SpaceGeometry>) -> Self {
        Self {
            space_id,
            geometry,
            sessions: HashMap::new(),
            occupancy: HashMap::new(),
            next_seq: 0,
            emptied_at: Some(Instant::now()),
            evicted: false,
            poisoned: false,
        }
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    pub fn geometry(&self) -> &SpaceGeometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Fails once the space has been poisoned.
    pub fn ensure_healthy(&self) -> Result<(), RegistryError> {
        if self.poisoned {
            return Err(RegistryError::Poisoned(self.space_id.clone()));
        }
        Ok(())
    }

    pub fn session(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id).map(|entry| &entry.session)
    }

    pub fn occupied_at(&self, position: Position) -> Option<SessionId> {
        self.occupancy.get(&position).copied()
    }

    /// Snapshot of every session, in join order.
    pub fn list_sessions(&self) -> Vec<Session> {
        let mut entries: Vec<&SessionEntry> = self.sessions.values().collect();
        entries.sort_by_key(|entry| entry.joined_seq);
        entries.into_iter().map(|entry| entry.session.clone()).collect()
    }

    /// Where the next joiner would spawn, if anywhere.
    pub fn spawn_cell(&self) -> Option<Position> {
        self.geometry
            .first_free_cell(|cell| self.occupancy.contains_key(&cell))
    }

    /// Outboxes of every session, for the broadcaster.
    pub(crate) fn outboxes(&self) -> impl Iterator<Item = (SessionId, &Outbox)> {
        self.sessions.iter().map(|(id, entry)| (*id, &entry.outbox))
    }

    pub fn register_session(&mut self, session: Session, outbox: Outbox) -> Result<(), RegistryError> {
        self.ensure_healthy()?;
        if session.space_id() != &self.space_id {
            return Err(RegistryError::WrongSpace {
                expected: self.space_id.clone(),
                actual: session.space_id().clone(),
            });
        }
        if self.sessions.contains_key(&session.id()) {
            return Err(RegistryError::DuplicateSession(session.id()));
        }
        let position = session.position();
        if !self.geometry.in_bounds(position)
            || self.geometry.is_blocked(position)
            || self.occupancy.contains_key(&position)
        {
            return Err(RegistryError::CellUnavailable(position));
        }

        let joined_seq = self.next_seq;
        self.next_seq += 1;
        self.occupancy.insert(position, session.id());
        self.sessions.insert(
            session.id(),
            SessionEntry {
                session,
                outbox,
                joined_seq,
            },
        );
        self.emptied_at = None;
        Ok(())
    }

    pub fn unregister_session(&mut self, session_id: SessionId) -> Result<Session, RegistryError> {
        self.ensure_healthy()?;
        let entry = self
            .sessions
            .remove(&session_id)
            .ok_or(RegistryError::SessionNotFound(session_id))?;
        let position = entry.session.position();
        match self.occupancy.remove(&position) {
            Some(occupant) if occupant == session_id => {}
            other => {
                return Err(self.poison(format!(
                    "session {} left {} but the index held {:?}",
                    session_id, position, other
                )))
            }
        }
        if self.sessions.is_empty() {
            self.emptied_at = Some(Instant::now());
        }
        Ok(entry.session)
    }

    /// Move a session. The caller has already validated the destination.
    pub fn relocate(&mut self, session_id: SessionId, to: Position) -> Result<(), RegistryError> {
        self.ensure_healthy()?;
        let from = self
            .sessions
            .get(&session_id)
            .map(|entry| entry.session.position())
            .ok_or(RegistryError::SessionNotFound(session_id))?;
        if from == to {
            return Ok(());
        }
        if self.occupancy.contains_key(&to) {
            return Err(RegistryError::CellUnavailable(to));
        }
        if self.occupancy.remove(&from) != Some(session_id) {
            return Err(self.poison(format!(
                "session {} at {} missing from the index",
                session_id, from
            )));
        }
        self.occupancy.insert(to, session_id);
        if let Some(entry) = self.sessions.get_mut(&session_id) {
            entry.session.relocate(to);
        }
        Ok(())
    }

    fn poison(&mut self, detail: String) -> RegistryError {
        self.poisoned = true;
        tracing::error!(
            space_id = %self.space_id,
            detail = %detail,
            "Space registry invariant broken, space poisoned"
        );
        RegistryError::Inconsistent {
            space_id: self.space_id.clone(),
            detail,
        }
    }

    /// Drop the occupancy slot without touching the session set.
    #[cfg(test)]
    pub(crate) fn corrupt_occupancy_for_test(&mut self, position: Position) {
        self.occupancy.remove(&position);
    }
}

impl OccupancyView for SpaceState {
    fn occupant_at(&self, position: Position) -> Option<SessionId> {
        self.occupied_at(position)
    }
}

/// Locked access to one space.
pub type SpaceGuard = OwnedMutexGuard<SpaceState>;

/// All active spaces.
pub struct SpaceRegistry {
    spaces: DashMap<SpaceId, Arc<Mutex<SpaceState>>>,
    policy: EmptySpacePolicy,
}

impl SpaceRegistry {
    pub fn new(policy: EmptySpacePolicy) -> Self {
        Self {
            spaces: DashMap::new(),
            policy,
        }
    }

    /// Lock a space, creating the entry from `geometry` if it does not exist.
    ///
    /// An existing entry keeps its original geometry. If the handle we raced
    /// for was evicted before we got the lock, retry against a fresh entry.
    pub async fn open_space(&self, space_id: &SpaceId, geometry: SpaceGeometry) -> SpaceGuard {
        let geometry = Arc::new(geometry);
        loop {
            let handle = self
                .spaces
                .entry(space_id.clone())
                .or_insert_with(|| {
                    tracing::info!(space_id = %space_id, "Space opened");
                    Arc::new(Mutex::new(SpaceState::new(space_id.clone(), geometry.clone())))
                })
                .clone();
            let guard = handle.lock_owned().await;
            if !guard.evicted {
                return guard;
            }
        }
    }

    /// Lock an existing space. `None` if it is not active.
    pub async fn lock_space(&self, space_id: &SpaceId) -> Option<SpaceGuard> {
        let handle = self.spaces.get(space_id).map(|entry| entry.value().clone())?;
        let guard = handle.lock_owned().await;
        (!guard.evicted).then_some(guard)
    }

    /// Apply the empty-space policy after a session left.
    pub fn release_if_empty(&self, space: &mut SpaceState) {
        if !space.is_empty() || space.evicted {
            return;
        }
        match self.policy {
            EmptySpacePolicy::Evict => self.evict(space),
            EmptySpacePolicy::Retain { .. } => {
                tracing::debug!(space_id = %space.space_id, "Space empty, retained");
            }
        }
    }

    /// Evict every retained space that has been empty for at least the TTL.
    /// Returns the number of spaces evicted.
    pub async fn sweep_expired(&self, now: Instant) -> usize {
        let EmptySpacePolicy::Retain { ttl } = self.policy else {
            return 0;
        };
        let handles: Vec<Arc<Mutex<SpaceState>>> =
            self.spaces.iter().map(|entry| entry.value().clone()).collect();

        let mut evicted = 0;
        for handle in handles {
            let mut space = handle.lock().await;
            let expired = space
                .emptied_at
                .is_some_and(|since| now.saturating_duration_since(since) >= ttl);
            if !space.evicted && space.is_empty() && expired {
                self.evict(&mut space);
                evicted += 1;
            }
        }
        evicted
    }

    /// Caller holds the space's lock, so the map entry is this handle.
    fn evict(&self, space: &mut SpaceState) {
        space.evicted = true;
        self.spaces.remove(&space.space_id);
        tracing::info!(space_id = %space.space_id, "Space evicted");
    }

    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    pub async fn session_count(&self) -> usize {
        let handles: Vec<Arc<Mutex<SpaceState>>> =
            self.spaces.iter().map(|entry| entry.value().clone()).collect();
        let mut total = 0;
        for handle in handles {
            total += handle.lock().await.len();
        }
        total
    }

    /// Consistent snapshot of one space's sessions, in join order.
    pub async fn list_sessions(&self, space_id: &SpaceId) -> Vec<Session> {
        match self.lock_space(space_id).await {
            Some(space) => space.list_sessions(),
            None => Vec::new(),
        }
    }

    pub async fn occupied_at(&self, space_id: &SpaceId, position: Position) -> Option<SessionId> {
        self.lock_space(space_id).await?.occupied_at(position)
    }
}

impl Default for SpaceRegistry {
    fn default() -> Self {
        Self::new(EmptySpacePolicy::Evict)
    }
}
