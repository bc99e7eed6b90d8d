//! Coordinator error classification.

use metaverse_domain::{MoveRejection, Position, SpaceId};
use metaverse_shared::ErrorCode;

use crate::infrastructure::ports::{IdentityError, MetadataError};
use crate::stores::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Space not found: {0}")]
    NotFound(String),
    #[error("Connection already joined a space")]
    AlreadyJoined,
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// Move refused. `position` is the sender's unchanged cell.
    #[error("Move rejected: {reason}")]
    Validation {
        reason: MoveRejection,
        position: Position,
    },
    #[error("Space {0} has no free cell")]
    SpaceFull(SpaceId),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn internal(message: impl ToString) -> Self {
        Self::Internal(message.to_string())
    }

    /// Wire code for an `error` reply. `Validation` is reported as
    /// `movement-rejected` instead and has no code.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Auth(_) => Some(ErrorCode::AuthError),
            Self::NotFound(_) => Some(ErrorCode::NotFound),
            Self::AlreadyJoined => Some(ErrorCode::AlreadyJoined),
            Self::Protocol(_) => Some(ErrorCode::ProtocolError),
            Self::SpaceFull(_) => Some(ErrorCode::SpaceFull),
            Self::Internal(_) => Some(ErrorCode::InternalError),
            Self::Validation { .. } => None,
        }
    }

    /// Fatal errors end the connection after the reply is sent.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<IdentityError> for CoordinatorError {
    fn from(err: IdentityError) -> Self {
        if err.is_rejection() {
            Self::Auth(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<MetadataError> for CoordinatorError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(id) => Self::NotFound(id),
            MetadataError::Invalid(_) | MetadataError::Unavailable(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<RegistryError> for CoordinatorError {
    fn from(err: RegistryError) -> Self {
        Self::Internal(err.to_string())
    }
}
