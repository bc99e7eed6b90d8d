//! Validated string newtypes for externally-issued identifiers
//!
//! Space ids come from the metadata store and identities from the token
//! verifier. Both are opaque to the coordinator, so the only rules are:
//! - Non-empty after trimming
//! - Within a length limit
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for externally-issued identifiers
const MAX_ID_LENGTH: usize = 128;

fn validate(kind: &str, value: String) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} cannot be empty", kind)));
    }
    if trimmed.len() > MAX_ID_LENGTH {
        return Err(DomainError::validation(format!(
            "{} cannot exceed {} characters",
            kind, MAX_ID_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// SpaceId
// ============================================================================

/// Identifier of a space as issued by the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpaceId(String);

impl SpaceId {
    /// Create a new validated space id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the id is empty or longer than
    /// 128 characters after trimming.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        validate("Space id", id.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SpaceId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SpaceId> for String {
    fn from(id: SpaceId) -> Self {
        id.0
    }
}

// ============================================================================
// Identity
// ============================================================================

/// A verified participant identity (the user id carried by the token).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create a new validated identity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the identity is empty or longer
    /// than 128 characters after trimming.
    pub fn new(identity: impl Into<String>) -> Result<Self, DomainError> {
        validate("Identity", identity.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}
