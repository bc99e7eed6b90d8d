//! Error types for port operations.

/// Identity verification failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentityError {
    /// Token was malformed, unsigned, or carried no usable identity.
    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token expired")]
    Expired,

    /// The verifier itself could not answer.
    #[error("Identity verifier unavailable: {0}")]
    Unavailable(String),
}

impl IdentityError {
    /// Rejections are the client's fault; unavailability is ours.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Invalid(_) | Self::Expired)
    }
}

/// Space metadata lookup failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetadataError {
    #[error("Space not found: {0}")]
    NotFound(String),

    /// The store answered but the geometry could not be used.
    #[error("Invalid space metadata: {0}")]
    Invalid(String),

    #[error("Space metadata unavailable: {0}")]
    Unavailable(String),
}

impl MetadataError {
    pub fn not_found(space_id: impl ToString) -> Self {
        Self::NotFound(space_id.to_string())
    }

    pub fn invalid(message: impl ToString) -> Self {
        Self::Invalid(message.to_string())
    }

    pub fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
