//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Identity verification (could swap JWT -> an external auth service)
//! - Space metadata (could swap the space API -> a static file)

mod error;
mod external;

pub use error::{IdentityError, MetadataError};
pub use external::{IdentityVerifier, SpaceMetadataStore};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockIdentityVerifier, MockSpaceMetadataStore};
