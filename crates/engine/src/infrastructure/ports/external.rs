//! External collaborator port traits (identity, space metadata).

use async_trait::async_trait;

use metaverse_domain::{Identity, SpaceGeometry, SpaceId};

use super::error::{IdentityError, MetadataError};

/// Turns a client-supplied token into a verified identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Looks up the static layout of a space.
///
/// Called once per join; callers do not cache the result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpaceMetadataStore: Send + Sync {
    async fn get_space_geometry(&self, space_id: &SpaceId) -> Result<SpaceGeometry, MetadataError>;
}
