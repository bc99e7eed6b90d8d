//! Application state and composition.

use std::sync::Arc;

use anyhow::Context;
use metaverse_domain::MovementRules;

use crate::infrastructure::{
    config::{EngineConfig, SpaceSource},
    identity::JwtIdentityVerifier,
    ports::{IdentityVerifier, SpaceMetadataStore},
    spaces::{HttpSpaceMetadataStore, StaticSpaceStore},
};
use crate::stores::SpaceRegistry;
use crate::use_cases::coordinator::Coordinator;

/// Main application state.
///
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub registry: Arc<SpaceRegistry>,
    pub coordinator: Arc<Coordinator>,
    pub outbound_buffer: usize,
}

impl App {
    pub fn new(
        registry: Arc<SpaceRegistry>,
        identity: Arc<dyn IdentityVerifier>,
        spaces: Arc<dyn SpaceMetadataStore>,
        rules: MovementRules,
        outbound_buffer: usize,
    ) -> Self {
        let coordinator = Arc::new(Coordinator::new(
            registry.clone(),
            identity,
            spaces,
            rules,
        ));
        Self {
            registry,
            coordinator,
            outbound_buffer,
        }
    }

    /// Wire up the concrete adapters named by `config`.
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let identity: Arc<dyn IdentityVerifier> =
            Arc::new(JwtIdentityVerifier::new(config.jwt_secret.as_bytes()));

        let spaces: Arc<dyn SpaceMetadataStore> = match &config.space_source {
            SpaceSource::Api { url, token } => {
                tracing::info!(url = %url, "Using space API for layouts");
                Arc::new(
                    HttpSpaceMetadataStore::new(url, token.clone())
                        .context("building space API client")?,
                )
            }
            SpaceSource::File(path) => Arc::new(
                StaticSpaceStore::from_file(path)
                    .with_context(|| format!("loading {}", path.display()))?,
            ),
        };

        Ok(Self::new(
            Arc::new(SpaceRegistry::new(config.empty_space_policy)),
            identity,
            spaces,
            config.movement,
            config.outbound_buffer,
        ))
    }
}
