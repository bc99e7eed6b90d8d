//! Space API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use metaverse_domain::{Dimensions, ElementFootprint, SpaceGeometry, SpaceId};

use crate::infrastructure::ports::{MetadataError, SpaceMetadataStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// `GET {base_url}/api/v1/space/{id}` response body.
#[derive(Debug, Deserialize)]
struct SpaceResponse {
    /// `"WIDTHxHEIGHT"`
    dimensions: String,
    #[serde(default)]
    elements: Vec<PlacedElement>,
}

#[derive(Debug, Deserialize)]
struct PlacedElement {
    element: ElementBody,
    x: i32,
    y: i32,
}

#[derive(Debug, Deserialize)]
struct ElementBody {
    width: u32,
    height: u32,
    #[serde(default, rename = "static")]
    is_static: bool,
}

impl SpaceResponse {
    /// Only static elements block movement.
    fn into_geometry(self) -> Result<SpaceGeometry, MetadataError> {
        let dimensions: Dimensions = self.dimensions.parse().map_err(MetadataError::invalid)?;
        let footprints = self
            .elements
            .into_iter()
            .filter(|placed| placed.element.is_static)
            .map(|placed| {
                ElementFootprint::new(
                    placed.x,
                    placed.y,
                    placed.element.width,
                    placed.element.height,
                )
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(MetadataError::invalid)?;
        SpaceGeometry::new(dimensions, footprints).map_err(MetadataError::invalid)
    }
}

/// Reads space layouts from the space API.
#[derive(Debug, Clone)]
pub struct HttpSpaceMetadataStore {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum HttpStoreError {
    #[error("invalid space API URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

impl HttpSpaceMetadataStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, HttpStoreError> {
        let invalid = |reason: String| HttpStoreError::BaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let base_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("cannot carry a path".to_string()));
        }
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// The id becomes a single percent-encoded path segment. Ids that would
    /// still walk the path are treated as unknown spaces.
    fn space_url(&self, space_id: &SpaceId) -> Result<Url, MetadataError> {
        let id = space_id.as_str();
        if id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(MetadataError::not_found(space_id));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MetadataError::unavailable("space API URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["api", "v1", "space", id]);
        Ok(url)
    }
}

#[async_trait]
impl SpaceMetadataStore for HttpSpaceMetadataStore {
    async fn get_space_geometry(&self, space_id: &SpaceId) -> Result<SpaceGeometry, MetadataError> {
        let mut request = self.client.get(self.space_url(space_id)?);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(space_id = %space_id, error = %e, "Space API request failed");
            MetadataError::unavailable(e)
        })?;

        match response.status() {
            // The space API answers 400 for ids it cannot parse.
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                return Err(MetadataError::not_found(space_id))
            }
            status if !status.is_success() => {
                return Err(MetadataError::unavailable(format!(
                    "space API returned {}",
                    status
                )))
            }
            _ => {}
        }

        let body: SpaceResponse = response.json().await.map_err(MetadataError::invalid)?;
        let geometry = body.into_geometry()?;
        tracing::debug!(
            space_id = %space_id,
            dimensions = %geometry.dimensions(),
            elements = geometry.elements().len(),
            "Fetched space geometry"
        );
        Ok(geometry)
    }
}
