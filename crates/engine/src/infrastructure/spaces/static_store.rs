//! Fixed space layouts held in memory.
//!
//! Layout file format:
//!
//! ```json
//! {
//!   "spaces": [
//!     {
//!       "id": "lobby",
//!       "dimensions": "100x200",
//!       "spawn": { "x": 0, "y": 0 },
//!       "elements": [{ "x": 20, "y": 20, "width": 1, "height": 1 }]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use metaverse_domain::{Dimensions, ElementFootprint, Position, SpaceGeometry, SpaceId};
use metaverse_shared::{ElementData, PositionData};

use crate::infrastructure::ports::{MetadataError, SpaceMetadataStore};

/// One space as written in a layout file. Every element blocks movement.
#[derive(Debug, Clone, Deserialize)]
pub struct SpaceDefinition {
    pub id: String,
    pub dimensions: String,
    #[serde(default)]
    pub spawn: Option<PositionData>,
    #[serde(default)]
    pub elements: Vec<ElementData>,
}

impl SpaceDefinition {
    fn into_entry(self) -> Result<(SpaceId, SpaceGeometry), MetadataError> {
        let space_id = SpaceId::new(self.id).map_err(MetadataError::invalid)?;
        let invalid = |e: metaverse_domain::DomainError| {
            MetadataError::invalid(format!("space {}: {}", space_id, e))
        };

        let dimensions: Dimensions = self.dimensions.parse().map_err(invalid)?;
        let elements = self
            .elements
            .iter()
            .map(|e| ElementFootprint::new(e.x, e.y, e.width, e.height))
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
        let mut geometry = SpaceGeometry::new(dimensions, elements).map_err(invalid)?;
        if let Some(spawn) = self.spawn {
            geometry = geometry
                .with_spawn(Position::new(spawn.x, spawn.y))
                .map_err(invalid)?;
        }
        Ok((space_id, geometry))
    }
}

#[derive(Debug, Deserialize)]
struct LayoutFile {
    spaces: Vec<SpaceDefinition>,
}

/// Serves layouts from a map built once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticSpaceStore {
    spaces: HashMap<SpaceId, SpaceGeometry>,
}

impl StaticSpaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_space(mut self, space_id: SpaceId, geometry: SpaceGeometry) -> Self {
        self.spaces.insert(space_id, geometry);
        self
    }

    pub fn from_definitions(
        definitions: impl IntoIterator<Item = SpaceDefinition>,
    ) -> Result<Self, MetadataError> {
        let mut spaces = HashMap::new();
        for definition in definitions {
            let (space_id, geometry) = definition.into_entry()?;
            if spaces.insert(space_id.clone(), geometry).is_some() {
                return Err(MetadataError::invalid(format!(
                    "space {} defined twice",
                    space_id
                )));
            }
        }
        Ok(Self { spaces })
    }

    /// Load and validate every layout in a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MetadataError::unavailable(format!("reading {}: {}", path.display(), e))
        })?;
        let file: LayoutFile = serde_json::from_str(&raw).map_err(|e| {
            MetadataError::invalid(format!("parsing {}: {}", path.display(), e))
        })?;
        let store = Self::from_definitions(file.spaces)?;
        tracing::info!(
            path = %path.display(),
            spaces = store.len(),
            "Loaded space layouts"
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}

#[async_trait]
impl SpaceMetadataStore for StaticSpaceStore {
    async fn get_space_geometry(&self, space_id: &SpaceId) -> Result<SpaceGeometry, MetadataError> {
        self.spaces
            .get(space_id)
            .cloned()
            .ok_or_else(|| MetadataError::not_found(space_id))
    }
}
