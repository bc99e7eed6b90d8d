//! Space metadata adapters.
//!
//! - `HttpSpaceMetadataStore` - the space API (`GET /api/v1/space/{id}`)
//! - `StaticSpaceStore` - a fixed set of layouts, optionally loaded from JSON

mod http_store;
mod static_store;

pub use http_store::{HttpSpaceMetadataStore, HttpStoreError};
pub use static_store::{SpaceDefinition, StaticSpaceStore};
