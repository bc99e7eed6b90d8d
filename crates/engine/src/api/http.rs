//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use metaverse_domain::SpaceId;
use metaverse_shared::OccupantData;

use crate::app::App;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/spaces/{id}/sessions", get(list_sessions))
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Stats {
    spaces: usize,
    sessions: usize,
}

async fn stats(State(app): State<Arc<App>>) -> Json<Stats> {
    Json(Stats {
        spaces: app.registry.space_count(),
        sessions: app.registry.session_count().await,
    })
}

async fn list_sessions(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OccupantData>>, ApiError> {
    let space_id = SpaceId::new(id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let space = app
        .registry
        .lock_space(&space_id)
        .await
        .ok_or(ApiError::NotFound)?;
    let sessions = space.list_sessions();
    Ok(Json(sessions.iter().map(OccupantData::from).collect()))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
        }
    }
}
