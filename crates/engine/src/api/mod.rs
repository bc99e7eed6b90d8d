//! API layer - HTTP and WebSocket entry points.

pub mod http;
pub mod websocket;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::app::App;
use websocket::WsState;

/// HTTP routes plus the WebSocket endpoint on `/` and `/ws`.
pub fn router(app: Arc<App>) -> Router {
    let ws_state = Arc::new(WsState {
        coordinator: app.coordinator.clone(),
        outbound_buffer: app.outbound_buffer,
    });

    http::routes()
        .with_state(app)
        .route("/", get(websocket::ws_handler).with_state(ws_state.clone()))
        .route("/ws", get(websocket::ws_handler).with_state(ws_state))
}
