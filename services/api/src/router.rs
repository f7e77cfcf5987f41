//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application:
//! the lesson catalog REST endpoints and the WebSocket session endpoint.

use crate::{handlers, state::AppState, ws::ws_handler};

use axum::{Router, routing::get};
use std::sync::Arc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lessons", get(handlers::list_lessons))
        .route("/lessons/{id}", get(handlers::get_lesson))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}
