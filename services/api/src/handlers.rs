//! Axum Handlers for the REST API
//!
//! The REST surface is the lesson catalog: what the session picker shows
//! before a WebSocket session begins.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use aula_core::script::{LessonScript, ScriptError, ScriptStore};
use std::sync::Arc;
use tracing::error;

use crate::{
    models::{ErrorResponse, LessonSummary},
    state::AppState,
};

pub enum ApiError {
    NotFound(String),
    UnprocessableEntity(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::UnprocessableEntity(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse { message }),
            )
                .into_response(),
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl From<ScriptError> for ApiError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::NotFound(_) => Self::NotFound(err.to_string()),
            ScriptError::Parse { .. } => Self::UnprocessableEntity(err.to_string()),
            ScriptError::Unreadable { .. } => Self::InternalServerError(err.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalServerError(err)
    }
}

/// List the lessons available in the store.
pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = state.scripts.list().await?;

    let mut lessons = Vec::with_capacity(ids.len());
    for id in ids {
        match state.scripts.load(&id).await {
            Ok(script) => lessons.push(LessonSummary {
                id,
                title: script.title,
            }),
            // A malformed document hides one lesson, not the whole catalog.
            Err(e) => error!(lesson_id = %id, error = %e, "skipping unloadable lesson"),
        }
    }

    Ok(Json(lessons))
}

/// Fetch one full lesson document for pre-session display.
pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LessonScript>, ApiError> {
    let script = state.scripts.load(&id).await?;
    Ok(Json(script))
}
