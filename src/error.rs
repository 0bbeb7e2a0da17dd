//! Service error type and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::scenario::ScenarioError;

/// Errors surfaced by session operations and HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No live session has this identifier.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A scenario document was requested directly and does not exist.
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    /// A scenario document the operation depends on could not be loaded.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// Result alias for session operations.
pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::SessionNotFound(_) | AppError::ScenarioNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Scenario(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::SessionNotFound(_) => "Session not found.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(name: "request.failed", error = %self, status = %status, "Request failed");
        } else {
            tracing::warn!(name: "request.rejected", error = %self, status = %status, "Request rejected");
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
