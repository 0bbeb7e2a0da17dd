//! Request timeouts.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;

use crate::AppState;

/// Effective timeout when the timeout middleware is disabled.
const DISABLED_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Middleware failing requests that outlive the configured timeout with 408.
pub async fn timeout_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let resilience = &state.config.resilience;
    let duration = if resilience.timeout_disabled {
        DISABLED_TIMEOUT
    } else {
        Duration::from_secs(resilience.timeout_secs)
    };
    let path = req.uri().path().to_string();

    match tokio::time::timeout(duration, next.run(req)).await {
        Ok(res) => res,
        Err(_) => {
            tracing::warn!(
                name: "request.timed_out",
                path = %path,
                timeout_secs = duration.as_secs(),
                "Request timed out"
            );
            (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
        }
    }
}
