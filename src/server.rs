//! HTTP surface: router, request bodies, handlers and startup.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tracing::{info, warn};

use crate::AppState;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::resilience::timeout_middleware;
use crate::scenario::{ScenarioDocument, ScenarioError, ScenarioKind, ScenarioLoader, ScenarioSource};
use crate::session::{HistoryEntry, SessionView};

/// Build application state reading scenarios from the configured directory.
pub fn build_state(config: Arc<AppConfig>) -> AppState {
    let loader = ScenarioLoader::new(config.scenarios.dir.clone(), config.scenarios.cache);
    AppState::new(config, Arc::new(loader))
}

/// Build the router with all endpoints and middleware.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/session", post(create_session))
        .route("/session/{session_id}", get(get_session))
        .route("/start_storyline", post(start_storyline))
        .route("/message", post(add_message))
        .route("/bundle/{session_id}", get(bundle_history))
        .route("/import_history", post(import_history))
        .route("/scenarios", get(list_scenarios))
        .route("/scenarios/{name}", get(get_scenario));

    with_middleware(routes, state)
}

/// Wrap routes in the middleware stack and attach state.
///
/// Layer order, outermost first: CORS, tracing, timeout, body limit. CORS
/// sits outside the timeout so 408 responses still carry CORS headers.
fn with_middleware(routes: Router<AppState>, state: AppState) -> Router {
    let app = routes
        .layer(DefaultBodyLimit::max(state.config.server.body_limit_bytes))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            timeout_middleware,
        ))
        .layer(TraceLayer::new_for_http());

    // Router::layer keeps the router type, so optional layers can branch.
    let app = if state.config.server.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = build_state(Arc::clone(&config));

    info!(
        name: "scenarios.config.loaded",
        dir = %config.scenarios.dir.display(),
        cache = config.scenarios.cache,
        "Scenario configuration loaded"
    );
    for kind in state.scenarios.missing() {
        warn!(
            name: "scenarios.missing",
            scenario = %kind,
            file = %kind.file_name(),
            "Scenario document missing; requests that need it will fail"
        );
    }

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response Bodies
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for creating a session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSessionRequest {
    /// Inject the status bar document right away.
    #[serde(default, alias = "open_status_bar")]
    open_status_bar: bool,
    /// Free-form player character card.
    #[serde(default, alias = "player_card")]
    player_card: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionOnlyRequest {
    #[serde(alias = "session_id")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRequest {
    #[serde(alias = "session_id")]
    session_id: String,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportHistoryRequest {
    #[serde(alias = "session_id")]
    session_id: String,
    history: Vec<HistoryEntry>,
}

/// Acknowledgement for mutating endpoints.
#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

#[derive(Debug, Serialize)]
struct BundleResponse {
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    sessions: usize,
}

#[derive(Debug, Serialize)]
struct ScenarioInfo {
    name: ScenarioKind,
    description: &'static str,
    available: bool,
}

#[derive(Debug, Serialize)]
struct ScenarioList {
    scenarios: Vec<ScenarioInfo>,
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /health - Liveness and session count.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.len(),
    })
}

/// POST /session - Create a new session.
async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<SessionView>> {
    let view = state
        .sessions
        .create(req.open_status_bar, req.player_card)
        .await?;
    Ok(Json(view))
}

/// GET /session/:id - Get a session's full view.
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>> {
    let session = state.sessions.require(&session_id)?;
    Ok(Json(session.view()))
}

/// POST /start_storyline - Append the opening event to the history.
async fn start_storyline(
    State(state): State<AppState>,
    Json(req): Json<SessionOnlyRequest>,
) -> Result<Json<OkResponse>> {
    state.sessions.start_storyline(&req.session_id).await?;
    Ok(OkResponse::ok())
}

/// POST /message - Append a player message.
async fn add_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<OkResponse>> {
    state.sessions.add_message(&req.session_id, req.message)?;
    Ok(OkResponse::ok())
}

/// GET /bundle/:id - Export the full history.
async fn bundle_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<BundleResponse>> {
    let history = state.sessions.bundle_history(&session_id)?;
    Ok(Json(BundleResponse { history }))
}

/// POST /import_history - Replace the history wholesale.
async fn import_history(
    State(state): State<AppState>,
    Json(req): Json<ImportHistoryRequest>,
) -> Result<Json<OkResponse>> {
    state.sessions.import_history(&req.session_id, req.history)?;
    Ok(OkResponse::ok())
}

/// GET /scenarios - List scenario documents and whether they are on disk.
async fn list_scenarios(State(state): State<AppState>) -> Json<ScenarioList> {
    let scenarios = ScenarioKind::ALL
        .into_iter()
        .map(|kind| ScenarioInfo {
            name: kind,
            description: kind.description(),
            available: state.scenarios.is_available(kind),
        })
        .collect();
    Json(ScenarioList { scenarios })
}

/// GET /scenarios/:name - Fetch one parsed scenario document.
async fn get_scenario(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ScenarioDocument>> {
    let document = state
        .scenarios
        .load_named(&name)
        .await
        .map_err(|e| match e {
            ScenarioError::NotFound { name } => AppError::ScenarioNotFound(name),
            other => AppError::Scenario(other),
        })?;
    Ok(Json(document))
}
