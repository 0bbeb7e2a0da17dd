use axum::http::StatusCode;
use axum_test::TestServer;
use roleplay_sessions::config::AppConfig;
use roleplay_sessions::scenario::ScenarioKind;
use roleplay_sessions::server;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

const STATUS_BAR: &str = "\
fields:
  - mood
  - affection
affection: 0
";

const OPENING_EVENT: &str = "\
scene: rainy platform
lines:
  - The last train is late again.
";

const MISSING_ID: &str = "00000000-0000-4000-8000-000000000000";

/// Scenario directory holding only the two documents the service injects.
fn scenario_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("status-bar.yaml"), STATUS_BAR).unwrap();
    std::fs::write(dir.path().join("opening-event.yaml"), OPENING_EVENT).unwrap();
    dir
}

fn test_server_with(config: AppConfig) -> TestServer {
    let state = server::build_state(Arc::new(config));
    TestServer::new(server::router(state)).unwrap()
}

fn test_server(dir: &TempDir) -> TestServer {
    let mut config = AppConfig::default();
    config.scenarios.dir = dir.path().to_path_buf();
    test_server_with(config)
}

async fn create_session(server: &TestServer, open_status_bar: bool) -> String {
    let response = server
        .post("/session")
        .json(&json!({"openStatusBar": open_status_bar, "playerCard": "Alex"}))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["sessionId"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn history(server: &TestServer, id: &str) -> Vec<Value> {
    let response = server.get(&format!("/bundle/{id}")).await;
    response.assert_status_ok();
    response.json::<Value>()["history"]
        .as_array()
        .unwrap()
        .clone()
}

#[tokio::test]
async fn test_create_message_bundle_flow() {
    let dir = scenario_dir();
    let server = test_server(&dir);

    let response = server
        .post("/session")
        .json(&json!({"openStatusBar": false, "playerCard": "Alex"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["openStatusBar"], false);
    assert_eq!(body["playerCard"], "Alex");
    assert_eq!(body["history"], json!([]));
    let id = body["sessionId"].as_str().unwrap().to_string();

    let response = server
        .post("/message")
        .json(&json!({"sessionId": id, "message": "hello"}))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({"ok": true}));

    server
        .get(&format!("/bundle/{id}"))
        .await
        .assert_json(&json!({"history": [{"role": "user", "content": "hello"}]}));
}

#[tokio::test]
async fn test_create_with_status_bar_injects_document() {
    let dir = scenario_dir();
    let server = test_server(&dir);

    let response = server
        .post("/session")
        .json(&json!({"openStatusBar": true, "playerCard": ""}))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(
        body["history"],
        json!([{"role": "system", "content": {"fields": ["mood", "affection"], "affection": 0}}])
    );
}

#[tokio::test]
async fn test_snake_case_fields_and_defaults_are_accepted() {
    let dir = scenario_dir();
    let server = test_server(&dir);

    let response = server
        .post("/session")
        .json(&json!({"open_status_bar": true, "player_card": "Mei"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["playerCard"], "Mei");
    assert_eq!(body["history"].as_array().unwrap().len(), 1);

    let response = server.post("/session").json(&json!({})).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["openStatusBar"], false);
    assert_eq!(body["playerCard"], "");

    let id = body["sessionId"].as_str().unwrap();
    server
        .post("/message")
        .json(&json!({"session_id": id, "message": "hi"}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_start_storyline_appends_each_call() {
    let dir = scenario_dir();
    let server = test_server(&dir);
    let id = create_session(&server, true).await;

    for expected in [2, 3] {
        server
            .post("/start_storyline")
            .json(&json!({"sessionId": id}))
            .await
            .assert_json(&json!({"ok": true}));
        assert_eq!(history(&server, &id).await.len(), expected);
    }

    let entries = history(&server, &id).await;
    assert_eq!(entries[2]["role"], "system");
    assert_eq!(entries[2]["content"]["scene"], "rainy platform");
}

#[tokio::test]
async fn test_import_history_replaces_everything() {
    let dir = scenario_dir();
    let server = test_server(&dir);
    let id = create_session(&server, true).await;
    server
        .post("/start_storyline")
        .json(&json!({"sessionId": id}))
        .await
        .assert_status_ok();
    server
        .post("/message")
        .json(&json!({"sessionId": id, "message": "first"}))
        .await
        .assert_status_ok();
    assert_eq!(history(&server, &id).await.len(), 3);

    let imported = json!([{"role": "user", "content": "from another window", "turn": 7}]);
    server
        .post("/import_history")
        .json(&json!({"sessionId": id, "history": imported}))
        .await
        .assert_json(&json!({"ok": true}));

    assert_eq!(Value::Array(history(&server, &id).await), imported);
}

#[tokio::test]
async fn test_import_keeps_loose_entries_verbatim() {
    let dir = scenario_dir();
    let server = test_server(&dir);
    let id = create_session(&server, false).await;

    let imported = json!([
        {"role": 1, "content": "x"},
        {"role": "user", "content": null},
        {"role": null, "content": {"nested": [null]}},
        {"note": "no role or content"}
    ]);
    server
        .post("/import_history")
        .json(&json!({"sessionId": id, "history": imported}))
        .await
        .assert_json(&json!({"ok": true}));

    server
        .get(&format!("/bundle/{id}"))
        .await
        .assert_json(&json!({"history": imported}));
}

#[tokio::test]
async fn test_unknown_session_returns_404() {
    let dir = scenario_dir();
    let server = test_server(&dir);
    create_session(&server, false).await;
    let missing = MISSING_ID;

    let response = server.get(&format!("/bundle/{missing}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({"detail": "Session not found."}));

    server
        .post("/message")
        .json(&json!({"sessionId": missing, "message": "hi"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/start_storyline")
        .json(&json!({"sessionId": missing}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/import_history")
        .json(&json!({"sessionId": missing, "history": []}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/session/{missing}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .get("/health")
        .await
        .assert_json(&json!({"status": "ok", "sessions": 1}));
}

#[tokio::test]
async fn test_missing_scenario_is_server_error() {
    let empty = TempDir::new().unwrap();
    let server = test_server(&empty);

    let response = server
        .post("/session")
        .json(&json!({"openStatusBar": true, "playerCard": "Alex"}))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    server
        .get("/health")
        .await
        .assert_json(&json!({"status": "ok", "sessions": 0}));

    let id = create_session(&server, false).await;
    server
        .post("/start_storyline")
        .json(&json!({"sessionId": id}))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(history(&server, &id).await.is_empty());
}

#[tokio::test]
async fn test_get_session_returns_view() {
    let dir = scenario_dir();
    let server = test_server(&dir);
    let id = create_session(&server, true).await;

    let response = server.get(&format!("/session/{id}")).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["sessionId"], id.as_str());
    assert_eq!(body["openStatusBar"], true);
    assert_eq!(body["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_scenario_endpoints() {
    let dir = scenario_dir();
    let server = test_server(&dir);

    let body = server.get("/scenarios").await.json::<Value>();
    let scenarios = body["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), ScenarioKind::ALL.len());
    let available: Vec<&str> = scenarios
        .iter()
        .filter(|s| s["available"] == true)
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(available, ["status-bar", "opening-event"]);

    let response = server.get("/scenarios/opening-event").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["scene"], "rainy platform");

    server
        .get("/scenarios/persona")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/scenarios/unknown")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
