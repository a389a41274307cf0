//! End-to-end tests for the poll cycle.
//!
//! A local axum server plays both the Practicum homework API and the
//! Telegram Bot API, so the real HTTP clients are exercised without
//! leaving the machine.

use std::collections::{HashMap, VecDeque};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hwbot_orchestrator::{
    Config, Credentials, CycleOutcome, HomeworkStatus, HwbotError, PollState, Poller, Settings,
    FAILURE_PREFIX,
};
use serde_json::{json, Value};

const PRACTICUM_TOKEN: &str = "practicum-test-token";
const TELEGRAM_TOKEN: &str = "123456:telegram-test-token";
const CHAT_ID: &str = "987654";
const STATUSES_PATH: &str = "/api/user_api/homework_statuses/";

/// A scripted reply from the mock homework API.
#[derive(Clone)]
enum ApiReply {
    Json(Value),
    Status(StatusCode),
    Raw(&'static str),
    Slow(Duration),
}

/// Shared state of the mock servers.
#[derive(Default)]
struct Mock {
    replies: Mutex<VecDeque<ApiReply>>,
    from_dates: Mutex<Vec<String>>,
    messages: Mutex<Vec<(String, Value)>>,
    telegram_rejects: Mutex<bool>,
}

impl Mock {
    fn with_replies(replies: Vec<ApiReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    fn from_dates(&self) -> Vec<String> {
        self.from_dates.lock().expect("lock").clone()
    }

    fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .expect("lock")
            .iter()
            .map(|(_, body)| body["text"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

async fn homework_statuses(
    State(mock): State<Arc<Mock>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let expected = format!("OAuth {PRACTICUM_TOKEN}");
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    mock.from_dates
        .lock()
        .expect("lock")
        .push(params.get("from_date").cloned().unwrap_or_default());

    let reply = mock
        .replies
        .lock()
        .expect("lock")
        .pop_front()
        .unwrap_or_else(|| ApiReply::Json(json!({"homeworks": []})));

    match reply {
        ApiReply::Json(body) => Json(body).into_response(),
        ApiReply::Status(status) => status.into_response(),
        ApiReply::Raw(body) => (StatusCode::OK, body).into_response(),
        ApiReply::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({"homeworks": []})).into_response()
        }
    }
}

async fn send_message(
    State(mock): State<Arc<Mock>>,
    Path(bot): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    if *mock.telegram_rejects.lock().expect("lock") {
        return Json(json!({"ok": false, "description": "Bad Request: chat not found"}));
    }
    mock.messages.lock().expect("lock").push((bot, body));
    Json(json!({"ok": true, "result": {"message_id": 1}}))
}

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Spawns the mock server and returns its base URL.
async fn spawn_mock_server(mock: Arc<Mock>) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = Router::new()
        .route(STATUSES_PATH, get(homework_statuses))
        .route("/:bot/sendMessage", post(send_message))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://{addr}"), handle)
}

fn config_for(base_url: &str) -> Config {
    let settings = Settings {
        endpoint: format!("{base_url}{STATUSES_PATH}"),
        telegram_api_url: base_url.to_string(),
        request_timeout_secs: 1,
        retry_period_secs: 1,
        log_file: String::new(),
    };
    let credentials = Credentials {
        practicum_token: PRACTICUM_TOKEN.to_string(),
        telegram_token: TELEGRAM_TOKEN.to_string(),
        telegram_chat_id: CHAT_ID.to_string(),
    };
    Config::new(settings, credentials).expect("valid config")
}

async fn poller_for(
    mock: Arc<Mock>,
) -> (
    Poller<hwbot_orchestrator::PracticumClient, hwbot_orchestrator::TelegramTransport>,
    tokio::task::JoinHandle<()>,
) {
    let (base_url, handle) = spawn_mock_server(mock).await;
    let poller = Poller::from_config(&config_for(&base_url))
        .expect("poller")
        .with_state(PollState::with_window(1_700_000_000));
    (poller, handle)
}

// ============================================================================
// Happy path
// ============================================================================

/// Tests that a new status travels from the API to the Telegram chat.
#[tokio::test]
async fn test_status_change_reaches_telegram() {
    let mock = Mock::with_replies(vec![ApiReply::Json(json!({
        "homeworks": [
            {"homework_name": "hw05_final.zip", "status": "approved", "id": 7},
            {"homework_name": "hw04.zip", "status": "rejected"}
        ],
        "current_date": 1_700_000_600
    }))]);
    let (mut poller, _handle) = poller_for(Arc::clone(&mock)).await;

    let outcome = poller.run_cycle().await;

    assert_eq!(outcome, CycleOutcome::Notified);
    assert_eq!(mock.from_dates(), vec!["1700000000".to_string()]);
    assert_eq!(poller.state().window, 1_700_000_600);

    let messages = mock.messages.lock().expect("lock").clone();
    assert_eq!(messages.len(), 1);
    let (bot, body) = &messages[0];
    assert_eq!(bot, &format!("bot{TELEGRAM_TOKEN}"));
    assert_eq!(body["chat_id"], CHAT_ID);
    let text = body["text"].as_str().expect("text");
    assert!(text.contains("\"hw05_final.zip\""));
    assert!(text.contains(HomeworkStatus::Approved.verdict()));
}

/// Tests that repeated polls with the same verdict only message once.
#[tokio::test]
async fn test_repeated_status_is_not_resent() {
    let reply = ApiReply::Json(json!({
        "homeworks": [{"homework_name": "hw", "status": "reviewing"}],
        "current_date": 1_700_000_600
    }));
    let mock = Mock::with_replies(vec![reply.clone(), reply]);
    let (mut poller, _handle) = poller_for(Arc::clone(&mock)).await;

    assert_eq!(poller.run_cycle().await, CycleOutcome::Notified);
    assert_eq!(poller.run_cycle().await, CycleOutcome::Unchanged);

    assert_eq!(mock.texts().len(), 1);
    assert_eq!(
        mock.from_dates(),
        vec!["1700000000".to_string(), "1700000600".to_string()]
    );
}

/// Tests that an empty homework list is quiet.
#[tokio::test]
async fn test_empty_homeworks_is_quiet() {
    let mock = Mock::with_replies(vec![ApiReply::Json(
        json!({"homeworks": [], "current_date": 1_700_000_900}),
    )]);
    let (mut poller, _handle) = poller_for(Arc::clone(&mock)).await;

    assert_eq!(poller.run_cycle().await, CycleOutcome::NoUpdates);
    assert!(mock.texts().is_empty());
    assert_eq!(poller.state().window, 1_700_000_900);
}

// ============================================================================
// Failure paths
// ============================================================================

/// Tests that a server error is relayed once and does not move the window.
#[tokio::test]
async fn test_server_error_is_reported_once() {
    let mock = Mock::with_replies(vec![
        ApiReply::Status(StatusCode::INTERNAL_SERVER_ERROR),
        ApiReply::Status(StatusCode::INTERNAL_SERVER_ERROR),
    ]);
    let (mut poller, _handle) = poller_for(Arc::clone(&mock)).await;

    let first = poller.run_cycle().await;
    let second = poller.run_cycle().await;

    assert!(matches!(first, CycleOutcome::Failed { notified: true, .. }));
    assert!(matches!(second, CycleOutcome::Failed { notified: false, .. }));
    assert_eq!(poller.state().window, 1_700_000_000);

    let texts = mock.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with(FAILURE_PREFIX));
    assert!(texts[0].contains("500"));
    assert!(texts[0].contains("Internal Server Error"));
}

/// Tests that a bad token surfaces as an HTTP status error.
#[tokio::test]
async fn test_rejected_token_is_reported() {
    let mock = Mock::with_replies(vec![]);
    let (base_url, _handle) = spawn_mock_server(Arc::clone(&mock)).await;
    let mut config = config_for(&base_url);
    config.credentials.practicum_token = "wrong".to_string();
    let mut poller = Poller::from_config(&config).expect("poller");

    let outcome = poller.run_cycle().await;

    let CycleOutcome::Failed { message, .. } = outcome else {
        unreachable!("expected failure, got {outcome:?}");
    };
    assert!(message.contains("401"));
    assert!(mock.from_dates().is_empty());
}

/// Tests that a non-JSON body is a request error.
#[tokio::test]
async fn test_non_json_body_is_reported() {
    let mock = Mock::with_replies(vec![ApiReply::Raw("<html>maintenance</html>")]);
    let (mut poller, _handle) = poller_for(Arc::clone(&mock)).await;

    let outcome = poller.run_cycle().await;

    let CycleOutcome::Failed { message, .. } = outcome else {
        unreachable!("expected failure, got {outcome:?}");
    };
    assert!(message.contains("not valid JSON"));
}

/// Tests that a malformed payload is rejected before field access.
#[tokio::test]
async fn test_malformed_payload_is_reported() {
    let mock = Mock::with_replies(vec![ApiReply::Json(json!({"homeworks": "none"}))]);
    let (mut poller, _handle) = poller_for(Arc::clone(&mock)).await;

    let outcome = poller.run_cycle().await;

    assert!(outcome.is_failure());
    assert!(mock.texts()[0].contains("homeworks has unexpected type"));
}

/// Tests that a hanging API is cut off by the request timeout.
#[tokio::test]
async fn test_slow_api_times_out() {
    let mock = Mock::with_replies(vec![ApiReply::Slow(Duration::from_secs(3))]);
    let (mut poller, _handle) = poller_for(Arc::clone(&mock)).await;

    let outcome = tokio::time::timeout(Duration::from_secs(10), poller.run_cycle())
        .await
        .expect("cycle should finish within the request timeout");

    assert!(outcome.is_failure());
    assert!(poller.state().is_degraded());
}

/// Tests that a Telegram rejection does not fail the cycle.
#[tokio::test]
async fn test_telegram_rejection_is_not_fatal() {
    let mock = Mock::with_replies(vec![ApiReply::Json(json!({
        "homeworks": [{"homework_name": "hw", "status": "rejected"}],
        "current_date": 1_700_000_600
    }))]);
    *mock.telegram_rejects.lock().expect("lock") = true;
    let (mut poller, _handle) = poller_for(Arc::clone(&mock)).await;

    let outcome = poller.run_cycle().await;

    assert_eq!(outcome, CycleOutcome::NotDelivered);
    assert!(!poller.state().is_degraded());
    assert!(poller.state().last_verdict.is_none());
    assert_eq!(poller.state().window, 1_700_000_600);
}

// ============================================================================
// Startup
// ============================================================================

/// Tests that missing credentials stop startup before any request.
#[tokio::test]
async fn test_missing_credentials_block_startup() {
    let mock = Mock::with_replies(vec![]);
    let (base_url, _handle) = spawn_mock_server(Arc::clone(&mock)).await;
    let settings = config_for(&base_url).settings;

    let credentials = Credentials {
        practicum_token: PRACTICUM_TOKEN.to_string(),
        telegram_token: String::new(),
        telegram_chat_id: String::new(),
    };
    let err = Config::new(settings, credentials).expect_err("must fail");

    assert!(
        matches!(&err, HwbotError::ConfigurationError { missing } if missing == &["TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"]),
        "unexpected error: {err:?}"
    );
    assert!(mock.from_dates().is_empty());
    assert!(mock.texts().is_empty());
}
