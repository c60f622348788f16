//! Integration tests for the arbitrage dashboard client.
//!
//! Each test starts an in-process axum server that stands in for the
//! arbitrage platform and drives the real HTTP client against it.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::Url;

use arb_dashboard::backend::{
    ArbitrageClient, ExecuteRequest, UserCreateRequest,
};
use arb_dashboard::config::Config;
use arb_dashboard::dashboard::{
    Dashboard, DashboardSettings, ExecuteOutcome, Notification, RecordingNotifier,
};
use arb_dashboard::error::ApiError;
use arb_dashboard::session::{MemoryTokenStore, Navigator, Session, TokenStore};

const API_KEY: &str = "test-key-123";

/// What the fake platform saw and how it should behave.
#[derive(Default)]
struct FakePlatform {
    auth_headers: Mutex<Vec<Option<String>>>,
    executed: Mutex<Vec<Value>>,
    reject_all: AtomicBool,
    fail_opportunities: AtomicBool,
}

impl FakePlatform {
    fn record_auth(&self, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.lock().unwrap().push(auth);
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", API_KEY);
        !self.reject_all.load(Ordering::SeqCst)
            && headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }
}

type Shared = Arc<FakePlatform>;

fn opportunity(id: &str, token: &str, net_profit: f64, confidence: f64) -> Value {
    json!({
        "id": id,
        "token_address": token,
        "source_chain": "ethereum",
        "target_chain": "polygon",
        "source_price": 2.0,
        "target_price": 2.05,
        "price_difference": 0.05,
        "profit_potential": net_profit + 1.5,
        "gas_estimate": 1.5,
        "net_profit": net_profit,
        "confidence_score": confidence,
        "timestamp": "2024-05-01T12:00:00.123456"
    })
}

fn listing() -> Vec<Value> {
    vec![
        opportunity("opp-a", "0xaaaa000000000000000000000000000000000001", 10.0, 0.5),
        opportunity("opp-b", "0xbbbb000000000000000000000000000000000002", 20.0, 0.9),
        opportunity("opp-c", "0xaaaa000000000000000000000000000000000001", -3.0, 0.2),
    ]
}

fn user_json(api_key: Option<&str>) -> Value {
    json!({
        "id": "user-1",
        "email": "trader@example.com",
        "wallet_address": "0xwallet",
        "api_key": api_key,
        "tier": "pro",
        "created_at": "2024-05-01T12:00:00",
        "is_active": true
    })
}

async fn list_opportunities(State(platform): State<Shared>, headers: HeaderMap) -> Response {
    platform.record_auth(&headers);
    if platform.reject_all.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    if platform.fail_opportunities.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }
    Json(listing()).into_response()
}

async fn token_opportunities(
    State(platform): State<Shared>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Response {
    platform.record_auth(&headers);
    let filtered: Vec<Value> = listing()
        .into_iter()
        .filter(|o| o["token_address"] == token.as_str())
        .collect();
    Json(filtered).into_response()
}

async fn execute(State(platform): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    platform.record_auth(&headers);
    if !platform.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    let id = body["opportunity_id"].as_str().unwrap_or_default().to_string();
    platform.executed.lock().unwrap().push(body);
    Json(json!({
        "status": "execution_started",
        "opportunity_id": id,
        "estimated_profit": 10.0,
        "transaction_hash": null,
        "message": "Arbitrage execution started"
    }))
    .into_response()
}

async fn create_user(Json(body): Json<Value>) -> Response {
    let mut user = user_json(Some("issued-key-456"));
    user["email"] = body["email"].clone();
    user["wallet_address"] = body["wallet_address"].clone();
    user["tier"] = body.get("tier").cloned().unwrap_or_else(|| json!("free"));
    Json(user).into_response()
}

async fn current_user(State(platform): State<Shared>, headers: HeaderMap) -> Response {
    if !platform.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    Json(user_json(None)).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": "2024-05-01T12:00:00.000001",
        "version": "1.0.0"
    }))
}

async fn spawn_platform(platform: Shared) -> SocketAddr {
    let router = Router::new()
        .route("/api/v1/opportunities", get(list_opportunities))
        .route("/api/v1/opportunities/:token", get(token_opportunities))
        .route("/api/v1/execute", post(execute))
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/me", get(current_user))
        .route("/health", get(health))
        .with_state(platform);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Records every navigation request.
#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &Url) {
        self.visited.lock().unwrap().push(url.to_string());
    }
}

struct Harness {
    platform: Shared,
    client: ArbitrageClient,
    store: Arc<MemoryTokenStore>,
    navigator: Arc<RecordingNavigator>,
}

async fn harness(token: Option<&str>) -> Harness {
    let platform = Shared::default();
    let addr = spawn_platform(platform.clone()).await;

    let config = Config {
        api_url: format!("http://{}", addr),
        http_timeout_ms: 5_000,
        ..Default::default()
    };
    let store = Arc::new(match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    });
    let navigator = Arc::new(RecordingNavigator::default());
    let session = Session::new(
        config.base_url().unwrap(),
        config.login_path.clone(),
        store.clone(),
        navigator.clone(),
    );
    let client = ArbitrageClient::new(&config, Arc::new(session)).unwrap();

    Harness {
        platform,
        client,
        store,
        navigator,
    }
}

#[tokio::test]
async fn fetches_opportunities_with_bearer_token() {
    let h = harness(Some(API_KEY)).await;

    let opportunities = h.client.get_opportunities().await.unwrap();

    assert_eq!(opportunities.len(), 3);
    assert_eq!(opportunities[0].id, "opp-a");
    assert_eq!(opportunities[1].net_profit, dec!(20));
    assert_eq!(opportunities[2].net_profit, dec!(-3));
    assert_eq!(opportunities[0].confidence_score, dec!(0.5));
    assert_eq!(opportunities[0].timestamp.year(), 2024);

    let auth = h.platform.auth_headers.lock().unwrap().clone();
    assert_eq!(auth, vec![Some(format!("Bearer {}", API_KEY))]);
}

#[tokio::test]
async fn requests_without_token_are_sent_unauthenticated() {
    let h = harness(None).await;

    let opportunities = h.client.get_opportunities().await.unwrap();

    assert_eq!(opportunities.len(), 3);
    let auth = h.platform.auth_headers.lock().unwrap().clone();
    assert_eq!(auth, vec![None]);
}

#[tokio::test]
async fn token_opportunities_are_filtered_by_path() {
    let h = harness(Some(API_KEY)).await;

    let opportunities = h
        .client
        .get_token_opportunities("0xaaaa000000000000000000000000000000000001")
        .await
        .unwrap();

    let ids: Vec<_> = opportunities.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["opp-a", "opp-c"]);
}

#[tokio::test]
async fn token_with_reserved_characters_stays_one_segment() {
    let h = harness(Some(API_KEY)).await;

    // would otherwise reach a different route or carry a query string
    let opportunities = h
        .client
        .get_token_opportunities("0xaaaa/../../users/me?x=1#frag")
        .await
        .unwrap();

    assert!(opportunities.is_empty());
    assert_eq!(h.platform.auth_headers.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn execute_sends_request_body() {
    let h = harness(Some(API_KEY)).await;

    let response = h
        .client
        .execute_arbitrage(&ExecuteRequest {
            opportunity_id: "opp-b".to_string(),
            amount: Some(dec!(1000)),
            wallet_address: None,
        })
        .await
        .unwrap();

    assert!(response.is_started());
    assert_eq!(response.opportunity_id, "opp-b");
    assert_eq!(response.estimated_profit, dec!(10));

    let executed = h.platform.executed.lock().unwrap().clone();
    assert_eq!(executed, vec![json!({"opportunity_id": "opp-b", "amount": 1000.0})]);
}

#[tokio::test]
async fn unauthorized_response_purges_token_and_navigates_to_login() {
    let h = harness(Some(API_KEY)).await;
    h.platform.reject_all.store(true, Ordering::SeqCst);

    let err = h.client.get_opportunities().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.store.load().unwrap(), None);
    let visited = h.navigator.visited.lock().unwrap().clone();
    assert_eq!(visited.len(), 1);
    assert!(visited[0].ends_with("/login"));

    // later requests go out without credentials
    h.platform.reject_all.store(false, Ordering::SeqCst);
    h.client.get_opportunities().await.unwrap();
    let auth = h.platform.auth_headers.lock().unwrap().clone();
    assert_eq!(auth.last().cloned().flatten(), None);
}

#[tokio::test]
async fn server_errors_pass_through_without_logout() {
    let h = harness(Some(API_KEY)).await;
    h.platform.fail_opportunities.store(true, Ordering::SeqCst);

    let err = h.client.get_opportunities().await.unwrap_err();

    match err {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "database unavailable");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(h.store.load().unwrap(), Some(API_KEY.to_string()));
    assert!(h.navigator.visited.lock().unwrap().is_empty());
}

#[tokio::test]
async fn create_user_returns_api_key() {
    let h = harness(None).await;

    let user = h
        .client
        .create_user(&UserCreateRequest {
            email: "new@example.com".to_string(),
            wallet_address: "0xnew".to_string(),
            tier: None,
        })
        .await
        .unwrap();

    assert_eq!(user.email, "new@example.com");
    assert_eq!(user.tier, "free");
    assert_eq!(user.api_key.as_deref(), Some("issued-key-456"));
}

#[tokio::test]
async fn current_user_requires_valid_key() {
    let h = harness(Some(API_KEY)).await;
    let user = h.client.get_current_user().await.unwrap();
    assert_eq!(user.id, "user-1");
    assert!(user.is_active);

    let h = harness(Some("wrong-key")).await;
    let err = h.client.get_current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(h.store.load().unwrap(), None);
}

#[tokio::test]
async fn health_accepts_naive_timestamps() {
    let h = harness(None).await;

    let health = h.client.check_health().await.unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version.as_deref(), Some("1.0.0"));
    assert!(health.timestamp.is_some());
}

#[tokio::test]
async fn dashboard_executes_through_real_client() {
    let h = harness(Some(API_KEY)).await;
    let platform = h.platform.clone();
    let notifier = Arc::new(RecordingNotifier::new());
    let settings = DashboardSettings {
        refresh_delay: Duration::from_millis(50),
        ..Default::default()
    };
    let dashboard = Dashboard::new(Arc::new(h.client), notifier.clone(), settings);

    assert!(dashboard.refresh().await);
    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.state.stats.total_opportunities, 3);
    assert_eq!(snapshot.state.stats.total_profit_potential, dec!(27));
    assert_eq!(snapshot.state.stats.best_opportunity, dec!(10));

    let outcome = dashboard.execute("opp-a").await;
    assert!(matches!(outcome, ExecuteOutcome::Started(_)));
    assert!(notifier.received()[0].is_success());

    // losing opportunity never reaches the platform
    assert!(matches!(dashboard.execute("opp-c").await, ExecuteOutcome::Skipped(_)));
    assert_eq!(platform.executed.lock().unwrap().len(), 1);

    // delayed refresh after the accepted execution
    let before = platform.auth_headers.lock().unwrap().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let after = platform.auth_headers.lock().unwrap().len();
    assert!(after > before);
}

#[tokio::test]
async fn rejected_execute_notifies_and_forces_logout() {
    let h = harness(Some(API_KEY)).await;
    let platform = h.platform.clone();
    let store = h.store.clone();
    let navigator = h.navigator.clone();
    let notifier = Arc::new(RecordingNotifier::new());
    let dashboard = Dashboard::new(Arc::new(h.client), notifier.clone(), DashboardSettings::default());
    assert!(dashboard.refresh().await);

    platform.reject_all.store(true, Ordering::SeqCst);
    let outcome = dashboard.execute("opp-a").await;

    assert!(matches!(outcome, ExecuteOutcome::Failed(_)));
    let received = notifier.received();
    assert_eq!(received.len(), 1);
    match &received[0] {
        Notification::ExecutionFailed { opportunity_id, .. } => assert_eq!(opportunity_id, "opp-a"),
        other => panic!("expected failure notification, got {:?}", other),
    }
    assert!(platform.executed.lock().unwrap().is_empty());
    assert_eq!(store.load().unwrap(), None);
    let visited = navigator.visited.lock().unwrap().clone();
    assert_eq!(visited.len(), 1);
    assert!(visited[0].ends_with("/login"));

    // the id is free again once the request has failed
    assert!(!dashboard.snapshot().await.executing.contains("opp-a"));
}
