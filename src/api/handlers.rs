//! HTTP API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::dashboard::{SharedState, Stats};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Dashboard state written by the poller.
    pub dashboard: SharedState,
    /// Prometheus recorder handle, when one is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create app state over the dashboard's shared state.
    pub fn new(dashboard: SharedState) -> Self {
        Self {
            dashboard,
            prometheus: None,
        }
    }

    /// Expose `/metrics` from this handle.
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether at least one fetch has succeeded.
    pub ready: bool,
    /// Time of the last successful fetch.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<time::OffsetDateTime>,
}

/// Stats response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Opportunities in the current list.
    pub visible_opportunities: usize,
    /// Derived statistics.
    pub stats: Stats,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 once data has loaded, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    let response = ReadyResponse {
        ready: dashboard.is_ready(),
        last_updated: dashboard.last_updated,
    };

    if response.ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Stats handler - returns the dashboard's derived statistics.
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    Json(StatsResponse {
        visible_opportunities: dashboard.opportunities.len(),
        stats: dashboard.stats,
    })
}

/// Prometheus scrape handler.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
