//! Arbitrage platform API client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::ApiError;
use crate::metrics::{self, LatencyTimer};
use crate::session::Session;

use super::types::{
    ExecuteRequest, ExecuteResponse, HealthStatus, Opportunity, User, UserCreateRequest,
};
use super::ArbitrageBackend;

const OPPORTUNITIES_PATH: &str = "/api/v1/opportunities";
const EXECUTE_PATH: &str = "/api/v1/execute";
const USERS_PATH: &str = "/api/v1/users";
const CURRENT_USER_PATH: &str = "/api/v1/users/me";
const HEALTH_PATH: &str = "/health";

/// HTTP client for the arbitrage platform API.
///
/// Every request carries `Content-Type: application/json` and, when the
/// session holds one, a bearer token. A 401 from any endpoint expires the
/// session before the error is returned.
#[derive(Debug, Clone)]
pub struct ArbitrageClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL and credentials.
    session: Arc<Session>,
}

impl ArbitrageClient {
    /// Create a client for `session` using timeouts from `config`.
    pub fn new(config: &Config, session: Arc<Session>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout())
            .connect_timeout(std::time::Duration::from_secs(5))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()?;

        Ok(Self { http, session })
    }

    /// Get the session this client authenticates with.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Get all current opportunities.
    #[instrument(skip(self))]
    pub async fn get_opportunities(&self) -> Result<Vec<Opportunity>, ApiError> {
        self.send(Method::GET, OPPORTUNITIES_PATH, None::<&()>).await
    }

    /// Get opportunities for a single token.
    #[instrument(skip(self))]
    pub async fn get_token_opportunities(
        &self,
        token_address: &str,
    ) -> Result<Vec<Opportunity>, ApiError> {
        let url = self.token_opportunities_url(token_address)?;
        self.send_to(Method::GET, url, OPPORTUNITIES_PATH, None::<&()>)
            .await
    }

    /// Ask the backend to execute an opportunity.
    #[instrument(skip(self, request), fields(opportunity_id = %request.opportunity_id))]
    pub async fn execute_arbitrage(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
        self.send(Method::POST, EXECUTE_PATH, Some(request)).await
    }

    /// Register a new user.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(&self, request: &UserCreateRequest) -> Result<User, ApiError> {
        self.send(Method::POST, USERS_PATH, Some(request)).await
    }

    /// Get the user owning the current API key.
    #[instrument(skip(self))]
    pub async fn get_current_user(&self) -> Result<User, ApiError> {
        self.send(Method::GET, CURRENT_USER_PATH, None::<&()>).await
    }

    /// Query backend health.
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> Result<HealthStatus, ApiError> {
        self.send(Method::GET, HEALTH_PATH, None::<&()>).await
    }

    /// Opportunities URL with the token appended as one encoded path segment.
    fn token_opportunities_url(&self, token_address: &str) -> Result<Url, ApiError> {
        let mut url = self.session.endpoint(OPPORTUNITIES_PATH)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(token_address);
        Ok(url)
    }

    /// Build a request with the session's bearer token attached.
    fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self.http.request(method, url);
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.session.endpoint(path)?;
        self.send_to(method, url, path, body).await
    }

    /// Send to `url`. `path` labels metrics, logs and errors.
    async fn send_to<B, T>(
        &self,
        method: Method,
        url: Url,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.authorized(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = {
            let _timer = LatencyTimer::new(path);
            request.send().await?
        };

        let status = response.status();
        debug!(path, %status, "Backend responded");

        if status == StatusCode::UNAUTHORIZED {
            metrics::inc_unauthorized();
            self.session.expire();
            return Err(ApiError::Unauthorized {
                endpoint: path.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path, %status, "Backend request failed");
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status,
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ArbitrageBackend for ArbitrageClient {
    async fn fetch_opportunities(&self) -> Result<Vec<Opportunity>, ApiError> {
        self.get_opportunities().await
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
        self.execute_arbitrage(request).await
    }
}
