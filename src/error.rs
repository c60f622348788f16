//! Unified error types for the arbitrage dashboard.

use reqwest::StatusCode;
use thiserror::Error;

/// Unified error type for the dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Backend API error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Credential storage error.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors surfaced by the backend API adapter.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected our credentials (HTTP 401).
    ///
    /// The stored token has already been purged when this is returned.
    #[error("unauthorized: credentials rejected by {endpoint}")]
    Unauthorized {
        /// Endpoint path that returned 401.
        endpoint: String,
    },

    /// Any other non-success HTTP status, passed through unchanged.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        /// Endpoint path.
        endpoint: String,
        /// Response status.
        status: StatusCode,
        /// Response body, possibly empty.
        body: String,
    },

    /// Connection, timeout, or other transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("failed to decode {endpoint} response: {reason}")]
    Decode {
        /// Endpoint path.
        endpoint: String,
        /// Decoder message.
        reason: String,
    },

    /// Endpoint path could not be joined onto the base URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether this error forced a logout.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

/// Credential storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the key file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Refused to store an empty key.
    #[error("api key is empty")]
    EmptyKey,
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_detected() {
        let err = ApiError::Unauthorized {
            endpoint: "/api/v1/opportunities".to_string(),
        };
        assert!(err.is_unauthorized());

        let err = ApiError::Status {
            endpoint: "/api/v1/execute".to_string(),
            status: StatusCode::NOT_FOUND,
            body: "Opportunity not found".to_string(),
        };
        assert!(!err.is_unauthorized());
        assert_eq!(
            err.to_string(),
            "/api/v1/execute returned HTTP 404 Not Found: Opportunity not found"
        );
    }
}
