//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use crate::error::DashboardError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Backend ===
    /// Arbitrage API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key supplied directly; takes precedence over the key file.
    #[serde(default)]
    pub api_key: Option<String>,

    /// File holding the persisted API key.
    #[serde(default = "default_api_key_file")]
    pub api_key_file: PathBuf,

    /// Route the user is sent to when credentials are rejected.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    // === Dashboard ===
    /// Interval between opportunity fetches.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Delay before refetching after an execution was accepted.
    #[serde(default = "default_refresh_delay")]
    pub refresh_delay_ms: u64,

    /// Amount sent with every execute request.
    #[serde(default = "default_execute_amount")]
    pub execute_amount: Decimal,

    /// Wallet used for execution; the backend falls back to the account wallet.
    #[serde(default)]
    pub wallet_address: Option<String>,

    // === Server Configuration ===
    /// HTTP port for the local health/stats endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Serve the local health/stats endpoints.
    #[serde(default = "default_true")]
    pub status_server: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_key_file() -> PathBuf {
    PathBuf::from(".arb-dashboard/api_key")
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_http_timeout() -> u64 {
    10_000
}

fn default_poll_interval() -> u64 {
    30_000
}

fn default_refresh_delay() -> u64 {
    5_000
}

fn default_execute_amount() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_port() -> u16 {
    9100
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            api_key_file: default_api_key_file(),
            login_path: default_login_path(),
            http_timeout_ms: default_http_timeout(),
            poll_interval_ms: default_poll_interval(),
            refresh_delay_ms: default_refresh_delay(),
            execute_amount: default_execute_amount(),
            wallet_address: None,
            port: default_port(),
            status_server: true,
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Load, apply an API URL override, and validate.
    pub fn load_validated(api_url: Option<String>) -> crate::Result<Self> {
        Self::load()?.with_api_url(api_url).validated()
    }

    /// Replace the API base URL when `api_url` is given.
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        if let Some(api_url) = api_url {
            self.api_url = api_url;
        }
        self
    }

    /// Return the configuration if it passes [`Config::validate`].
    pub fn validated(self) -> crate::Result<Self> {
        self.validate().map_err(DashboardError::InvalidConfig)?;
        Ok(self)
    }

    /// Log filter directive: crate debug when verbose, else `rust_log`.
    pub fn log_filter(&self) -> String {
        if self.verbose {
            "arb_dashboard=debug,info".to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.api_url).map_err(|e| format!("API_URL is invalid: {}", e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err("API_URL must use http or https".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("POLL_INTERVAL_MS must be greater than 0".to_string());
        }

        if self.execute_amount <= Decimal::ZERO {
            return Err("EXECUTE_AMOUNT must be positive".to_string());
        }

        if !self.login_path.starts_with('/') {
            return Err("LOGIN_PATH must start with /".to_string());
        }

        Ok(())
    }

    /// Parsed API base URL.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.api_url)
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Post-execution refresh delay as a duration.
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    /// HTTP request timeout as a duration.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}
