//! Cross-chain arbitrage dashboard client.
//!
//! Polls an arbitrage platform's opportunity feed, derives summary
//! statistics, renders them in the terminal, and lets the user trigger
//! executions of profitable opportunities.
//!
//! # Authentication
//!
//! Every backend request carries the stored API key as a bearer token. If
//! the backend answers 401, the key is purged and the user is sent to the
//! login route before the error reaches the caller.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`session`]: Base URL, credential storage, and forced logout
//! - [`backend`]: Wire types, HTTP client, and mock backend
//! - [`dashboard`]: Polling, stats, execution, and rendering
//! - [`api`]: Local HTTP API for health/stats/metrics
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Signals and interactive input

pub mod api;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod metrics;
pub mod session;
pub mod utils;

pub use config::Config;
pub use error::{DashboardError, Result};
