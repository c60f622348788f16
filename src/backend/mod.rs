//! Backend module for the arbitrage platform API.
//!
//! This module handles:
//! - Wire types for opportunities, executions, and users
//! - The HTTP client with bearer auth and forced logout on 401
//! - Mock backend for testing

pub mod client;
pub mod mock;
pub mod types;

use async_trait::async_trait;

use crate::error::ApiError;

pub use client::ArbitrageClient;
pub use mock::{MockArbitrageBackend, MockConfig, MockOpportunityBuilder};
pub use types::{
    ExecuteRequest, ExecuteResponse, ExecutionStatus, HealthStatus, Opportunity, User,
    UserCreateRequest,
};

/// The two backend calls the dashboard depends on.
#[async_trait]
pub trait ArbitrageBackend: Send + Sync + 'static {
    /// Fetch the current opportunity list.
    async fn fetch_opportunities(&self) -> Result<Vec<Opportunity>, ApiError>;

    /// Request execution of one opportunity.
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError>;
}
