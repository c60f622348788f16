//! Mock arbitrage backend for unit testing.
//!
//! This module provides a backend that can be used in tests
//! without making real network requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::error::ApiError;

use super::types::{ExecuteRequest, ExecuteResponse, Opportunity};
use super::ArbitrageBackend;

/// Configuration for mock backend behavior.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Whether to fail opportunity fetches.
    pub fail_fetch: bool,
    /// Whether to fail execute requests.
    pub fail_execute: bool,
    /// Answer fetches and executes with 401.
    pub unauthorized: bool,
    /// Status string returned by execute.
    pub execute_status: String,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fail_fetch: false,
            fail_execute: false,
            unauthorized: false,
            execute_status: "execution_started".to_string(),
            latency_ms: 0,
        }
    }
}

/// Mock arbitrage backend for testing.
#[derive(Debug, Clone, Default)]
pub struct MockArbitrageBackend {
    /// Mock configuration.
    config: Arc<Mutex<MockConfig>>,
    /// Opportunities returned by fetches.
    opportunities: Arc<Mutex<Vec<Opportunity>>>,
    /// Execute requests received, in order.
    executions: Arc<Mutex<Vec<ExecuteRequest>>>,
    /// Number of fetches served.
    fetches: Arc<AtomicU64>,
}

impl MockArbitrageBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock backend with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            ..Self::default()
        }
    }

    /// Replace the opportunities returned by fetches.
    pub fn set_opportunities(&self, opportunities: Vec<Opportunity>) {
        *self.opportunities.lock().unwrap() = opportunities;
    }

    /// Change mock behavior after construction.
    pub fn configure(&self, f: impl FnOnce(&mut MockConfig)) {
        f(&mut self.config.lock().unwrap());
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Execute requests received so far.
    pub fn executions(&self) -> Vec<ExecuteRequest> {
        self.executions.lock().unwrap().clone()
    }

    fn current_config(&self) -> MockConfig {
        self.config.lock().unwrap().clone()
    }

    async fn simulate_latency(&self, latency_ms: u64) {
        if latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(latency_ms)).await;
        }
    }
}

#[async_trait]
impl ArbitrageBackend for MockArbitrageBackend {
    async fn fetch_opportunities(&self) -> Result<Vec<Opportunity>, ApiError> {
        let config = self.current_config();
        self.simulate_latency(config.latency_ms).await;
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if config.unauthorized {
            return Err(ApiError::Unauthorized {
                endpoint: "/api/v1/opportunities".to_string(),
            });
        }

        if config.fail_fetch {
            return Err(ApiError::Status {
                endpoint: "/api/v1/opportunities".to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "Mock fetch failure".to_string(),
            });
        }

        Ok(self.opportunities.lock().unwrap().clone())
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
        let config = self.current_config();
        self.executions.lock().unwrap().push(request.clone());
        self.simulate_latency(config.latency_ms).await;

        if config.unauthorized {
            return Err(ApiError::Unauthorized {
                endpoint: "/api/v1/execute".to_string(),
            });
        }

        if config.fail_execute {
            return Err(ApiError::Status {
                endpoint: "/api/v1/execute".to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "Mock execute failure".to_string(),
            });
        }

        let estimated_profit = self
            .opportunities
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == request.opportunity_id)
            .map(|o| o.net_profit)
            .unwrap_or(Decimal::ZERO);

        Ok(ExecuteResponse {
            status: config.execute_status,
            opportunity_id: request.opportunity_id.clone(),
            estimated_profit,
            transaction_hash: None,
            message: "Mock execution".to_string(),
        })
    }
}

/// Builder for opportunity fixtures.
pub struct MockOpportunityBuilder {
    opportunity: Opportunity,
}

impl MockOpportunityBuilder {
    /// Start an opportunity with the given id and neutral defaults.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            opportunity: Opportunity {
                id: id.into(),
                token_address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
                source_chain: "ethereum".to_string(),
                target_chain: "polygon".to_string(),
                source_price: Decimal::ONE,
                target_price: Decimal::ONE,
                price_difference: Decimal::ZERO,
                profit_potential: Decimal::ZERO,
                gas_estimate: Decimal::ZERO,
                net_profit: Decimal::ZERO,
                confidence_score: Decimal::ZERO,
                timestamp: OffsetDateTime::UNIX_EPOCH,
            },
        }
    }

    /// Set the token address.
    pub fn token(mut self, address: impl Into<String>) -> Self {
        self.opportunity.token_address = address.into();
        self
    }

    /// Set source and target chains.
    pub fn chains(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.opportunity.source_chain = source.into();
        self.opportunity.target_chain = target.into();
        self
    }

    /// Set prices; the difference is derived.
    pub fn prices(mut self, source: Decimal, target: Decimal) -> Self {
        self.opportunity.source_price = source;
        self.opportunity.target_price = target;
        self.opportunity.price_difference = (target - source).abs();
        self
    }

    /// Set net profit.
    pub fn net_profit(mut self, net_profit: Decimal) -> Self {
        self.opportunity.net_profit = net_profit;
        self
    }

    /// Set confidence score.
    pub fn confidence(mut self, confidence: Decimal) -> Self {
        self.opportunity.confidence_score = confidence;
        self
    }

    /// Build the opportunity.
    pub fn build(self) -> Opportunity {
        self.opportunity
    }
}
