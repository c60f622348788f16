//! Dashboard controller: fetching, execution, and delayed refresh.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashSet;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::notify::{Notification, Notifier};
use super::state::{DashboardSnapshot, DashboardState, SharedState};
use crate::backend::{ArbitrageBackend, ExecuteRequest, ExecuteResponse};
use crate::config::Config;
use crate::metrics;

/// Timing and execution parameters.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    /// Interval between periodic fetches.
    pub poll_interval: Duration,
    /// Delay before refetching after an accepted execution.
    pub refresh_delay: Duration,
    /// Amount sent with each execute request.
    pub execute_amount: Decimal,
    /// Wallet sent with each execute request.
    pub wallet_address: Option<String>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl DashboardSettings {
    /// Take settings from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            refresh_delay: config.refresh_delay(),
            execute_amount: config.execute_amount,
            wallet_address: config.wallet_address.clone(),
        }
    }
}

/// Why an execute action was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No opportunity with that id is currently listed.
    UnknownOpportunity,
    /// Net profit is zero or negative.
    NotProfitable,
    /// An execution for this id is already in flight.
    AlreadyExecuting,
}

/// Result of [`Dashboard::execute`].
#[derive(Debug)]
pub enum ExecuteOutcome {
    /// Backend reported `execution_started`; a refresh is scheduled.
    Started(ExecuteResponse),
    /// Backend answered with some other status.
    Rejected(ExecuteResponse),
    /// The request failed.
    Failed(String),
    /// Nothing was sent.
    Skipped(SkipReason),
}

/// Removes an id from the in-flight set when dropped.
struct InFlightGuard {
    set: Arc<DashSet<String>>,
    id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}

/// Dashboard client over an arbitrage backend.
pub struct Dashboard<B> {
    pub(super) backend: Arc<B>,
    state: SharedState,
    in_flight: Arc<DashSet<String>>,
    notifier: Arc<dyn Notifier>,
    pub(super) settings: DashboardSettings,
    /// Cancelled on unmount; parents every timer the dashboard starts.
    pub(super) lifecycle: Arc<Mutex<CancellationToken>>,
    updates: Arc<watch::Sender<u64>>,
}

impl<B> Clone for Dashboard<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            state: self.state.clone(),
            in_flight: self.in_flight.clone(),
            notifier: self.notifier.clone(),
            settings: self.settings.clone(),
            lifecycle: self.lifecycle.clone(),
            updates: self.updates.clone(),
        }
    }
}

impl<B: ArbitrageBackend> Dashboard<B> {
    /// Create a dashboard. Nothing is fetched until [`Dashboard::mount`] or
    /// [`Dashboard::refresh`] is called.
    pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>, settings: DashboardSettings) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            backend,
            state: DashboardState::shared(),
            in_flight: Arc::new(DashSet::new()),
            notifier,
            settings,
            lifecycle: Arc::new(Mutex::new(CancellationToken::new())),
            updates: Arc::new(updates),
        }
    }

    /// Shared state handle.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Settings in use.
    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Receiver that changes whenever visible state changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// Copy of the current state for rendering.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state.read().await.clone();
        let executing: BTreeSet<String> = self.in_flight.iter().map(|id| id.key().clone()).collect();
        DashboardSnapshot { state, executing }
    }

    /// Whether an execution for `id` is in flight.
    pub fn is_executing(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    /// Fetch opportunities once. Failures keep the last-known list.
    ///
    /// Returns whether the fetch succeeded.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> bool {
        let result = self.backend.fetch_opportunities().await;

        let ok = match result {
            Ok(opportunities) => {
                debug!(count = opportunities.len(), "Fetched opportunities");
                metrics::record_poll(opportunities.len());
                self.state.write().await.apply(opportunities);
                true
            }
            Err(e) => {
                metrics::inc_poll_failures();
                warn!(error = %e, "Error fetching opportunities");
                self.state.write().await.loading = false;
                false
            }
        };

        self.publish();
        ok
    }

    /// Execute the listed opportunity `id`.
    ///
    /// Sends nothing if the opportunity is unknown, unprofitable, or already
    /// executing. The in-flight mark is released however the call ends.
    #[instrument(skip(self))]
    pub async fn execute(&self, id: &str) -> ExecuteOutcome {
        let profitable = match self.state.read().await.find(id) {
            Some(opportunity) => opportunity.is_profitable(),
            None => return ExecuteOutcome::Skipped(SkipReason::UnknownOpportunity),
        };
        if !profitable {
            return ExecuteOutcome::Skipped(SkipReason::NotProfitable);
        }
        if !self.in_flight.insert(id.to_string()) {
            return ExecuteOutcome::Skipped(SkipReason::AlreadyExecuting);
        }

        let guard = InFlightGuard {
            set: self.in_flight.clone(),
            id: id.to_string(),
        };
        self.publish();

        let request = ExecuteRequest {
            opportunity_id: id.to_string(),
            amount: Some(self.settings.execute_amount),
            wallet_address: self.settings.wallet_address.clone(),
        };

        metrics::inc_executions_requested();
        let result = self.backend.execute(&request).await;

        let outcome = match result {
            Ok(response) if response.is_started() => {
                info!(
                    estimated_profit = %response.estimated_profit,
                    "Arbitrage execution initiated"
                );
                metrics::inc_executions_started();
                self.notifier.notify(&Notification::ExecutionStarted {
                    opportunity_id: response.opportunity_id.clone(),
                    estimated_profit: response.estimated_profit,
                    message: response.message.clone(),
                });
                self.schedule_refresh(self.settings.refresh_delay);
                ExecuteOutcome::Started(response)
            }
            Ok(response) => {
                warn!(status = %response.status, "Execution not started");
                metrics::inc_executions_failed();
                self.notifier.notify(&Notification::ExecutionFailed {
                    opportunity_id: id.to_string(),
                    reason: format!("unexpected status {}", response.status),
                });
                ExecuteOutcome::Rejected(response)
            }
            Err(e) => {
                error!(error = %e, "Error executing arbitrage");
                metrics::inc_executions_failed();
                let reason = e.to_string();
                self.notifier.notify(&Notification::ExecutionFailed {
                    opportunity_id: id.to_string(),
                    reason: reason.clone(),
                });
                ExecuteOutcome::Failed(reason)
            }
        };

        drop(guard);
        self.publish();
        outcome
    }

    /// Refresh once after `delay`, unless the dashboard is unmounted first.
    pub fn schedule_refresh(&self, delay: Duration) -> JoinHandle<()> {
        let token = self.lifecycle_token().child_token();
        let dashboard = self.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Delayed refresh cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    dashboard.refresh().await;
                }
            }
        })
    }

    pub(super) fn lifecycle_token(&self) -> CancellationToken {
        self.lifecycle
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn publish(&self) {
        self.updates.send_modify(|version| *version = version.wrapping_add(1));
    }
}
