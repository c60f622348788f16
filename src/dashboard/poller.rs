//! Periodic opportunity polling tied to the dashboard's mount lifecycle.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::controller::Dashboard;
use crate::backend::ArbitrageBackend;

/// Handle to a mounted dashboard. Dropping it leaves polling running;
/// call [`MountHandle::unmount`] to stop.
#[derive(Debug)]
pub struct MountHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MountHandle {
    /// Whether the poll task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel polling and any pending delayed refresh, then wait for the
    /// poll task to exit. An in-flight fetch is allowed to finish.
    pub async fn unmount(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Poll task ended abnormally");
        }
    }
}

impl<B: ArbitrageBackend> Dashboard<B> {
    /// Fetch now, then every poll interval until unmounted.
    pub fn mount(&self) -> MountHandle {
        let token = CancellationToken::new();
        {
            let mut lifecycle = match self.lifecycle.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *lifecycle = token.clone();
        }

        let period = self.settings.poll_interval;
        let dashboard = self.clone();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            info!(interval_ms = period.as_millis() as u64, "Opportunity polling started");
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        dashboard.refresh().await;
                    }
                }
            }

            info!("Opportunity polling stopped");
        });

        MountHandle { token, task }
    }
}
