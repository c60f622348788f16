//! In-memory dashboard state.

use std::collections::BTreeSet;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::stats::Stats;
use crate::backend::Opportunity;

/// State shared between the poller, executions, and readers.
pub type SharedState = Arc<RwLock<DashboardState>>;

/// Opportunity list and the values derived from it.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// Last successfully fetched opportunities, in backend order.
    pub opportunities: Vec<Opportunity>,
    /// Stats derived from the list.
    pub stats: Stats,
    /// True until the first fetch attempt settles.
    pub loading: bool,
    /// Time of the last successful fetch.
    pub last_updated: Option<OffsetDateTime>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            opportunities: Vec::new(),
            stats: Stats::default(),
            loading: true,
            last_updated: None,
        }
    }
}

impl DashboardState {
    /// Create shared state.
    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::default()))
    }

    /// Replace the list and recompute stats.
    pub fn apply(&mut self, opportunities: Vec<Opportunity>) {
        self.opportunities = opportunities;
        self.stats.update(&self.opportunities);
        self.loading = false;
        self.last_updated = Some(OffsetDateTime::now_utc());
    }

    /// Look up an opportunity by id.
    pub fn find(&self, id: &str) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    /// Whether at least one fetch succeeded.
    pub fn is_ready(&self) -> bool {
        self.last_updated.is_some()
    }
}

/// Point-in-time copy of everything the renderer needs.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    /// Dashboard state.
    pub state: DashboardState,
    /// Ids with an execution in flight.
    pub executing: BTreeSet<String>,
}

impl DashboardSnapshot {
    /// Whether the execute action is available for `opportunity`.
    pub fn can_execute(&self, opportunity: &Opportunity) -> bool {
        opportunity.is_profitable() && !self.executing.contains(&opportunity.id)
    }

    /// Whether `id` has an execution in flight.
    pub fn is_executing(&self, id: &str) -> bool {
        self.executing.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockOpportunityBuilder;
    use rust_decimal_macros::dec;

    #[test]
    fn apply_updates_stats_and_loading() {
        let mut state = DashboardState::default();
        assert!(state.loading);
        assert!(!state.is_ready());

        state.apply(vec![
            MockOpportunityBuilder::new("a").net_profit(dec!(3)).build(),
            MockOpportunityBuilder::new("b").net_profit(dec!(4)).build(),
        ]);

        assert!(!state.loading);
        assert!(state.is_ready());
        assert_eq!(state.stats.total_opportunities, 2);
        assert_eq!(state.find("b").map(|o| o.net_profit), Some(dec!(4)));
    }

    #[test]
    fn empty_fetch_clears_list_but_keeps_stats() {
        let mut state = DashboardState::default();
        state.apply(vec![MockOpportunityBuilder::new("a").net_profit(dec!(3)).build()]);

        state.apply(Vec::new());

        assert!(state.opportunities.is_empty());
        assert_eq!(state.stats.total_opportunities, 1);
        assert_eq!(state.stats.total_profit_potential, dec!(3));
    }

    #[test]
    fn snapshot_execute_gating() {
        let profitable = MockOpportunityBuilder::new("a").net_profit(dec!(1)).build();
        let break_even = MockOpportunityBuilder::new("b").net_profit(dec!(0)).build();
        let losing = MockOpportunityBuilder::new("c").net_profit(dec!(-1)).build();

        let mut snapshot = DashboardSnapshot {
            state: DashboardState::default(),
            executing: BTreeSet::new(),
        };
        assert!(snapshot.can_execute(&profitable));
        assert!(!snapshot.can_execute(&break_even));
        assert!(!snapshot.can_execute(&losing));

        snapshot.executing.insert("a".to_string());
        assert!(!snapshot.can_execute(&profitable));
        assert!(snapshot.is_executing("a"));
    }
}
