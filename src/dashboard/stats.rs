//! Aggregate statistics over the visible opportunity list.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::backend::Opportunity;

/// Summary shown above the opportunity table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Number of opportunities.
    pub total_opportunities: usize,
    /// Sum of net profit over all opportunities.
    pub total_profit_potential: Decimal,
    /// Net profit of the first (top-ranked) opportunity.
    pub best_opportunity: Decimal,
    /// Mean confidence score.
    pub average_confidence: Decimal,
}

impl Stats {
    /// Compute stats for a list. Returns `None` for an empty list.
    pub fn from_opportunities(opportunities: &[Opportunity]) -> Option<Self> {
        let first = opportunities.first()?;
        let count = opportunities.len();

        // sums saturate at the Decimal range instead of panicking
        let total_profit_potential = opportunities
            .iter()
            .fold(Decimal::ZERO, |acc, o| acc.saturating_add(o.net_profit));
        let confidence_sum = opportunities
            .iter()
            .fold(Decimal::ZERO, |acc, o| acc.saturating_add(o.confidence_score));

        Some(Self {
            total_opportunities: count,
            total_profit_potential,
            best_opportunity: first.net_profit,
            average_confidence: confidence_sum / Decimal::from(count),
        })
    }

    /// Recompute from `opportunities`, keeping the previous values when the
    /// list is empty.
    pub fn update(&mut self, opportunities: &[Opportunity]) {
        if let Some(stats) = Self::from_opportunities(opportunities) {
            *self = stats;
        }
    }
}
