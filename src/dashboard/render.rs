//! Plain-text rendering of the dashboard.

use std::fmt::Write;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use time::macros::format_description;

use super::format::{format_percentage, format_price, format_short_id, format_token_address};
use super::state::DashboardSnapshot;
use crate::backend::Opportunity;

/// Number of opportunities plotted in the profit chart.
pub const CHART_ENTRIES: usize = 10;
/// Width of the longest chart bar.
const CHART_WIDTH: usize = 40;
const RULE: &str = "======================================================================";

/// Render the whole dashboard.
pub fn render(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let state = &snapshot.state;

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "CROSS-CHAIN ARBITRAGE PLATFORM");
    let _ = writeln!(out, "Real-time arbitrage opportunities across multiple blockchains");
    let _ = writeln!(out, "{}", RULE);

    if state.loading {
        let _ = writeln!(out, "Loading opportunities...");
        return out;
    }

    if let Some(updated) = state.last_updated {
        let format = format_description!("[hour]:[minute]:[second] UTC");
        if let Ok(ts) = updated.format(format) {
            let _ = writeln!(out, "Last updated: {}", ts);
        }
    }

    render_stats(&mut out, snapshot);
    render_table(&mut out, snapshot);

    if !state.opportunities.is_empty() {
        render_chart(&mut out, &state.opportunities);
    }

    out
}

fn render_stats(out: &mut String, snapshot: &DashboardSnapshot) {
    let stats = &snapshot.state.stats;
    let _ = writeln!(
        out,
        "{:<22} {:<24} {:<18} {}",
        "Active Opportunities", "Total Profit Potential", "Best Opportunity", "Avg Confidence"
    );
    let _ = writeln!(
        out,
        "{:<22} {:<24} {:<18} {}",
        stats.total_opportunities,
        format_price(stats.total_profit_potential),
        format_price(stats.best_opportunity),
        format_percentage(stats.average_confidence)
    );
    let _ = writeln!(out);
}

fn render_table(out: &mut String, snapshot: &DashboardSnapshot) {
    let _ = writeln!(out, "Arbitrage Opportunities");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "{:>3}  {:<19} {:<10} {:<10} {:>10} {:>14} {:>10}  {}",
        "#", "TOKEN", "SOURCE", "TARGET", "PRICE DIFF", "NET PROFIT", "CONFIDENCE", "ACTION"
    );

    for (i, opp) in snapshot.state.opportunities.iter().enumerate() {
        let price_diff = opp
            .price_difference_ratio()
            .map(format_percentage)
            .unwrap_or_else(|| "-".to_string());

        let _ = writeln!(
            out,
            "{:>3}  {:<19} {:<10} {:<10} {:>10} {:>14} {:>10}  {}",
            i + 1,
            format_token_address(&opp.token_address),
            opp.source_chain,
            opp.target_chain,
            price_diff,
            format_price(opp.net_profit),
            format_percentage(opp.confidence_score),
            action_label(snapshot, opp)
        );
    }

    if snapshot.state.opportunities.is_empty() {
        let _ = writeln!(out, "No arbitrage opportunities found at the moment.");
    }
    let _ = writeln!(out);
}

/// Label for the action column.
pub fn action_label(snapshot: &DashboardSnapshot, opportunity: &Opportunity) -> &'static str {
    if snapshot.is_executing(&opportunity.id) {
        "Executing..."
    } else if snapshot.can_execute(opportunity) {
        "Execute"
    } else {
        "-"
    }
}

fn render_chart(out: &mut String, opportunities: &[Opportunity]) {
    let shown = &opportunities[..opportunities.len().min(CHART_ENTRIES)];
    let max = shown
        .iter()
        .map(|o| o.net_profit)
        .fold(Decimal::ZERO, Decimal::max);

    let _ = writeln!(out, "Profit Distribution");
    let _ = writeln!(out, "{}", RULE);
    for opp in shown {
        let _ = writeln!(
            out,
            "{:<12} {:<width$} {}",
            format_short_id(&opp.id),
            bar(opp.net_profit, max),
            format_price(opp.net_profit),
            width = CHART_WIDTH
        );
    }
}

/// Bar proportional to `value / max`; non-positive values get no bar.
fn bar(value: Decimal, max: Decimal) -> String {
    if value <= Decimal::ZERO || max <= Decimal::ZERO {
        return String::new();
    }
    let ratio = (value / max).to_f64().unwrap_or(0.0);
    let len = ((ratio * CHART_WIDTH as f64).round() as usize).clamp(1, CHART_WIDTH);
    "#".repeat(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockOpportunityBuilder;
    use crate::dashboard::state::DashboardState;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn snapshot(opportunities: Vec<Opportunity>) -> DashboardSnapshot {
        let mut state = DashboardState::default();
        state.apply(opportunities);
        DashboardSnapshot {
            state,
            executing: BTreeSet::new(),
        }
    }

    #[test]
    fn loading_state_renders_only_header() {
        let snapshot = DashboardSnapshot {
            state: DashboardState::default(),
            executing: BTreeSet::new(),
        };
        let text = render(&snapshot);
        assert!(text.contains("Loading opportunities..."));
        assert!(!text.contains("Arbitrage Opportunities"));
    }

    #[test]
    fn table_shows_formatted_rows() {
        let snap = snapshot(vec![MockOpportunityBuilder::new("opp-1")
            .token("0x1234567890abcdef")
            .prices(dec!(2), dec!(2.05))
            .net_profit(dec!(1234.5))
            .confidence(dec!(0.85))
            .build()]);

        let text = render(&snap);

        assert!(text.contains("0x123456...abcdef"));
        assert!(text.contains("2.50%"));
        assert!(text.contains("$1,234.50"));
        assert!(text.contains("85.00%"));
        assert!(text.contains("Execute"));
        assert!(text.contains("Profit Distribution"));
    }

    #[test]
    fn empty_list_shows_message_and_no_chart() {
        let text = render(&snapshot(Vec::new()));
        assert!(text.contains("No arbitrage opportunities found at the moment."));
        assert!(!text.contains("Profit Distribution"));
    }

    #[test]
    fn action_label_reflects_state() {
        let profitable = MockOpportunityBuilder::new("a").net_profit(dec!(5)).build();
        let losing = MockOpportunityBuilder::new("b").net_profit(dec!(-5)).build();
        let mut snap = snapshot(vec![profitable.clone(), losing.clone()]);

        assert_eq!(action_label(&snap, &profitable), "Execute");
        assert_eq!(action_label(&snap, &losing), "-");

        snap.executing.insert("a".to_string());
        assert_eq!(action_label(&snap, &profitable), "Executing...");
    }

    #[test]
    fn extreme_values_render_without_panicking() {
        let huge = MockOpportunityBuilder::new("huge")
            .prices(dec!(1), Decimal::MAX)
            .net_profit(Decimal::MAX)
            .confidence(Decimal::MAX)
            .build();
        let snap = snapshot(vec![huge.clone(), huge]);

        let text = render(&snap);

        assert_eq!(snap.state.stats.total_profit_potential, Decimal::MAX);
        assert!(text.contains("$79,228,162,514,264,337,593,543,950,335.00"));
        assert!(text.contains("Profit Distribution"));
    }

    #[test]
    fn chart_is_limited_and_scaled() {
        let list: Vec<_> = (1..=12)
            .map(|i| {
                MockOpportunityBuilder::new(format!("opportunity-{:02}", i))
                    .net_profit(Decimal::from(i))
                    .build()
            })
            .collect();

        let text = render(&snapshot(list));
        let chart = text.split("Profit Distribution").nth(1).unwrap();

        assert_eq!(chart.matches("opportun...").count(), CHART_ENTRIES);
        assert_eq!(bar(dec!(10), dec!(10)).len(), CHART_WIDTH);
        assert_eq!(bar(dec!(5), dec!(10)).len(), CHART_WIDTH / 2);
        assert_eq!(bar(dec!(-1), dec!(10)), "");
    }
}
