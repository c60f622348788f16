//! Dashboard module: opportunity polling, stats, execution, and display.
//!
//! This module handles:
//! - Shared state and derived statistics
//! - The cancellable poll task and delayed refreshes
//! - Execution with a per-opportunity in-flight guard
//! - Formatting and plain-text rendering

pub mod controller;
pub mod format;
pub mod notify;
pub mod poller;
pub mod render;
pub mod state;
pub mod stats;

pub use controller::{Dashboard, DashboardSettings, ExecuteOutcome, SkipReason};
pub use format::{format_percentage, format_price, format_token_address};
pub use notify::{Notification, Notifier, RecordingNotifier, TerminalNotifier};
pub use poller::MountHandle;
pub use render::render;
pub use state::{DashboardSnapshot, DashboardState, SharedState};
pub use stats::Stats;
