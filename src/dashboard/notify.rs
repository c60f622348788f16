//! User-facing notifications raised by execution attempts.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

use rust_decimal::Decimal;

use super::format::format_price;

/// Outcome of an execution attempt, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The backend started executing the opportunity.
    ExecutionStarted {
        /// Opportunity id.
        opportunity_id: String,
        /// Profit the backend expects.
        estimated_profit: Decimal,
        /// Backend message.
        message: String,
    },
    /// The request failed or the backend did not start execution.
    ExecutionFailed {
        /// Opportunity id.
        opportunity_id: String,
        /// What went wrong.
        reason: String,
    },
}

impl Notification {
    /// Whether this reports success.
    pub fn is_success(&self) -> bool {
        matches!(self, Notification::ExecutionStarted { .. })
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::ExecutionStarted {
                opportunity_id,
                estimated_profit,
                message,
            } => write!(
                f,
                "Arbitrage execution initiated! [{}] est. profit {} ({})",
                opportunity_id,
                format_price(*estimated_profit),
                message
            ),
            Notification::ExecutionFailed {
                opportunity_id,
                reason,
            } => write!(f, "Error executing arbitrage [{}]: {}", opportunity_id, reason),
        }
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    /// Present a notification to the user.
    fn notify(&self, notification: &Notification);
}

/// Prints notifications as a framed alert on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "\n!! {}\n", notification);
        let _ = out.flush();
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn notification_messages() {
        let started = Notification::ExecutionStarted {
            opportunity_id: "a".to_string(),
            estimated_profit: dec!(12.5),
            message: "Arbitrage execution initiated".to_string(),
        };
        assert!(started.is_success());
        assert_eq!(
            started.to_string(),
            "Arbitrage execution initiated! [a] est. profit $12.50 (Arbitrage execution initiated)"
        );

        let failed = Notification::ExecutionFailed {
            opportunity_id: "b".to_string(),
            reason: "unexpected status queued".to_string(),
        };
        assert!(!failed.is_success());
        assert!(failed.to_string().starts_with("Error executing arbitrage"));
    }

    #[test]
    fn recorder_keeps_order() {
        let recorder = RecordingNotifier::new();
        let n = Notification::ExecutionFailed {
            opportunity_id: "x".to_string(),
            reason: "boom".to_string(),
        };
        recorder.notify(&n);
        recorder.notify(&n);
        assert_eq!(recorder.received(), vec![n.clone(), n]);
    }
}
