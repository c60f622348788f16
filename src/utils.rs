//! Process signals and interactive input.

use tracing::{info, warn};

/// Resolve when the process receives Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// A command typed into the interactive dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Execute by 1-based table row.
    ExecuteRow(usize),
    /// Execute by opportunity id.
    ExecuteId(String),
    /// Fetch now.
    Refresh,
    /// Leave the dashboard.
    Quit,
    /// Show the key help.
    Help,
}

/// Parse one line of interactive input. Blank or unknown lines give `None`.
pub fn parse_input(line: &str) -> Option<InputCommand> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?.to_ascii_lowercase();

    match verb.as_str() {
        "x" | "exec" | "execute" => {
            let target = parts.next()?;
            Some(match target.parse::<usize>() {
                Ok(row) if row > 0 => InputCommand::ExecuteRow(row),
                _ => InputCommand::ExecuteId(target.to_string()),
            })
        }
        "r" | "refresh" => Some(InputCommand::Refresh),
        "q" | "quit" | "exit" => Some(InputCommand::Quit),
        "h" | "help" | "?" => Some(InputCommand::Help),
        _ => None,
    }
}
