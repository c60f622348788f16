//! Cross-chain arbitrage dashboard entry point.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use arb_dashboard::api::{create_router, AppState};
use arb_dashboard::backend::{ArbitrageBackend, ArbitrageClient, UserCreateRequest};
use arb_dashboard::config::Config;
use arb_dashboard::error::ApiError;
use arb_dashboard::dashboard::{
    render, Dashboard, DashboardSettings, DashboardSnapshot, DashboardState, ExecuteOutcome,
    Notification, Notifier, SkipReason, TerminalNotifier,
};
use arb_dashboard::metrics;
use arb_dashboard::session::{LogNavigator, Navigator, Session};
use arb_dashboard::utils::{parse_input, shutdown_signal, InputCommand};

const RULE: &str = "======================================================================";
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";
const HELP: &str = "Commands: x <row|id> to execute, r to refresh, q to quit";

/// Cross-chain arbitrage dashboard.
#[derive(Parser, Debug)]
#[command(name = "arb-dashboard")]
#[command(about = "Terminal dashboard for cross-chain arbitrage opportunities")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the interactive dashboard (default).
    Run {
        /// HTTP port for the local status server.
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not start the local status server.
        #[arg(long)]
        no_server: bool,
    },

    /// Print current opportunities once.
    Opportunities {
        /// Only show opportunities for this token address.
        #[arg(long)]
        token: Option<String>,
    },

    /// Execute one opportunity by id.
    Execute {
        /// Opportunity id.
        id: String,

        /// Amount to execute with.
        #[arg(long)]
        amount: Option<Decimal>,

        /// Wallet address to execute from.
        #[arg(long)]
        wallet: Option<String>,
    },

    /// Store an API key.
    Login {
        /// Key issued at registration.
        #[arg(long)]
        api_key: String,
    },

    /// Remove the stored API key.
    Logout,

    /// Create an account and store its API key.
    Register {
        /// Account email.
        #[arg(long)]
        email: String,

        /// Default wallet address.
        #[arg(long)]
        wallet: String,

        /// Subscription tier.
        #[arg(long)]
        tier: Option<String>,
    },

    /// Show the account the stored key belongs to.
    #[command(name = "whoami")]
    WhoAmI,

    /// Check backend health.
    Health,

    /// Check configuration validity.
    CheckConfig,
}

/// Logs the login route and stops whatever is running.
struct CliNavigator {
    shutdown: CancellationToken,
}

impl Navigator for CliNavigator {
    fn navigate(&self, url: &Url) {
        error!(login = %url, "API key rejected; run `arb-dashboard login --api-key <KEY>`");
        self.shutdown.cancel();
    }
}

/// Keeps the latest alert so it survives the next redraw.
#[derive(Default)]
struct AlertLine {
    last: Mutex<Option<String>>,
}

impl AlertLine {
    fn current(&self) -> Option<String> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl Notifier for AlertLine {
    fn notify(&self, notification: &Notification) {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(notification.to_string());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    if let Some(Command::CheckConfig) = args.command {
        init_logging(args.verbose, None);
        return cmd_check_config(args.api_url).await;
    }

    let loaded = Config::load_validated(args.api_url.clone());
    init_logging(args.verbose, loaded.as_ref().ok());
    let config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    match args.command {
        None => cmd_run(config, None, false).await,
        Some(Command::Run { port, no_server }) => cmd_run(config, port, no_server).await,
        Some(Command::Opportunities { token }) => cmd_opportunities(config, token).await,
        Some(Command::Execute { id, amount, wallet }) => {
            cmd_execute(config, id, amount, wallet).await
        }
        Some(Command::Login { api_key }) => Ok(cmd_login(config, api_key).await?),
        Some(Command::Logout) => Ok(cmd_logout(config).await?),
        Some(Command::Register { email, wallet, tier }) => {
            cmd_register(config, email, wallet, tier).await
        }
        Some(Command::WhoAmI) => cmd_whoami(config).await,
        Some(Command::Health) => cmd_health(config).await,
        Some(Command::CheckConfig) => Ok(()),
    }
}

/// Initialize logging; stdout belongs to the dashboard.
fn init_logging(verbose: bool, config: Option<&Config>) {
    let filter = match config {
        _ if verbose => EnvFilter::new("arb_dashboard=debug,info"),
        Some(config) => EnvFilter::try_new(config.log_filter())
            .unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Build the session and client. A rejected key cancels `shutdown`.
fn connect(config: &Config, shutdown: CancellationToken) -> arb_dashboard::Result<ArbitrageClient> {
    let navigator = Arc::new(CliNavigator { shutdown });
    let session = Arc::new(Session::from_config(config, navigator).map_err(ApiError::from)?);
    Ok(ArbitrageClient::new(config, session)?)
}

/// Check configuration validity.
async fn cmd_check_config(api_url: Option<String>) -> anyhow::Result<()> {
    println!("{}", RULE);
    println!("ARBITRAGE DASHBOARD - CONFIGURATION CHECK");
    println!("{}", RULE);

    print!("Loading configuration... ");
    let mut config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };
    if let Some(api_url) = api_url {
        config.api_url = api_url;
    }

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Checking API key... ");
    let session = Session::from_config(&config, Arc::new(LogNavigator))?;
    match session.token() {
        Some(_) if config.api_key.is_some() => println!("OK (from API_KEY)"),
        Some(_) => println!("OK ({})", config.api_key_file.display()),
        None => println!("MISSING (requests will be unauthenticated)"),
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  API URL: {}", config.api_url);
    println!("  Login Path: {}", config.login_path);
    println!("  Poll Interval: {}ms", config.poll_interval_ms);
    println!("  Refresh Delay: {}ms", config.refresh_delay_ms);
    println!("  Execute Amount: {}", config.execute_amount);
    println!(
        "  Wallet: {}",
        config.wallet_address.as_deref().unwrap_or("(account default)")
    );
    println!("  HTTP Timeout: {}ms", config.http_timeout_ms);
    println!(
        "  Status Server: {}",
        if config.status_server {
            format!("Enabled (port {})", config.port)
        } else {
            "Disabled".to_string()
        }
    );
    println!("{}", RULE);
    println!("CONFIGURATION CHECK PASSED");
    println!("{}", RULE);

    Ok(())
}

/// Run the interactive dashboard.
async fn cmd_run(config: Config, port: Option<u16>, no_server: bool) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let client = Arc::new(connect(&config, shutdown.clone())?);
    if client.session().token().is_none() {
        warn!("No API key stored; requests will be sent unauthenticated");
    }

    info!(api_url = %config.api_url, "Starting arbitrage dashboard");

    let alerts = Arc::new(AlertLine::default());
    let dashboard = Dashboard::new(
        client,
        alerts.clone(),
        DashboardSettings::from_config(&config),
    );

    // Start status server
    let server = if config.status_server && !no_server {
        let mut app_state = AppState::new(dashboard.state());
        match metrics::install_prometheus() {
            Ok(handle) => app_state = app_state.with_prometheus(handle),
            Err(e) => warn!(error = %e, "Failed to install Prometheus recorder"),
        }

        let addr = SocketAddr::from(([127, 0, 0, 1], port.unwrap_or(config.port)));
        let listener = TcpListener::bind(addr).await?;
        info!("Status server listening on {}", addr);

        let router = create_router(app_state);
        let stop = shutdown.clone();
        Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await
        }))
    } else {
        metrics::init_metrics();
        None
    };

    let mount = dashboard.mount();
    let mut updates = dashboard.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let signal = shutdown_signal();
    tokio::pin!(signal);

    draw(&dashboard, &alerts).await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = &mut signal => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                draw(&dashboard, &alerts).await;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_input(&line) {
                    Some(InputCommand::Quit) => break,
                    Some(InputCommand::Refresh) => {
                        let dashboard = dashboard.clone();
                        tokio::spawn(async move {
                            dashboard.refresh().await;
                        });
                    }
                    Some(InputCommand::ExecuteRow(row)) => {
                        let snapshot = dashboard.snapshot().await;
                        match snapshot.state.opportunities.get(row - 1) {
                            Some(opportunity) => spawn_execute(&dashboard, opportunity.id.clone()),
                            None => println!("No opportunity in row {}", row),
                        }
                    }
                    Some(InputCommand::ExecuteId(id)) => spawn_execute(&dashboard, id),
                    Some(InputCommand::Help) | None => println!("{}", HELP),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    stdin_open = false;
                }
            },
        }
    }

    info!("Stopping dashboard");
    shutdown.cancel();
    mount.unmount().await;

    if let Some(server) = server {
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Status server error: {}", e),
            Err(e) => error!("Status server task failed: {}", e),
        }
    }

    Ok(())
}

async fn draw<B: ArbitrageBackend>(dashboard: &Dashboard<B>, alerts: &AlertLine) {
    let snapshot = dashboard.snapshot().await;
    print!("{}{}", CLEAR_SCREEN, render(&snapshot));
    if let Some(alert) = alerts.current() {
        println!("!! {}", alert);
    }
    println!("{}", HELP);
}

fn spawn_execute<B: ArbitrageBackend>(dashboard: &Dashboard<B>, id: String) {
    let dashboard = dashboard.clone();
    tokio::spawn(async move {
        if let ExecuteOutcome::Skipped(reason) = dashboard.execute(&id).await {
            println!("{}: {}", id, skip_message(reason));
        }
    });
}

fn skip_message(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::UnknownOpportunity => "no such opportunity in the current list",
        SkipReason::NotProfitable => "not profitable, execution disabled",
        SkipReason::AlreadyExecuting => "execution already in progress",
    }
}

/// Print current opportunities once.
async fn cmd_opportunities(config: Config, token: Option<String>) -> anyhow::Result<()> {
    let client = connect(&config, CancellationToken::new())?;

    let opportunities = match &token {
        Some(token) => client.get_token_opportunities(token).await?,
        None => client.get_opportunities().await?,
    };

    let mut state = DashboardState::default();
    state.apply(opportunities);
    let snapshot = DashboardSnapshot {
        state,
        executing: Default::default(),
    };
    print!("{}", render(&snapshot));

    Ok(())
}

/// Execute one opportunity from the current list.
async fn cmd_execute(
    config: Config,
    id: String,
    amount: Option<Decimal>,
    wallet: Option<String>,
) -> anyhow::Result<()> {
    let client = Arc::new(connect(&config, CancellationToken::new())?);

    let mut settings = DashboardSettings::from_config(&config);
    if let Some(amount) = amount {
        settings.execute_amount = amount;
    }
    if wallet.is_some() {
        settings.wallet_address = wallet;
    }

    let dashboard = Dashboard::new(client, Arc::new(TerminalNotifier), settings);
    if !dashboard.refresh().await {
        return Err(anyhow::anyhow!("Failed to fetch opportunities"));
    }

    match dashboard.execute(&id).await {
        ExecuteOutcome::Started(response) => {
            println!("{}", RULE);
            println!("Status: {}", response.status);
            println!("Opportunity: {}", response.opportunity_id);
            println!("Estimated profit: {}", response.estimated_profit);
            if let Some(tx) = &response.transaction_hash {
                println!("Transaction: {}", tx);
            }
            println!("{}", RULE);
            Ok(())
        }
        ExecuteOutcome::Rejected(response) => Err(anyhow::anyhow!(
            "Execution not started: {}",
            response.status
        )),
        ExecuteOutcome::Failed(reason) => Err(anyhow::anyhow!("Execution failed: {}", reason)),
        ExecuteOutcome::Skipped(reason) => Err(anyhow::anyhow!("{}: {}", id, skip_message(reason))),
    }
}

/// Store an API key.
async fn cmd_login(config: Config, api_key: String) -> arb_dashboard::Result<()> {
    let session = Session::from_config(&config, Arc::new(LogNavigator)).map_err(ApiError::from)?;
    if config.api_key.is_some() {
        warn!("API_KEY is set in the environment; the stored key is ignored while it is");
    }
    session.login(&api_key)?;
    println!("API key stored in {}", config.api_key_file.display());
    Ok(())
}

/// Remove the stored API key.
async fn cmd_logout(config: Config) -> arb_dashboard::Result<()> {
    let session = Session::from_config(&config, Arc::new(LogNavigator)).map_err(ApiError::from)?;
    session.logout()?;
    println!("Logged out");
    Ok(())
}

/// Create an account and store its API key.
async fn cmd_register(
    config: Config,
    email: String,
    wallet: String,
    tier: Option<String>,
) -> anyhow::Result<()> {
    let client = connect(&config, CancellationToken::new())?;

    let user = client
        .create_user(&UserCreateRequest {
            email,
            wallet_address: wallet,
            tier,
        })
        .await?;

    println!("{}", RULE);
    println!("Account created: {} ({})", user.email, user.id);
    println!("Tier: {}", user.tier);
    match user.api_key.as_deref() {
        Some(key) => {
            client.session().login(key)?;
            println!("API key stored in {}", config.api_key_file.display());
        }
        None => println!("No API key returned; use `login --api-key` once you have one"),
    }
    println!("{}", RULE);

    Ok(())
}

/// Show the current account.
async fn cmd_whoami(config: Config) -> anyhow::Result<()> {
    let client = connect(&config, CancellationToken::new())?;
    let user = client.get_current_user().await?;

    println!("Email: {}", user.email);
    println!("Id: {}", user.id);
    println!("Wallet: {}", user.wallet_address);
    println!("Tier: {}", user.tier);
    println!("Active: {}", user.is_active);

    Ok(())
}

/// Check backend health.
async fn cmd_health(config: Config) -> anyhow::Result<()> {
    let client = connect(&config, CancellationToken::new())?;

    print!("Checking {}... ", config.api_url);
    match client.check_health().await {
        Ok(health) => {
            println!("{}", health.status.to_uppercase());
            if let Some(version) = &health.version {
                println!("  Version: {}", version);
            }
            if let Some(timestamp) = health.timestamp {
                println!("  Server time: {}", timestamp);
            }
            Ok(())
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            Err(anyhow::anyhow!("Health check failed"))
        }
    }
}
