//! Signal Relay - Main Entry Point
//!
//! Runs the TradingView webhook server and the Telegram command bot in one
//! process.

use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use signal_relay::config::{load_config, load_from_env};
use signal_relay::server::{RateLimitConfig, RateLimiter};
use signal_relay::{
    router, AppConfig, AppState, BybitRestClient, CommandHandler, ExchangeApi, Notifier, SignalPipeline,
    TelegramBot, TelegramNotifier,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file; flat environment variables are used when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args_with_dotenv(None, std::env::args_os()).unwrap_or_else(|e| e.exit());

    init_tracing(&args.log_level)?;

    info!("Starting signal relay");

    let config = match load(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        std::process::exit(1);
    }

    info!(
        testnet = config.bybit.testnet,
        category = %config.trading.category,
        account_type = %config.trading.account_type,
        "configuration loaded"
    );

    let timeout = Duration::from_secs(config.settings.request_timeout_seconds);
    let exchange: Arc<dyn ExchangeApi> = Arc::new(BybitRestClient::from_config(&config.bybit, timeout)?);
    let telegram = TelegramNotifier::with_timeout(&config.telegram, timeout)?;
    let notifier: Arc<dyn Notifier> = Arc::new(telegram.clone());

    let pipeline = SignalPipeline::new(Arc::clone(&exchange), notifier, config.trading.clone());
    let state = AppState::new(pipeline, Arc::clone(&exchange), RateLimitConfig::from(&config.server));
    spawn_rate_limit_cleanup(state.limiter.clone());

    let bot = Arc::new(TelegramBot::new(
        telegram,
        CommandHandler::new(Arc::clone(&exchange)),
        config.telegram.authorized_ids(),
    ));
    let bot_task = tokio::spawn(bot.start_polling());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Webhook server listening on http://{}", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    bot_task.abort();
    info!("Shutdown complete");

    Ok(())
}

/// Load `.env` (or `env_file`) first so its variables reach the clap `env` fallbacks
fn parse_args_with_dotenv<I, T>(env_file: Option<&Path>, argv: I) -> std::result::Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    if let Some(path) = env_file {
        dotenvy::from_path(path).ok();
    } else {
        dotenvy::dotenv().ok();
    }
    Args::try_parse_from(argv)
}

fn load(args: &Args) -> signal_relay::Result<AppConfig> {
    match &args.config {
        Some(path) => {
            info!("Configuration file: {}", path);
            load_config(Some(path))
        }
        None => load_from_env(),
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(true)
            .init();
        return Ok(());
    }

    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Periodically forget clients whose window has expired
fn spawn_rate_limit_cleanup(limiter: RateLimiter) {
    let every = limiter.config().window;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, stopping server...");
}
