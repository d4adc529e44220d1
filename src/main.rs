//! fxband: a margin-aware Bollinger-band breakout bot for OANDA FX accounts.
//!
//! Watches a set of currency pairs, opens a market order with
//! volatility-derived stop-loss/take-profit/trailing-stop whenever the most
//! recent midpoint close breaks out of a mean +/- k*sigma band, and sizes
//! every order against the account's margin budget.

mod api;
mod error;
mod models;
mod trading;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::{Broker, OandaClient};
use crate::trading::{RunnerConfig, SignalEvaluator, TradeConfig, TradeRunner};

/// Band-breakout trading against an OANDA account.
#[derive(Parser)]
#[command(name = "fxband")]
#[command(about = "Band-breakout trading against an OANDA account", long_about = None)]
struct Cli {
    /// OANDA environment (practice or live)
    #[arg(long, env = "OANDA_ENV", default_value = "practice")]
    environment: String,

    /// OANDA API access token
    #[arg(long, env = "OANDA_API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// OANDA account id
    #[arg(long, env = "OANDA_ACCOUNT_ID")]
    account_id: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Path to a JSON trade configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the configured instruments and open deals on breakouts
    Open {
        /// Instruments to trade (defaults to the configured universe)
        #[arg(short, long)]
        instruments: Vec<String>,

        /// Maximum number of polling iterations
        #[arg(short = 'n', long, default_value = "10")]
        iterations: usize,

        /// Seconds to sleep between iterations
        #[arg(long, default_value = "2")]
        interval: u64,

        /// Suppress status lines (log them at debug instead)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show account currency and margin state
    Account,

    /// List tradable instruments
    Instruments,

    /// Print the effective trade configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let trade_config = match &cli.config {
        Some(path) => TradeConfig::from_json_file(path)?,
        None => TradeConfig::default(),
    };

    let broker = OandaClient::new(&cli.environment, &cli.api_token, &cli.account_id)?;

    match cli.command {
        Commands::Open {
            instruments,
            iterations,
            interval,
            quiet,
        } => {
            let instruments = if instruments.is_empty() {
                trade_config.instruments.clone()
            } else {
                instruments
            };
            info!(
                environment = %cli.environment,
                iterations,
                interval,
                instruments = ?instruments,
                "Starting polling loop"
            );

            let evaluator = SignalEvaluator::new(broker, trade_config).await?;
            info!(currency = %evaluator.account_currency(), "Evaluator initialized");
            let runner = TradeRunner::new(
                evaluator,
                instruments,
                RunnerConfig {
                    iterations,
                    interval: Duration::from_secs(interval),
                    quiet,
                },
            );
            runner.run().await?;
        }

        Commands::Account => {
            let account = broker.account().await?;
            println!("Currency:         {}", account.currency);
            println!("Margin Available: {:.2}", account.margin_avail);
            println!("Margin Used:      {:.2}", account.margin_used);
            println!(
                "Margin Total:     {:.2}",
                account.margin_avail + account.margin_used
            );
        }

        Commands::Instruments => {
            for instrument in broker.instrument_list().await? {
                println!("{instrument}");
            }
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&trade_config)?);
        }
    }

    Ok(())
}
