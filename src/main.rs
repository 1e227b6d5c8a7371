use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxcache::cli::setup::setup;
use fxcache::core::log::init_logging;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxcache::AppCommand {
    fn from(cmd: Commands) -> fxcache::AppCommand {
        match cmd {
            Commands::Rate { base, target } => fxcache::AppCommand::Rate { base, target },
            Commands::Convert { amount, from, to } => {
                fxcache::AppCommand::Convert { amount, from, to }
            }
            Commands::Ticker => fxcache::AppCommand::Ticker,
            Commands::Refresh => fxcache::AppCommand::Refresh,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the exchange rate for a currency pair
    Rate {
        /// Currency to convert from, e.g. USD
        base: String,
        /// Currency to convert to, e.g. EUR
        target: String,
    },
    /// Convert an amount between currencies
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
    /// Show rates for the configured ticker currencies
    Ticker,
    /// Refetch rates for all ticker currencies
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => fxcache::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
