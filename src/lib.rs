pub mod cli;
pub mod core;
pub mod providers;
pub mod resolver;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::ExchangeRateApiProvider;
use crate::resolver::RateResolver;
use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Rate { base: String, target: String },
    Convert { amount: Decimal, from: String, to: String },
    Ticker,
    Refresh,
}

/// Wires the configured store and provider into a resolver.
pub fn build_resolver(config: &AppConfig) -> Result<RateResolver> {
    let store = store::open_store(config)?;
    let provider = Arc::new(ExchangeRateApiProvider::new(&config.provider_config())?);
    Ok(RateResolver::new(store, provider, config.resolver_config()))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxcache starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let resolver = build_resolver(&config)?;

    match command {
        AppCommand::Rate { base, target } => cli::rates::show_rate(&resolver, &base, &target).await,
        AppCommand::Convert { amount, from, to } => {
            cli::rates::show_conversion(&resolver, amount, &from, &to).await
        }
        AppCommand::Ticker => cli::rates::show_ticker(&resolver).await,
        AppCommand::Refresh => cli::rates::refresh(&resolver).await,
    }
}
