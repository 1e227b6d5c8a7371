use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Levels used for this crate's target and for everything else.
fn levels(verbose: bool) -> (LevelFilter, &'static str) {
    if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        // Fallbacks are still worth seeing without --verbose
        (LevelFilter::WARN, "warn")
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let (crate_level, default_level) = levels(verbose);
    let crate_filter = Targets::new()
        .with_target(env!("CARGO_CRATE_NAME"), crate_level)
        .with_default(LevelFilter::WARN);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(crate_filter)
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(levels(true), (LevelFilter::DEBUG, "debug"));
        assert_eq!(levels(false), (LevelFilter::WARN, "warn"));
    }
}
