//! Observability hook for rate resolution

use super::provider::FetchError;
use super::rate::CurrencyPair;
use rust_decimal::Decimal;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum RateEvent {
    CacheHit {
        pair: CurrencyPair,
    },
    CacheMiss {
        pair: CurrencyPair,
        /// True when an entry existed but was older than the ttl.
        stale: bool,
    },
    Fetched {
        pair: CurrencyPair,
        rate: Decimal,
    },
    FetchFailed {
        pair: CurrencyPair,
        error: FetchError,
    },
    ServedStale {
        pair: CurrencyPair,
        rate: Decimal,
        age_secs: i64,
    },
    ServedFallback {
        pair: CurrencyPair,
    },
    StoreFailed {
        pair: CurrencyPair,
        operation: &'static str,
        message: String,
    },
    Evicted {
        pair: CurrencyPair,
    },
}

pub trait RateObserver: Send + Sync {
    fn on_event(&self, event: &RateEvent);
}

/// Default observer that writes every event to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RateObserver for TracingObserver {
    fn on_event(&self, event: &RateEvent) {
        match event {
            RateEvent::CacheHit { pair } => debug!(%pair, "Rate cache HIT"),
            RateEvent::CacheMiss { pair, stale } => debug!(%pair, stale, "Rate cache MISS"),
            RateEvent::Fetched { pair, rate } => debug!(%pair, %rate, "Fetched rate from provider"),
            RateEvent::FetchFailed { pair, error } => warn!(
                %pair,
                kind = error.kind(),
                error = %error,
                "Rate fetch failed"
            ),
            RateEvent::ServedStale {
                pair,
                rate,
                age_secs,
            } => warn!(%pair, %rate, age_secs, "Serving stale rate"),
            RateEvent::ServedFallback { pair } => {
                warn!(%pair, "No cached rate available, serving neutral rate 1")
            }
            RateEvent::StoreFailed {
                pair,
                operation,
                message,
            } => warn!(%pair, operation, error = %message, "Rate store operation failed"),
            RateEvent::Evicted { pair } => debug!(%pair, "Evicted cached rate"),
        }
    }
}
