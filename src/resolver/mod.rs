//! Cache-or-fetch resolution of exchange rates.
//!
//! The read path never fails: when the provider cannot deliver a rate the
//! resolver serves the last cached value, or a neutral rate of 1 when nothing
//! was ever cached, and reports what happened to its [`RateObserver`].

mod flight;

use crate::core::config::ResolverConfig;
use crate::core::events::{RateEvent, RateObserver, TracingObserver};
use crate::core::provider::{FetchError, RateProvider};
use crate::core::rate::{
    Conversion, CurrencyPair, RateEntry, RateQuote, RateSource, Resolution, TickerRates,
    normalize_code,
};
use crate::core::store::{RateStore, StoreError};
use chrono::Utc;
use flight::FlightTable;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of [`RateResolver::refresh_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub refreshed: Vec<CurrencyPair>,
    /// Pairs whose refetch failed. Their previous entry, if any, was kept.
    pub failed: Vec<CurrencyPair>,
}

/// What a finished flight hands to every task that joined it.
#[derive(Debug, Clone)]
struct Landing {
    entry: RateEntry,
    source: RateSource,
    /// Set when the fetched entry could not be written to the store.
    store_error: Option<String>,
}

type FlightOutcome = Result<Landing, FetchError>;

pub struct RateResolver {
    store: Arc<dyn RateStore>,
    provider: Arc<dyn RateProvider>,
    observer: Arc<dyn RateObserver>,
    config: ResolverConfig,
    flights: FlightTable<FlightOutcome>,
}

impl RateResolver {
    pub fn new(
        store: Arc<dyn RateStore>,
        provider: Arc<dyn RateProvider>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            store,
            provider,
            observer: Arc::new(TracingObserver),
            config,
            flights: FlightTable::default(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RateObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Rate for one `base` unit in `target`. Always returns a usable value.
    pub async fn get_rate(&self, base: &str, target: &str) -> Decimal {
        self.resolve(base, target).await.rate
    }

    /// Like [`Self::get_rate`], but `cancel` stops waiting on the provider.
    pub async fn get_rate_with_cancel(
        &self,
        base: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Decimal {
        self.resolve_with_cancel(base, target, cancel).await.rate
    }

    pub async fn resolve(&self, base: &str, target: &str) -> Resolution {
        self.resolve_pair(&CurrencyPair::new(base, target), None).await
    }

    pub async fn resolve_with_cancel(
        &self,
        base: &str,
        target: &str,
        cancel: &CancellationToken,
    ) -> Resolution {
        self.resolve_pair(&CurrencyPair::new(base, target), Some(cancel))
            .await
    }

    pub async fn quote(&self, base: &str, target: &str) -> RateQuote {
        let pair = CurrencyPair::new(base, target);
        let resolution = self.resolve_pair(&pair, None).await;
        RateQuote {
            base_currency: pair.base,
            target_currency: pair.target,
            rate: resolution.rate,
            fetched_at: resolution.fetched_at,
            source: resolution.source,
        }
    }

    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        self.conversion(amount, from, to).await.converted_amount
    }

    /// Converts `amount` and echoes the inputs and rate used back.
    pub async fn conversion(&self, amount: Decimal, from: &str, to: &str) -> Conversion {
        let pair = CurrencyPair::new(from, to);
        let (rate, converted_amount) = if pair.is_identity() {
            (Decimal::ONE, amount)
        } else {
            let rate = self.resolve_pair(&pair, None).await.rate;
            (rate, amount.saturating_mul(rate))
        };

        Conversion {
            amount,
            from_currency: pair.base,
            to_currency: pair.target,
            rate,
            converted_amount,
        }
    }

    /// Rates from the base currency to every ticker currency. A target that
    /// cannot be resolved degrades on its own without affecting the others.
    pub async fn ticker_rates(&self) -> TickerRates {
        let fetched_at = Utc::now();
        let base = normalize_code(&self.config.base_currency);

        let targets: Vec<String> = self
            .config
            .ticker_currencies
            .iter()
            .map(|c| normalize_code(c))
            .collect();
        let rates = join_all(targets.iter().map(|target| self.get_rate(&base, target))).await;

        TickerRates {
            base_currency: base,
            rates: targets.into_iter().zip(rates).collect::<HashMap<_, _>>(),
            fetched_at,
        }
    }

    /// Evicts and refetches every ticker pair.
    ///
    /// Fails when the store does, including when a refetched rate cannot be
    /// written back. A pair that cannot be refetched or stored gets its
    /// previous entry restored.
    pub async fn refresh_all(&self) -> Result<RefreshReport, StoreError> {
        let base = normalize_code(&self.config.base_currency);
        let mut report = RefreshReport::default();

        for target in &self.config.ticker_currencies {
            let pair = CurrencyPair::new(&base, target);
            if pair.is_identity() {
                continue;
            }

            let previous = self.store.get(&pair).await?;
            self.store.evict(&pair).await?;
            self.emit(RateEvent::Evicted { pair: pair.clone() });

            let outcome = self.flights.join(&pair, || self.start_flight(&pair)).await;
            match outcome {
                Ok(Landing {
                    store_error: Some(message),
                    ..
                }) => {
                    self.restore(previous).await?;
                    return Err(StoreError::Unavailable(message));
                }
                Ok(landing) => {
                    // A flight that started before the eviction lands the entry it found
                    if landing.source == RateSource::Cache {
                        self.store.put(landing.entry).await?;
                    }
                    report.refreshed.push(pair);
                }
                Err(error) => {
                    self.emit(RateEvent::FetchFailed {
                        pair: pair.clone(),
                        error,
                    });
                    self.restore(previous).await?;
                    report.failed.push(pair);
                }
            }
        }

        info!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "Refreshed ticker rates"
        );
        Ok(report)
    }

    /// [`Self::refresh_all`] reduced to a success flag.
    pub async fn refresh_all_ok(&self) -> bool {
        match self.refresh_all().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Failed to refresh rates");
                false
            }
        }
    }

    async fn resolve_pair(
        &self,
        pair: &CurrencyPair,
        cancel: Option<&CancellationToken>,
    ) -> Resolution {
        if pair.is_identity() {
            return Resolution::identity();
        }

        let cached = match self.store.get(pair).await {
            Ok(entry) => entry,
            Err(e) => {
                self.emit(RateEvent::StoreFailed {
                    pair: pair.clone(),
                    operation: "get",
                    message: e.to_string(),
                });
                None
            }
        };

        if let Some(entry) = &cached {
            if entry.is_fresh(Utc::now(), self.config.ttl) {
                self.emit(RateEvent::CacheHit { pair: pair.clone() });
                return Resolution::from_entry(entry, RateSource::Cache);
            }
        }
        self.emit(RateEvent::CacheMiss {
            pair: pair.clone(),
            stale: cached.is_some(),
        });

        let flight = self.flights.join(pair, || self.start_flight(pair));
        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::ProviderUnreachable {
                    base: pair.base.clone(),
                    reason: "Request cancelled".to_string(),
                }),
                outcome = flight => outcome,
            },
            None => flight.await,
        };

        match outcome {
            Ok(landing) => Resolution::from_entry(&landing.entry, landing.source),
            Err(error) => {
                self.emit(RateEvent::FetchFailed {
                    pair: pair.clone(),
                    error,
                });
                match cached {
                    Some(entry) => {
                        self.emit(RateEvent::ServedStale {
                            pair: pair.clone(),
                            rate: entry.rate,
                            age_secs: entry.age(Utc::now()).num_seconds(),
                        });
                        Resolution::from_entry(&entry, RateSource::Stale)
                    }
                    None => {
                        self.emit(RateEvent::ServedFallback { pair: pair.clone() });
                        Resolution::fallback()
                    }
                }
            }
        }
    }

    /// Fetch and store for one pair, shared by every task that joins it.
    fn start_flight(&self, pair: &CurrencyPair) -> BoxFuture<'static, FlightOutcome> {
        let store = Arc::clone(&self.store);
        let provider = Arc::clone(&self.provider);
        let observer = Arc::clone(&self.observer);
        let ttl = self.config.ttl;
        let pair = pair.clone();

        async move {
            // An earlier flight may have landed after the caller's lookup
            if let Ok(Some(entry)) = store.get(&pair).await {
                if entry.is_fresh(Utc::now(), ttl) {
                    return Ok(Landing {
                        entry,
                        source: RateSource::Cache,
                        store_error: None,
                    });
                }
            }

            let rate = provider.fetch_rate(&pair.base, &pair.target).await?;
            let entry = RateEntry::new(&pair, rate, Utc::now());
            let store_error = match store.put(entry.clone()).await {
                Ok(()) => None,
                Err(e) => {
                    observer.on_event(&RateEvent::StoreFailed {
                        pair: pair.clone(),
                        operation: "put",
                        message: e.to_string(),
                    });
                    Some(e.to_string())
                }
            };
            observer.on_event(&RateEvent::Fetched {
                pair: pair.clone(),
                rate,
            });

            Ok::<_, FetchError>(Landing {
                entry,
                source: RateSource::Provider,
                store_error,
            })
        }
        .boxed()
    }

    async fn restore(&self, previous: Option<RateEntry>) -> Result<(), StoreError> {
        match previous {
            Some(entry) => self.store.put(entry).await,
            None => Ok(()),
        }
    }

    fn emit(&self, event: RateEvent) {
        self.observer.on_event(&event);
    }
}
