//! Currency pairs, cached rate entries and the values handed to callers

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

/// Uppercases and trims a currency code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// An ordered (base, target) currency combination. Codes are always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: String,
    pub target: String,
}

impl CurrencyPair {
    pub fn new(base: &str, target: &str) -> Self {
        Self {
            base: normalize_code(base),
            target: normalize_code(target),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.base == self.target
    }

    /// Key used by persistent stores, e.g. `USD/EUR`.
    pub fn storage_key(&self) -> String {
        format!("{}/{}", self.base, self.target)
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.target)
    }
}

/// Last rate fetched from the provider for a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub base: String,
    pub target: String,
    /// Target units per one base unit.
    pub rate: Decimal,
    /// When the provider returned this value, not when it was last read.
    pub fetched_at: DateTime<Utc>,
}

impl RateEntry {
    pub fn new(pair: &CurrencyPair, rate: Decimal, fetched_at: DateTime<Utc>) -> Self {
        Self {
            base: pair.base.clone(),
            target: pair.target.clone(),
            rate,
            fetched_at,
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.base, &self.target)
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.fetched_at)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Where a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Same currency on both sides.
    Identity,
    /// Fresh cache entry.
    Cache,
    /// Fetched from the provider during this call.
    Provider,
    /// Provider failed, served the previous cached value.
    Stale,
    /// Provider failed and nothing was cached.
    Fallback,
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateSource::Identity => "identity",
                RateSource::Cache => "cache",
                RateSource::Provider => "provider",
                RateSource::Stale => "stale",
                RateSource::Fallback => "fallback",
            }
        )
    }
}

/// Outcome of a single rate lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub rate: Decimal,
    pub source: RateSource,
    /// Fetch time of the entry that supplied the rate, if any.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Resolution {
    pub fn identity() -> Self {
        Self {
            rate: Decimal::ONE,
            source: RateSource::Identity,
            fetched_at: None,
        }
    }

    pub fn fallback() -> Self {
        Self {
            rate: Decimal::ONE,
            source: RateSource::Fallback,
            fetched_at: None,
        }
    }

    pub fn from_entry(entry: &RateEntry, source: RateSource) -> Self {
        Self {
            rate: entry.rate,
            source,
            fetched_at: Some(entry.fetched_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub base_currency: String,
    pub target_currency: String,
    pub rate: Decimal,
    pub fetched_at: Option<DateTime<Utc>>,
    pub source: RateSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerRates {
    pub base_currency: String,
    pub rates: HashMap<String, Decimal>,
    /// Wall-clock time of the batch, not of the individual entries.
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub amount: Decimal,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: Decimal,
    pub converted_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pair_normalizes_codes() {
        let pair = CurrencyPair::new(" usd", "eUr ");
        assert_eq!(pair.base, "USD");
        assert_eq!(pair.target, "EUR");
        assert_eq!(pair.storage_key(), "USD/EUR");
        assert!(!pair.is_identity());
        assert!(CurrencyPair::new("inr", "INR").is_identity());
    }

    #[test]
    fn test_pair_direction_matters() {
        assert_ne!(CurrencyPair::new("USD", "EUR"), CurrencyPair::new("EUR", "USD"));
    }

    #[test]
    fn test_entry_freshness() {
        let now = Utc::now();
        let pair = CurrencyPair::new("USD", "EUR");
        let ttl = Duration::hours(24);

        let fresh = RateEntry::new(&pair, dec!(0.92), now - Duration::hours(23));
        assert!(fresh.is_fresh(now, ttl));

        // Age equal to the ttl is already stale
        let boundary = RateEntry::new(&pair, dec!(0.92), now - ttl);
        assert!(!boundary.is_fresh(now, ttl));
    }

    #[test]
    fn test_entry_serializes_decimal_exactly() {
        let pair = CurrencyPair::new("USD", "INR");
        let entry = RateEntry::new(&pair, dec!(83.123456789012345), Utc::now());
        let bytes = serde_json::to_vec(&entry).unwrap();
        let back: RateEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.pair(), pair);
    }
}
