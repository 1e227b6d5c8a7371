//! Core business logic abstractions

pub mod config;
pub mod events;
pub mod log;
pub mod provider;
pub mod rate;
pub mod store;

// Re-export main types for cleaner imports
pub use events::{RateEvent, RateObserver, TracingObserver};
pub use provider::{FetchError, RateProvider};
pub use rate::{
    Conversion, CurrencyPair, RateEntry, RateQuote, RateSource, Resolution, TickerRates,
};
pub use store::{RateStore, StoreError};
