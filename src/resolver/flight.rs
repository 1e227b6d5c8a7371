//! Per-pair single-flight fetches.
//!
//! The first task that misses the cache for a pair starts a flight; tasks that
//! miss while it is running join it and receive the same outcome, failures
//! included. Concurrent misses therefore cost one provider call and wait one
//! provider timeout at most. A joined task may stop waiting at any time; the
//! flight is dropped, aborting the provider call, once nobody waits on it.

use crate::core::rate::CurrencyPair;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

type Flight<T> = Shared<BoxFuture<'static, T>>;

pub(crate) struct FlightTable<T: Clone> {
    flights: Mutex<HashMap<CurrencyPair, Flight<T>>>,
}

impl<T: Clone> Default for FlightTable<T> {
    fn default() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> FlightTable<T> {
    /// Joins the running flight for `pair`, or starts one with `start`.
    pub(crate) fn join<F>(&self, pair: &CurrencyPair, start: F) -> FlightHandle<'_, T>
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        let flight = flights
            .entry(pair.clone())
            .or_insert_with(|| start().shared())
            .clone();
        FlightHandle {
            table: self,
            pair: pair.clone(),
            flight: Some(flight),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.flights.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// A task's place in a flight. Resolves to the flight's outcome.
pub(crate) struct FlightHandle<'a, T: Clone> {
    table: &'a FlightTable<T>,
    pair: CurrencyPair,
    flight: Option<Flight<T>>,
}

impl<T: Clone> Future for FlightHandle<'_, T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        match self.flight.as_mut() {
            Some(flight) => Pin::new(flight).poll(cx),
            None => Poll::Pending,
        }
    }
}

impl<T: Clone> Drop for FlightHandle<'_, T> {
    fn drop(&mut self) {
        drop(self.flight.take());

        // The table's own copy is never polled, so a count of one means no
        // task is waiting and the flight is either finished or abandoned
        let mut flights = self.table.flights.lock().unwrap_or_else(|e| e.into_inner());
        if flights
            .get(&self.pair)
            .is_some_and(|flight| flight.strong_count() == Some(1))
        {
            flights.remove(&self.pair);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counted(starts: &Arc<AtomicUsize>, value: u32, delay: Duration) -> BoxFuture<'static, u32> {
        starts.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(delay).await;
            value
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_finished_flight_is_forgotten() {
        let table = FlightTable::default();
        let starts = Arc::new(AtomicUsize::new(0));
        let pair = CurrencyPair::new("USD", "EUR");

        let handle = table.join(&pair, || counted(&starts, 7, Duration::ZERO));
        assert_eq!(table.len(), 1);
        assert_eq!(handle.await, 7);
        assert_eq!(table.len(), 0);

        // A later join starts a new flight
        assert_eq!(
            table.join(&pair, || counted(&starts, 8, Duration::ZERO)).await,
            8
        );
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_joined_tasks_share_one_outcome() {
        let table = Arc::new(FlightTable::default());
        let starts = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                let starts = Arc::clone(&starts);
                tokio::spawn(async move {
                    table
                        .join(&CurrencyPair::new("USD", "EUR"), || {
                            counted(&starts, 42, Duration::from_millis(50))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), 42);
        }
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_flight_is_dropped() {
        let table = FlightTable::default();
        let starts = Arc::new(AtomicUsize::new(0));
        let pair = CurrencyPair::new("USD", "EUR");

        let waited = tokio::time::timeout(
            Duration::from_millis(20),
            table.join(&pair, || counted(&starts, 1, Duration::from_secs(30))),
        )
        .await;
        assert!(waited.is_err());
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn test_leaving_waiter_keeps_flight_for_others() {
        let table = FlightTable::default();
        let starts = Arc::new(AtomicUsize::new(0));
        let pair = CurrencyPair::new("USD", "EUR");

        let stayer = table.join(&pair, || counted(&starts, 5, Duration::from_millis(50)));
        let leaver = table.join(&pair, || counted(&starts, 6, Duration::ZERO));
        drop(leaver);
        assert_eq!(table.len(), 1);

        assert_eq!(stayer.await, 5);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn test_different_pairs_fly_separately() {
        let table = FlightTable::default();
        let starts = Arc::new(AtomicUsize::new(0));

        let slow = table.join(&CurrencyPair::new("USD", "EUR"), || {
            counted(&starts, 1, Duration::from_secs(30))
        });
        let other = tokio::time::timeout(
            Duration::from_millis(100),
            table.join(&CurrencyPair::new("EUR", "USD"), || {
                counted(&starts, 2, Duration::ZERO)
            }),
        )
        .await;
        assert_eq!(other.ok(), Some(2));
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        drop(slow);
    }
}
