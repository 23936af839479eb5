//! Prediction cache capability and in-flight write tracking
//!
//! The cache stores whole-day prediction records keyed by (station, local
//! date). Reads treat expired entries as absent; writes are batched and
//! idempotent under concurrent duplicates (last write wins, which is safe
//! because finalized past days are stable upstream).

mod predictions;

pub use predictions::MemoryPredictionCache;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::Notify;

use crate::data::TidePredictionRecord;

/// Errors from a cache backend
///
/// The engine logs these and degrades to an upstream fetch; they are never
/// surfaced as request failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store failure: {0}")]
    Store(String),
}

/// Capability interface for the day-granular prediction cache
///
/// Implementations must be safe for concurrent `get`/`save` calls across
/// in-flight requests without callers holding any lock.
#[async_trait]
pub trait PredictionCache: Send + Sync {
    /// Returns the cached record for a station-local calendar day, or `None`
    /// if absent or expired.
    async fn get_predictions(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> Option<TidePredictionRecord>;

    /// Stores a batch of freshly fetched day records.
    async fn save_predictions_batch(
        &self,
        records: Vec<TidePredictionRecord>,
    ) -> Result<(), CacheError>;
}

/// Counts in-flight background cache writes so shutdown and tests can block
/// until every spawned write has settled.
///
/// Each spawned write holds a [`WriteGuard`]; [`WriteTracker::wait_idle`]
/// resolves once no guards remain.
#[derive(Clone, Default)]
pub struct WriteTracker {
    state: Arc<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    pending: Mutex<usize>,
    idle: Notify,
}

impl WriteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one in-flight write; the returned guard releases it on drop.
    pub fn begin(&self) -> WriteGuard {
        *self.state.pending.lock().unwrap() += 1;
        WriteGuard {
            state: Arc::clone(&self.state),
        }
    }

    /// Waits until all registered writes have completed.
    pub async fn wait_idle(&self) {
        loop {
            // Register for notification before checking the count, so a
            // guard dropped between the check and the await is not missed.
            let notified = self.state.idle.notified();
            if *self.state.pending.lock().unwrap() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// RAII handle for one tracked write
pub struct WriteGuard {
    state: Arc<TrackerState>,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        let mut pending = self.state.pending.lock().unwrap();
        *pending -= 1;
        if *pending == 0 {
            self.state.idle.notify_waiters();
        }
    }
}
