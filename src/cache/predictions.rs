//! Bounded in-memory prediction cache
//!
//! Day records live in an LRU map behind an async `RwLock`. Capacity bounds
//! memory; expiry is carried on each record (absolute epoch milliseconds)
//! and honored lazily on read, so an entry past its TTL reads as absent
//! even before eviction reclaims it.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CacheError, PredictionCache};
use crate::data::TidePredictionRecord;

/// In-memory LRU cache of whole-day prediction records
pub struct MemoryPredictionCache {
    entries: Arc<RwLock<LruCache<String, TidePredictionRecord>>>,
}

impl MemoryPredictionCache {
    /// Creates a cache holding at most `capacity` day records.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            entries: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    fn cache_key(station_id: &str, date: NaiveDate) -> String {
        format!("{station_id}:{date}")
    }
}

#[async_trait]
impl PredictionCache for MemoryPredictionCache {
    async fn get_predictions(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> Option<TidePredictionRecord> {
        let key = Self::cache_key(station_id, date);
        let now_ms = Utc::now().timestamp_millis();

        let mut entries = self.entries.write().await;
        match entries.get(&key) {
            Some(record) if record.is_expired(now_ms) => {
                debug!(station = station_id, %date, "cache entry expired");
                entries.pop(&key);
                None
            }
            Some(record) => {
                debug!(station = station_id, %date, "cache hit");
                Some(record.clone())
            }
            None => {
                debug!(station = station_id, %date, "cache miss");
                None
            }
        }
    }

    async fn save_predictions_batch(
        &self,
        records: Vec<TidePredictionRecord>,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        for record in records {
            let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
                .map_err(|e| CacheError::Store(format!("bad record date {:?}: {e}", record.date)))?;
            let key = Self::cache_key(&record.station_id, date);
            entries.put(key, record);
        }
        Ok(())
    }
}
