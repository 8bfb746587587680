//! Short-lived prediction cache keyed by symbol.
//!
//! The cache is an explicit object owned by the caller; nothing in the crate
//! keeps global state. Entries expire after a fixed freshness window (15
//! minutes by default). Expired entries are treated as misses and are only
//! removed on overwrite or by [`PredictionCache::purge_expired`].
//!
//! An entry may also record the timestamp of the last candle it was computed
//! over. The `*_as_of` lookups treat an entry for different data as a miss.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::{Duration, Instant},
};

use tracing::trace;

use crate::{prediction::PredictionResult, Result};

/// Default freshness window
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone)]
struct Entry {
    result: Arc<PredictionResult>,
    stored_at: Instant,
    as_of: Option<i64>,
}

impl Entry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Thread-safe symbol -> prediction cache with time-based expiry.
#[derive(Debug)]
pub struct PredictionCache {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for PredictionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `symbol`, if any.
    pub fn get(&self, symbol: &str) -> Option<Arc<PredictionResult>> {
        self.get_at(symbol, Instant::now())
    }

    /// [`get`](Self::get) as seen at `now`.
    pub fn get_at(&self, symbol: &str, now: Instant) -> Option<Arc<PredictionResult>> {
        self.lookup(symbol, now, |_| true)
    }

    /// Fresh entry for `symbol` computed over data whose last candle is `as_of`.
    pub fn get_as_of(&self, symbol: &str, as_of: Option<i64>) -> Option<Arc<PredictionResult>> {
        self.get_as_of_at(symbol, as_of, Instant::now())
    }

    /// [`get_as_of`](Self::get_as_of) as seen at `now`.
    pub fn get_as_of_at(
        &self,
        symbol: &str,
        as_of: Option<i64>,
        now: Instant,
    ) -> Option<Arc<PredictionResult>> {
        self.lookup(symbol, now, |entry| entry.as_of == as_of)
    }

    fn lookup(
        &self,
        symbol: &str,
        now: Instant,
        same_data: impl Fn(&Entry) -> bool,
    ) -> Option<Arc<PredictionResult>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(symbol) {
            Some(entry) if !entry.is_fresh(now, self.ttl) => {
                trace!(symbol, "prediction cache entry expired");
                None
            }
            Some(entry) if !same_data(entry) => {
                trace!(symbol, as_of = ?entry.as_of, "prediction cache entry is for other data");
                None
            }
            Some(entry) => {
                trace!(symbol, "prediction cache hit");
                Some(Arc::clone(&entry.result))
            }
            None => {
                trace!(symbol, "prediction cache miss");
                None
            }
        }
    }

    pub fn insert(&self, symbol: &str, result: PredictionResult) -> Arc<PredictionResult> {
        self.insert_at(symbol, result, Instant::now())
    }

    /// [`insert`](Self::insert) stamped with `now`.
    pub fn insert_at(
        &self,
        symbol: &str,
        result: PredictionResult,
        now: Instant,
    ) -> Arc<PredictionResult> {
        self.store(symbol, result, now, None)
    }

    /// Store a result computed over data whose last candle is `as_of`.
    pub fn insert_as_of(
        &self,
        symbol: &str,
        as_of: Option<i64>,
        result: PredictionResult,
    ) -> Arc<PredictionResult> {
        self.store(symbol, result, Instant::now(), as_of)
    }

    fn store(
        &self,
        symbol: &str,
        result: PredictionResult,
        now: Instant,
        as_of: Option<i64>,
    ) -> Arc<PredictionResult> {
        let result = Arc::new(result);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            symbol.to_owned(),
            Entry {
                result: Arc::clone(&result),
                stored_at: now,
                as_of,
            },
        );
        result
    }

    /// Cached result for `symbol`, or compute, store and return a fresh one.
    ///
    /// Failed computations are not cached.
    pub fn get_or_compute<F>(&self, symbol: &str, compute: F) -> Result<Arc<PredictionResult>>
    where
        F: FnOnce() -> Result<PredictionResult>,
    {
        if let Some(hit) = self.get(symbol) {
            return Ok(hit);
        }
        let result = compute()?;
        Ok(self.insert(symbol, result))
    }

    /// [`get_or_compute`](Self::get_or_compute) that only reuses an entry
    /// computed over the same data (`as_of`).
    pub fn get_or_compute_as_of<F>(
        &self,
        symbol: &str,
        as_of: Option<i64>,
        compute: F,
    ) -> Result<Arc<PredictionResult>>
    where
        F: FnOnce() -> Result<PredictionResult>,
    {
        if let Some(hit) = self.get_as_of(symbol, as_of) {
            return Ok(hit);
        }
        let result = compute()?;
        Ok(self.insert_as_of(symbol, as_of, result))
    }

    pub fn invalidate(&self, symbol: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(symbol).is_some()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now, self.ttl));
        let removed = before - entries.len();
        if removed > 0 {
            trace!(removed, "purged expired predictions");
        }
        removed
    }

    /// Number of stored entries, fresh or not
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
