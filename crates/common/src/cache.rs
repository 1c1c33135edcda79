//! In-memory TTL cache for upstream data and computed assessments.
//!
//! Uses `DashMap` for concurrent access from parallel adapter fetches.
//! Freshness is decided per read: the caller supplies the TTL, so two
//! callers may apply different windows to the same stored value. Expired
//! entries are evicted lazily on read; there is no background sweep.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Source of "now" for cache age checks.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

/// A cached value with its write time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub written_at: Instant,
}

/// Thread-safe key → value store with per-read expiry.
///
/// Last write wins on `set`; a `get` racing a `set` may see either value.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Return the value for `key` if it is no older than `ttl`.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        let now = self.clock.now();
        let is_fresh = |entry: &CacheEntry<V>| now.saturating_duration_since(entry.written_at) <= ttl;

        if let Some(entry) = self.entries.get(key) {
            if is_fresh(entry.value()) {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }

        // Only evict if nobody refreshed the slot in between.
        self.entries.remove_if(key, |_, entry| !is_fresh(entry));
        None
    }

    /// Store `value` under `key`, stamped with the current time.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            written_at: self.clock.now(),
        };
        self.entries.insert(key.into(), entry);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.len())
            .field("clock", &self.clock)
            .finish()
    }
}

/// Shared handle passed into adapters and scorers.
pub type SharedCache<V> = Arc<TtlCache<V>>;

/// Cache key fragment for a point, rounded to 2 decimals (~1.1 km).
pub fn point_key(prefix: &str, lat: f64, lon: f64) -> String {
    format!("{prefix}:{lat:.2},{lon:.2}")
}
