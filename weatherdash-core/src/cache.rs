//! Time-indexed store for fetched payloads.
//!
//! Entries are keyed by (kind, location id) and are never evicted: a stale
//! entry stays in place until the next successful fetch replaces it, so it can
//! still serve as a fallback when the provider is down. Each operation is one
//! short critical section; concurrent misses on the same key may both fetch and
//! both write, and the last write wins.

use parking_lot::RwLock;
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tracing::debug;

use crate::{
    clock::Clock,
    model::{ForecastBundle, HistoricalSeries, WeatherSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Weather,
    Forecast,
    Historical,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Forecast => "forecast",
            Self::Historical => "historical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub location_id: String,
}

impl CacheKey {
    pub fn new(kind: CacheKind, location_id: &str) -> Self {
        Self { kind, location_id: location_id.to_string() }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.as_str(), self.location_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    Weather(WeatherSnapshot),
    Forecast(ForecastBundle),
    Historical(HistoricalSeries),
}

impl CachedPayload {
    pub fn kind(&self) -> CacheKind {
        match self {
            Self::Weather(_) => CacheKind::Weather,
            Self::Forecast(_) => CacheKind::Forecast,
            Self::Historical(_) => CacheKind::Historical,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub kind: CacheKind,
    pub location_id: String,
    pub payload: CachedPayload,
    pub fetched_at_epoch_ms: i64,
}

/// Per-kind time-to-live. `historical: None` never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub weather: Duration,
    pub forecast: Duration,
    pub historical: Option<Duration>,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            weather: Duration::from_secs(10 * 60),
            forecast: Duration::from_secs(30 * 60),
            historical: None,
        }
    }
}

impl CacheTtls {
    pub fn ttl(&self, kind: CacheKind) -> Option<Duration> {
        match kind {
            CacheKind::Weather => Some(self.weather),
            CacheKind::Forecast => Some(self.forecast),
            CacheKind::Historical => self.historical,
        }
    }
}

#[derive(Debug)]
pub struct FreshnessCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttls: CacheTtls,
    clock: Arc<dyn Clock>,
}

impl FreshnessCache {
    pub fn new(ttls: CacheTtls, clock: Arc<dyn Clock>) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttls, clock }
    }

    pub fn ttls(&self) -> CacheTtls {
        self.ttls
    }

    pub fn get(&self, kind: CacheKind, location_id: &str) -> Option<CacheEntry> {
        self.entries.read().get(&CacheKey::new(kind, location_id)).cloned()
    }

    /// Stores `payload` under its own kind, replacing any previous entry, and
    /// stamps it with the current time.
    pub fn put(&self, location_id: &str, payload: CachedPayload) -> CacheEntry {
        let key = CacheKey::new(payload.kind(), location_id);
        let entry = CacheEntry {
            kind: key.kind,
            location_id: key.location_id.clone(),
            payload,
            fetched_at_epoch_ms: self.clock.now_ms(),
        };

        debug!(key = %key, at = entry.fetched_at_epoch_ms, "cache write");
        self.entries.write().insert(key, entry.clone());
        entry
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        let Some(ttl) = self.ttls.ttl(entry.kind) else {
            return true;
        };
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.clock.now_ms().saturating_sub(entry.fetched_at_epoch_ms) < ttl_ms
    }

    pub fn invalidate(&self, kind: CacheKind, location_id: &str) -> bool {
        self.entries.write().remove(&CacheKey::new(kind, location_id)).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
