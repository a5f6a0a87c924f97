//! Cache-first retrieval of weather data for a resolved [`Location`].
//!
//! Every fetch returns a structurally valid value. The order of preference is
//! a fresh cache entry, a new provider response, a stale cache entry, and
//! finally synthetic data from the [`OfflineProvider`], which is flagged with
//! `is_synthetic` and not cached.
//!
//! History the provider does not serve at all comes from the offline provider
//! as its regular answer, so it is cached under the historical TTL.

use std::{future::Future, sync::Arc, time::Duration};
use tracing::{debug, warn};

use crate::{
    cache::{CacheKind, CachedPayload, FreshnessCache},
    error::WeatherError,
    forecast::build_bundle,
    model::{ForecastBundle, HistoricalSeries, Location, WeatherSnapshot},
    provider::{WeatherProvider, bounded, offline::OfflineProvider},
};

/// Age of the cached data behind a location's last answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    pub fetched_at_epoch_ms: i64,
    pub is_stale: bool,
}

trait Cacheable: Sized + Clone {
    const KIND: CacheKind;

    fn into_payload(self) -> CachedPayload;
    fn from_payload(payload: CachedPayload) -> Option<Self>;
}

impl Cacheable for WeatherSnapshot {
    const KIND: CacheKind = CacheKind::Weather;

    fn into_payload(self) -> CachedPayload {
        CachedPayload::Weather(self)
    }

    fn from_payload(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Weather(v) => Some(v),
            _ => None,
        }
    }
}

impl Cacheable for ForecastBundle {
    const KIND: CacheKind = CacheKind::Forecast;

    fn into_payload(self) -> CachedPayload {
        CachedPayload::Forecast(self)
    }

    fn from_payload(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Forecast(v) => Some(v),
            _ => None,
        }
    }
}

impl Cacheable for HistoricalSeries {
    const KIND: CacheKind = CacheKind::Historical;

    fn into_payload(self) -> CachedPayload {
        CachedPayload::Historical(self)
    }

    fn from_payload(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Historical(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    provider: Arc<dyn WeatherProvider>,
    offline: OfflineProvider,
    cache: Arc<FreshnessCache>,
    timeout: Duration,
    daily_limit: usize,
}

impl WeatherFetcher {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        offline: OfflineProvider,
        cache: Arc<FreshnessCache>,
        timeout: Duration,
        daily_limit: usize,
    ) -> Self {
        Self { provider, offline, cache, timeout, daily_limit }
    }

    pub fn daily_limit(&self) -> usize {
        self.daily_limit
    }

    pub async fn fetch_current(&self, location: &Location) -> WeatherSnapshot {
        self.load(location, self.provider.current(location), || {
            self.offline.synthetic_current(location)
        })
        .await
    }

    /// Hourly points are chronological without duplicates; daily points are
    /// capped at the configured limit.
    pub async fn fetch_forecast(&self, location: &Location) -> ForecastBundle {
        let limit = self.daily_limit;
        let fetch = async {
            self.provider.forecast(location).await.map(|series| build_bundle(series, limit))
        };

        self.load(location, fetch, || {
            build_bundle(self.offline.synthetic_forecast(location), limit)
        })
        .await
    }

    pub async fn fetch_historical(&self, location: &Location) -> HistoricalSeries {
        let fetch = async {
            match self.provider.historical(location).await {
                Err(WeatherError::Unsupported { provider, .. }) => {
                    debug!(provider, location = %location.id, "history served offline");
                    Ok(self.offline.synthetic_history(location))
                }
                other => other,
            }
        };

        self.load(location, fetch, || self.offline.synthetic_history(location)).await
    }

    pub fn freshness(&self, kind: CacheKind, location: &Location) -> Option<Freshness> {
        self.cache.get(kind, &location.id).map(|entry| Freshness {
            fetched_at_epoch_ms: entry.fetched_at_epoch_ms,
            is_stale: !self.cache.is_fresh(&entry),
        })
    }

    /// Forces the next fetch of `kind` for `location` to go to the provider.
    pub fn invalidate(&self, kind: CacheKind, location: &Location) -> bool {
        self.cache.invalidate(kind, &location.id)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn load<T>(
        &self,
        location: &Location,
        fetch: impl Future<Output = Result<T, WeatherError>>,
        synthetic: impl FnOnce() -> T,
    ) -> T
    where
        T: Cacheable,
    {
        let kind = T::KIND.as_str();
        let cached = self.cache.get(T::KIND, &location.id);

        let hit = cached
            .as_ref()
            .filter(|entry| self.cache.is_fresh(entry))
            .and_then(|entry| T::from_payload(entry.payload.clone()));
        if let Some(hit) = hit {
            debug!(kind, location = %location.id, "cache hit");
            return hit;
        }

        debug!(kind, location = %location.id, "cache miss");
        match bounded(self.timeout, kind, fetch).await {
            Ok(value) => {
                self.cache.put(&location.id, value.clone().into_payload());
                value
            }
            Err(err) => {
                if err.is_expected() {
                    debug!(kind, location = %location.id, error = %err, "provider unavailable");
                } else {
                    warn!(kind, location = %location.id, error = %err, "provider failed");
                }
                match cached.and_then(|entry| T::from_payload(entry.payload)) {
                    Some(stale) => {
                        debug!(kind, location = %location.id, "serving stale entry");
                        stale
                    }
                    None => synthetic(),
                }
            }
        }
    }
}
