//! Application context wiring the resolver, fetcher and preference store
//! around one shared provider and cache.

use anyhow::Result;
use std::sync::Arc;

use crate::{
    Config,
    cache::FreshnessCache,
    clock::{Clock, SystemClock},
    fetcher::WeatherFetcher,
    preferences::PreferenceStore,
    provider::{WeatherProvider, offline::OfflineProvider, provider_from_config},
    resolver::LocationResolver,
    storage::{FileStorage, KeyValueStorage},
};

/// Everything a presentation layer may call. Build one per process and pass
/// it by reference.
#[derive(Debug)]
pub struct WeatherDashboard {
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
    preferences: PreferenceStore,
}

impl WeatherDashboard {
    /// OpenWeather provider, on-disk preferences and the system clock.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = provider_from_config(config)?;
        let storage = Arc::new(FileStorage::open_default()?);
        Self::with_parts(config, provider, storage, Arc::new(SystemClock))
    }

    pub fn with_parts(
        config: &Config,
        provider: Arc<dyn WeatherProvider>,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let timeout = config.provider.timeout();
        let cache = Arc::new(FreshnessCache::new(config.cache_ttls(), clock.clone()));

        Ok(Self {
            resolver: LocationResolver::new(provider.clone(), timeout),
            fetcher: WeatherFetcher::new(
                provider,
                OfflineProvider::new(clock),
                cache,
                timeout,
                config.daily_limit(),
            ),
            preferences: PreferenceStore::load(storage)?,
        })
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn fetcher(&self) -> &WeatherFetcher {
        &self.fetcher
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }
}
