//! Core library for the `weatherdash` CLI.
//!
//! This crate defines:
//! - Location resolution with an ordered fallback from the live provider down to
//!   built-in city tables
//! - Cache-first weather, forecast and history fetching with offline fallback
//! - Durable user preferences (unit, theme, favorites)
//! - Configuration & credentials handling
//!
//! [`WeatherDashboard`] ties these together and is the entry point for binaries.

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod model;
pub mod preferences;
pub mod provider;
pub mod resolver;
pub mod storage;

#[cfg(test)]
mod testing;

pub use cache::{CacheKind, CacheTtls};
pub use config::{Config, ProviderConfig};
pub use dashboard::WeatherDashboard;
pub use error::WeatherError;
pub use fetcher::{Freshness, WeatherFetcher};
pub use model::{
    ConditionMain, DailyPoint, ForecastBundle, HistoricalSeries, HourlyPoint, Location,
    Preferences, SourceTier, TemperatureUnit, Theme, WeatherSnapshot,
};
pub use preferences::PreferenceStore;
pub use provider::WeatherProvider;
pub use resolver::LocationResolver;
