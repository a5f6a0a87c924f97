use crate::{
    Config,
    error::WeatherError,
    model::{HistoricalSeries, HourlyPoint, Location, PlaceMatch, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, future::Future, sync::Arc, time::Duration};

pub mod offline;
pub mod openweather;

/// Raw hourly forecast as delivered by a provider, before daily aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    pub location_id: String,
    pub points: Vec<HourlyPoint>,
    /// Offset of the location's local time from UTC; used to bucket points
    /// into calendar dates.
    pub utc_offset_secs: i32,
    pub is_synthetic: bool,
}

/// Everything the resolver and the fetcher need from a weather source.
///
/// Implementations return normalized models; provider-specific JSON never
/// leaves the implementing module.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Current-weather lookup by free-text name; one best match.
    async fn lookup_by_name(&self, name: &str) -> Result<PlaceMatch, WeatherError>;

    /// Forward geocoding; may legitimately return an empty list.
    async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<PlaceMatch>, WeatherError>;

    async fn current(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError>;

    async fn forecast(&self, location: &Location) -> Result<HourlySeries, WeatherError>;

    async fn historical(&self, _location: &Location) -> Result<HistoricalSeries, WeatherError> {
        Err(WeatherError::Unsupported { provider: self.name(), what: "historical data" })
    }
}

/// Construct the network provider from config.
///
/// A missing API key is not an error here: the provider is still built and
/// answers every call with [`WeatherError::MissingApiKey`], which sends callers
/// down their offline fallbacks.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
    let provider = OpenWeatherProvider::new(&config.provider)?;
    Ok(Arc::new(provider))
}

/// Waits at most `limit` for `call`; running out of time is a network failure.
pub(crate) async fn bounded<T>(
    limit: Duration,
    what: &str,
    call: impl Future<Output = Result<T, WeatherError>>,
) -> Result<T, WeatherError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| WeatherError::timeout(what, limit))?
}
