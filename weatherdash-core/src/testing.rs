//! Call-counting provider stub shared by unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{
    error::WeatherError,
    model::{
        ConditionMain, HistoricalPoint, HistoricalSeries, HourlyPoint, Location, PlaceMatch,
        SourceTier, WeatherSnapshot,
    },
    provider::{HourlySeries, WeatherProvider},
};

/// 2023-11-14T00:00:00Z
pub(crate) const MIDNIGHT: i64 = 1_699_920_000;

#[derive(Debug, Default)]
pub(crate) struct StubProvider {
    /// `None` makes the name lookup answer 404.
    pub live: Option<PlaceMatch>,
    /// `None` makes geocoding fail with a network error.
    pub geocode: Option<Vec<PlaceMatch>>,
    /// Name lookups never complete.
    pub hang_lookups: bool,
    /// Data fetches fail while set.
    pub down: AtomicBool,
    /// History is answered with `Unsupported`.
    pub no_history: bool,
    pub lookups: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl StubProvider {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn begin_fetch(&self) -> Result<usize, WeatherError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.down.load(Ordering::SeqCst) {
            return Err(WeatherError::NetworkFailure("connection refused".into()));
        }
        Ok(n)
    }

    async fn maybe_hang(&self) {
        if self.hang_lookups {
            std::future::pending::<()>().await;
        }
    }
}

pub(crate) fn place(name: &str, country: &str, lat: f64, lon: f64) -> PlaceMatch {
    PlaceMatch {
        provider_id: None,
        name: name.into(),
        country: country.into(),
        state: None,
        lat,
        lon,
    }
}

pub(crate) fn location(id: &str, lat: f64) -> Location {
    Location {
        id: id.into(),
        name: id.into(),
        country: "XX".into(),
        state: None,
        lat,
        lon: 0.0,
        is_capital: false,
        source_tier: SourceTier::Geocode,
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn lookup_by_name(&self, _name: &str) -> Result<PlaceMatch, WeatherError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.maybe_hang().await;
        self.live
            .clone()
            .ok_or_else(|| WeatherError::NetworkFailure("status 404 Not Found".into()))
    }

    async fn geocode(&self, _query: &str, _limit: u8) -> Result<Vec<PlaceMatch>, WeatherError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.maybe_hang().await;
        self.geocode
            .clone()
            .ok_or_else(|| WeatherError::NetworkFailure("connection reset".into()))
    }

    /// The n-th successful fetch reports a temperature of n degrees.
    async fn current(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        let n = self.begin_fetch()?;
        Ok(WeatherSnapshot {
            location_id: location.id.clone(),
            temp_c: n as f64,
            feels_like_c: n as f64,
            humidity_pct: 40,
            pressure_hpa: 1013.0,
            wind_speed_ms: 3.0,
            wind_deg: Some(180.0),
            visibility_km: 10.0,
            condition_main: ConditionMain::Clear,
            condition_description: "clear sky".into(),
            icon_code: "01d".into(),
            observed_at: DateTime::from_timestamp(MIDNIGHT, 0).unwrap_or_else(Utc::now),
            is_synthetic: false,
        })
    }

    /// Two and a half days of 3-hourly points, delivered newest first.
    async fn forecast(&self, location: &Location) -> Result<HourlySeries, WeatherError> {
        self.begin_fetch()?;
        let points = (0..20)
            .rev()
            .map(|i| HourlyPoint {
                epoch_seconds: MIDNIGHT + i * 3 * 3600,
                temp_c: 10.0 + (i % 8) as f64,
                feels_like_c: 9.0,
                humidity_pct: 60,
                pressure_hpa: 1010.0,
                wind_speed_ms: 4.0,
                precip_probability_pct: 20,
                condition_main: ConditionMain::Clouds,
                condition_description: "few clouds".into(),
            })
            .collect();

        Ok(HourlySeries {
            location_id: location.id.clone(),
            points,
            utc_offset_secs: 0,
            is_synthetic: false,
        })
    }

    async fn historical(&self, location: &Location) -> Result<HistoricalSeries, WeatherError> {
        self.begin_fetch()?;
        if self.no_history {
            return Err(WeatherError::Unsupported { provider: "stub", what: "historical data" });
        }
        Ok(HistoricalSeries {
            location_id: location.id.clone(),
            points: vec![HistoricalPoint {
                epoch_seconds: MIDNIGHT - 3600,
                temp_c: 8.0,
                humidity_pct: 70,
                pressure_hpa: 1011.0,
            }],
            is_synthetic: false,
        })
    }
}
