//! Synthetic weather source used when the network provider is unusable.
//!
//! Values are plausible rather than real. Every result is seeded by the
//! location's latitude, so the same place always gets the same numbers for a
//! given clock reading, and every result carries `is_synthetic = true`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    clock::Clock,
    error::WeatherError,
    model::{
        ConditionMain, HistoricalPoint, HistoricalSeries, HourlyPoint, Location, PlaceMatch,
        WeatherSnapshot,
    },
};

use super::{HourlySeries, WeatherProvider};

const FORECAST_STEPS: i64 = 40;
const FORECAST_STEP_SECS: i64 = 3 * 3600;
const HISTORY_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct OfflineProvider {
    clock: Arc<dyn Clock>,
}

/// Southern latitudes start warmer.
fn base_temp(lat: f64) -> f64 {
    if lat > 0.0 { 15.0 } else { 20.0 }
}

fn forecast_condition(step: i64) -> (ConditionMain, &'static str) {
    match step {
        0..12 => (ConditionMain::Clear, "clear sky"),
        12..24 => (ConditionMain::Clouds, "scattered clouds"),
        _ => (ConditionMain::Rain, "light rain"),
    }
}

impl OfflineProvider {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn rng(location: &Location, salt: u64) -> fastrand::Rng {
        fastrand::Rng::with_seed(location.lat.to_bits().rotate_left(17) ^ salt)
    }

    pub fn synthetic_current(&self, location: &Location) -> WeatherSnapshot {
        let mut rng = Self::rng(location, 0x0c);
        let base = base_temp(location.lat);

        WeatherSnapshot {
            location_id: location.id.clone(),
            temp_c: base + rng.f64() * 10.0 - 5.0,
            feels_like_c: base + rng.f64() * 8.0 - 4.0,
            humidity_pct: (50.0 + rng.f64() * 30.0).round() as u8,
            pressure_hpa: (1010.0 + rng.f64() * 20.0).round(),
            wind_speed_ms: 2.0 + rng.f64() * 10.0,
            wind_deg: Some((rng.f64() * 360.0).round()),
            visibility_km: 10.0,
            condition_main: ConditionMain::Clear,
            condition_description: "clear sky".to_string(),
            icon_code: "01d".to_string(),
            observed_at: DateTime::from_timestamp(self.clock.now_secs(), 0)
                .unwrap_or_else(Utc::now),
            is_synthetic: true,
        }
    }

    pub fn synthetic_forecast(&self, location: &Location) -> HourlySeries {
        let mut rng = Self::rng(location, 0xf0);
        let base = base_temp(location.lat);
        let now = self.clock.now_secs();
        let start = now - now.rem_euclid(FORECAST_STEP_SECS);

        let points = (0..FORECAST_STEPS)
            .map(|step| {
                let wave = (step as f64 * 0.3).sin() * 8.0;
                let (condition_main, description) = forecast_condition(step);
                HourlyPoint {
                    epoch_seconds: start + step * FORECAST_STEP_SECS,
                    temp_c: base + wave + rng.f64() * 4.0 - 2.0,
                    feels_like_c: base + wave + rng.f64() * 3.0 - 1.5,
                    humidity_pct: (40.0 + rng.f64() * 40.0).round() as u8,
                    pressure_hpa: (1005.0 + rng.f64() * 20.0).round(),
                    wind_speed_ms: 1.0 + rng.f64() * 12.0,
                    precip_probability_pct: rng.u8(0..=80),
                    condition_main,
                    condition_description: description.to_string(),
                }
            })
            .collect();

        HourlySeries {
            location_id: location.id.clone(),
            points,
            utc_offset_secs: 0,
            is_synthetic: true,
        }
    }

    pub fn synthetic_history(&self, location: &Location) -> HistoricalSeries {
        let mut rng = Self::rng(location, 0x4a);
        let now = self.clock.now_secs();
        let hour = now - now.rem_euclid(3600);

        let points = (0..HISTORY_HOURS)
            .map(|i| HistoricalPoint {
                epoch_seconds: hour - (HISTORY_HOURS - i) * 3600,
                temp_c: 15.0 + (i as f64 * 0.25).sin() * 5.0,
                humidity_pct: (60.0 + rng.f64() * 20.0).round() as u8,
                pressure_hpa: (1010.0 + rng.f64() * 10.0).round(),
            })
            .collect();

        HistoricalSeries { location_id: location.id.clone(), points, is_synthetic: true }
    }
}

#[async_trait]
impl WeatherProvider for OfflineProvider {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn lookup_by_name(&self, name: &str) -> Result<PlaceMatch, WeatherError> {
        Err(WeatherError::NoMatch(name.to_string()))
    }

    async fn geocode(&self, _query: &str, _limit: u8) -> Result<Vec<PlaceMatch>, WeatherError> {
        Ok(Vec::new())
    }

    async fn current(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        Ok(self.synthetic_current(location))
    }

    async fn forecast(&self, location: &Location) -> Result<HourlySeries, WeatherError> {
        Ok(self.synthetic_forecast(location))
    }

    async fn historical(&self, location: &Location) -> Result<HistoricalSeries, WeatherError> {
        Ok(self.synthetic_history(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, model::SourceTier};

    fn location(lat: f64) -> Location {
        Location {
            id: format!("test-{lat}"),
            name: "Test".into(),
            country: "XX".into(),
            state: None,
            lat,
            lon: 0.0,
            is_capital: false,
            source_tier: SourceTier::StaticSample,
        }
    }

    fn provider() -> OfflineProvider {
        OfflineProvider::new(Arc::new(ManualClock::new(1_700_000_000_000)))
    }

    #[tokio::test]
    async fn same_latitude_same_numbers() {
        let p = provider();
        let a = p.current(&location(28.6)).await.expect("current");
        let b = p.current(&location(28.6)).await.expect("current");
        assert_eq!(a, b);
        assert!(a.is_synthetic);

        let c = p.current(&location(-33.9)).await.expect("current");
        assert_ne!(a.temp_c, c.temp_c);
    }

    #[tokio::test]
    async fn forecast_is_ascending_and_in_range() {
        let series = provider().forecast(&location(51.5)).await.expect("forecast");
        assert_eq!(series.points.len(), FORECAST_STEPS as usize);
        assert!(series.points.windows(2).all(|w| w[0].epoch_seconds < w[1].epoch_seconds));
        assert!(series.points.iter().all(|p| p.humidity_pct <= 100 && p.wind_speed_ms >= 0.0));
        assert!(series.is_synthetic);
    }

    #[tokio::test]
    async fn history_ends_before_now() {
        let series = provider().historical(&location(10.0)).await.expect("history");
        assert_eq!(series.points.len(), 24);
        let last = series.points.last().expect("non-empty");
        assert!(last.epoch_seconds < 1_700_000_000);
    }

    #[tokio::test]
    async fn name_lookups_never_match() {
        let p = provider();
        assert!(p.lookup_by_name("delhi").await.is_err());
        assert!(p.geocode("delhi", 10).await.expect("geocode").is_empty());
    }
}
