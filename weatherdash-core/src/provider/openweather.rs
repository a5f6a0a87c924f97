use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    config::ProviderConfig,
    error::WeatherError,
    model::{ConditionMain, HourlyPoint, Location, PlaceMatch, WeatherSnapshot},
};

use super::{HourlySeries, WeatherProvider};

const PROVIDER_NAME: &str = "openweather";
const USER_AGENT: &str = concat!("weatherdash/", env!("CARGO_PKG_VERSION"));

/// OpenWeather's visibility ceiling, reported when the field is missing.
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    geo_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            api_key: config.api_key().map(str::to_owned),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geo_url: config.geo_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn api_key(&self) -> Result<&str, WeatherError> {
        self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, WeatherError> {
        let res = self.http.get(url).query(query).send().await.map_err(|e| {
            WeatherError::NetworkFailure(format!("Failed to send {what} request: {e}"))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::NetworkFailure(format!("Failed to read {what} response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(WeatherError::NetworkFailure(format!(
                "OpenWeather {what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::MalformedResponse(format!("Failed to parse OpenWeather {what} JSON: {e}"))
        })
    }

    fn coordinate_query(
        &self,
        location: &Location,
    ) -> Result<Vec<(&'static str, String)>, WeatherError> {
        Ok(vec![
            ("lat", location.lat.to_string()),
            ("lon", location.lon.to_string()),
            ("units", "metric".to_string()),
            ("appid", self.api_key()?.to_string()),
        ])
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    id: Option<i64>,
    name: String,
    dt: i64,
    coord: OwCoord,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    wind: OwWind,
    visibility: Option<f64>,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwGeoCandidate {
    name: String,
    lat: f64,
    lon: f64,
    country: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwForecastItem {
    dt: i64,
    main: OwMain,
    wind: OwWind,
    #[serde(default)]
    pop: f64,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Default, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwOneCallHour {
    dt: i64,
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
    wind_speed: f64,
    #[serde(default)]
    pop: f64,
    weather: Vec<OwWeather>,
}

/// The 5-day/3-hour endpoint nests readings under `main`/`wind`; the One Call
/// endpoint keeps them flat under `hourly`. Both end up as [`HourlyPoint`]s.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwForecastBody {
    ThreeHour {
        list: Vec<OwForecastItem>,
        #[serde(default)]
        city: OwCity,
    },
    OneCall {
        #[serde(default)]
        timezone_offset: i32,
        hourly: Vec<OwOneCallHour>,
    },
}

fn condition(weather: &[OwWeather]) -> (ConditionMain, String, String) {
    weather
        .first()
        .map(|w| (ConditionMain::from_provider(&w.main), w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| (ConditionMain::Clouds, "unknown".to_string(), String::new()))
}

fn clamp_pct(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn ensure_finite(values: &[f64], what: &str) -> Result<(), WeatherError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(WeatherError::MalformedResponse(format!("{what} contains non-finite readings")))
    }
}

fn to_snapshot(
    location_id: &str,
    parsed: OwCurrentResponse,
) -> Result<WeatherSnapshot, WeatherError> {
    ensure_finite(&[parsed.main.temp, parsed.main.feels_like], "current weather")?;

    let (condition_main, condition_description, icon_code) = condition(&parsed.weather);

    Ok(WeatherSnapshot {
        location_id: location_id.to_string(),
        temp_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: clamp_pct(parsed.main.humidity),
        pressure_hpa: parsed.main.pressure,
        wind_speed_ms: parsed.wind.speed.max(0.0),
        wind_deg: parsed.wind.deg,
        visibility_km: parsed.visibility.unwrap_or(DEFAULT_VISIBILITY_M) / 1000.0,
        condition_main,
        condition_description,
        icon_code,
        observed_at: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
        is_synthetic: false,
    })
}

fn to_hourly_series(location_id: &str, body: OwForecastBody) -> Result<HourlySeries, WeatherError> {
    let (points, utc_offset_secs) = match body {
        OwForecastBody::ThreeHour { list, city } => {
            let points = list
                .into_iter()
                .map(|item| {
                    let (condition_main, condition_description, _) = condition(&item.weather);
                    HourlyPoint {
                        epoch_seconds: item.dt,
                        temp_c: item.main.temp,
                        feels_like_c: item.main.feels_like,
                        humidity_pct: clamp_pct(item.main.humidity),
                        pressure_hpa: item.main.pressure,
                        wind_speed_ms: item.wind.speed.max(0.0),
                        precip_probability_pct: clamp_pct(item.pop * 100.0),
                        condition_main,
                        condition_description,
                    }
                })
                .collect::<Vec<_>>();
            (points, city.timezone)
        }
        OwForecastBody::OneCall { timezone_offset, hourly } => {
            let points = hourly
                .into_iter()
                .map(|hour| {
                    let (condition_main, condition_description, _) = condition(&hour.weather);
                    HourlyPoint {
                        epoch_seconds: hour.dt,
                        temp_c: hour.temp,
                        feels_like_c: hour.feels_like,
                        humidity_pct: clamp_pct(hour.humidity),
                        pressure_hpa: hour.pressure,
                        wind_speed_ms: hour.wind_speed.max(0.0),
                        precip_probability_pct: clamp_pct(hour.pop * 100.0),
                        condition_main,
                        condition_description,
                    }
                })
                .collect::<Vec<_>>();
            (points, timezone_offset)
        }
    };

    let temps: Vec<f64> = points.iter().flat_map(|p| [p.temp_c, p.feels_like_c]).collect();
    ensure_finite(&temps, "forecast")?;

    Ok(HourlySeries {
        location_id: location_id.to_string(),
        points,
        utc_offset_secs,
        is_synthetic: false,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn lookup_by_name(&self, name: &str) -> Result<PlaceMatch, WeatherError> {
        let url = format!("{}/weather", self.base_url);
        let query = [
            ("q", name.to_string()),
            ("units", "metric".to_string()),
            ("appid", self.api_key()?.to_string()),
        ];

        let parsed: OwCurrentResponse = self.get_json(&url, &query, "current weather").await?;
        debug!(name = %parsed.name, "OpenWeather matched name lookup");

        Ok(PlaceMatch {
            provider_id: parsed.id.map(|id| id.to_string()),
            name: parsed.name,
            country: parsed.sys.country.unwrap_or_default(),
            state: None,
            lat: parsed.coord.lat,
            lon: parsed.coord.lon,
        })
    }

    async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<PlaceMatch>, WeatherError> {
        let url = format!("{}/direct", self.geo_url);
        let params = [
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("appid", self.api_key()?.to_string()),
        ];

        let parsed: Vec<OwGeoCandidate> = self.get_json(&url, &params, "geocoding").await?;

        Ok(parsed
            .into_iter()
            .map(|c| PlaceMatch {
                provider_id: None,
                name: c.name,
                country: c.country,
                state: c.state,
                lat: c.lat,
                lon: c.lon,
            })
            .collect())
    }

    async fn current(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/weather", self.base_url);
        let query = self.coordinate_query(location)?;

        let parsed: OwCurrentResponse = self.get_json(&url, &query, "current weather").await?;
        to_snapshot(&location.id, parsed)
    }

    async fn forecast(&self, location: &Location) -> Result<HourlySeries, WeatherError> {
        let url = format!("{}/forecast", self.base_url);
        let query = self.coordinate_query(location)?;

        let parsed: OwForecastBody = self.get_json(&url, &query, "forecast").await?;
        to_hourly_series(&location.id, parsed)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
