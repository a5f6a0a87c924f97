use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Which resolution strategy produced a [`Location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Live,
    Geocode,
    StaticRegion,
    StaticSample,
}

/// A place the dashboard can show weather for.
///
/// Two locations are the same entity iff their `id`s match. Values are created
/// by the resolver and only ever copied afterwards (e.g. into favorites).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    /// ISO 3166-1 alpha-2.
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub is_capital: bool,
    pub source_tier: SourceTier,
}

impl Location {
    /// "Name, State, CC" with the state omitted when unknown.
    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) if !state.is_empty() => {
                format!("{}, {}, {}", self.name, state, self.country)
            }
            _ => format!("{}, {}", self.name, self.country),
        }
    }
}

/// Builds a location id from its parts, keeping only `[A-Za-z0-9-]`.
///
/// Identical provider responses always map to the same id.
pub fn stable_id(parts: &[&str]) -> String {
    parts
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// A candidate place as reported by a provider, before it becomes a [`Location`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceMatch {
    pub provider_id: Option<String>,
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// Coarse weather condition shared by every provider shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionMain {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Fog,
}

impl ConditionMain {
    /// Maps a provider's `weather[].main` string.
    ///
    /// Atmospheric groups (haze, smoke, dust...) fold into `Mist`; anything
    /// unrecognised is reported as `Clouds`.
    pub fn from_provider(main: &str) -> Self {
        match main.trim().to_ascii_lowercase().as_str() {
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            "rain" => Self::Rain,
            "drizzle" => Self::Drizzle,
            "thunderstorm" | "squall" | "tornado" => Self::Thunderstorm,
            "snow" => Self::Snow,
            "mist" | "haze" | "smoke" | "dust" | "sand" | "ash" => Self::Mist,
            "fog" => Self::Fog,
            _ => Self::Clouds,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Drizzle => "Drizzle",
            Self::Thunderstorm => "Thunderstorm",
            Self::Snow => "Snow",
            Self::Mist => "Mist",
            Self::Fog => "Fog",
        }
    }
}

impl fmt::Display for ConditionMain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_id: String,
    pub temp_c: f64,
    pub feels_like_c: f64,
    /// Always within 0..=100.
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    /// Never negative.
    pub wind_speed_ms: f64,
    pub wind_deg: Option<f64>,
    pub visibility_km: f64,
    pub condition_main: ConditionMain,
    pub condition_description: String,
    pub icon_code: String,
    pub observed_at: DateTime<Utc>,
    /// Set when the offline provider produced this value.
    pub is_synthetic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub epoch_seconds: i64,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub wind_speed_ms: f64,
    pub precip_probability_pct: u8,
    pub condition_main: ConditionMain,
    /// Provider wording for the condition; used as the daily description.
    #[serde(default)]
    pub condition_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub condition_main: ConditionMain,
    pub condition_description: String,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
}

/// Hourly and daily forecast for one location.
///
/// `hourly` is strictly ascending by `epoch_seconds`; `daily` holds at most
/// seven entries, one per calendar date, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    pub location_id: String,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
    pub is_synthetic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub epoch_seconds: i64,
    pub temp_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
}

/// Observations for the hours leading up to now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub location_id: String,
    pub points: Vec<HistoricalPoint>,
    pub is_synthetic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Whole degrees with the unit symbol, e.g. `"72°F"`.
    pub fn format(&self, celsius: f64) -> String {
        format!("{}{}", self.from_celsius(celsius).round(), self.symbol())
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemperatureUnit {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "celsius" | "c" | "metric" => Ok(Self::Celsius),
            "fahrenheit" | "f" | "imperial" => Ok(Self::Fahrenheit),
            _ => Err(anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(anyhow!("Unknown theme '{value}'. Supported themes: default, light, dark.")),
        }
    }
}

/// User preferences; favorites keep insertion order and unique ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub unit: TemperatureUnit,
    pub theme: Theme,
    pub favorites: Vec<Location>,
}

impl Preferences {
    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|loc| loc.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_strips_everything_but_alphanumerics_and_dashes() {
        let id = stable_id(&["São Paulo", "BR", "-23.5505", "-46.6333"]);
        assert_eq!(id, "SoPaulo-BR--235505--466333");
    }

    #[test]
    fn stable_id_is_deterministic() {
        let a = stable_id(&["New Delhi", "IN", "28.6139", "77.209"]);
        let b = stable_id(&["New Delhi", "IN", "28.6139", "77.209"]);
        assert_eq!(a, b);
        assert_eq!(a, "NewDelhi-IN-286139-77209");
    }

    #[test]
    fn provider_conditions_fold_into_known_groups() {
        assert_eq!(ConditionMain::from_provider("Haze"), ConditionMain::Mist);
        assert_eq!(ConditionMain::from_provider("fog"), ConditionMain::Fog);
        assert_eq!(ConditionMain::from_provider("Squall"), ConditionMain::Thunderstorm);
        assert_eq!(ConditionMain::from_provider("whatever"), ConditionMain::Clouds);
    }

    #[test]
    fn unit_parse_and_format() {
        let unit: TemperatureUnit = "Fahrenheit".parse().expect("unit should parse");
        assert_eq!(unit, TemperatureUnit::Fahrenheit);
        assert_eq!(unit.format(22.2), "72°F");
        assert_eq!(TemperatureUnit::Celsius.format(22.6), "23°C");

        let err = "kelvin".parse::<TemperatureUnit>().unwrap_err();
        assert!(err.to_string().contains("Unknown temperature unit"));
    }

    #[test]
    fn unit_serializes_as_lowercase_string() {
        let json = serde_json::to_string(&TemperatureUnit::Fahrenheit).expect("serialize");
        assert_eq!(json, "\"fahrenheit\"");
    }
}
