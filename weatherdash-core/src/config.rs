use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::cache::CacheTtls;

/// Environment variable that overrides the API key from the config file.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Connection settings for the weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Absent or empty means "offline": every provider call fails fast.
    pub api_key: Option<String>,

    /// Base for `/weather` and `/forecast`.
    pub base_url: String,

    /// Base for `/direct` geocoding.
    pub geo_url: String,

    /// Upper bound on any single provider request.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            geo_url: "https://api.openweathermap.org/geo/1.0".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ProviderConfig {
    /// The configured key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Time-to-live per cached data kind, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub weather_ttl_minutes: u64,
    pub forecast_ttl_minutes: u64,
    /// `None` keeps historical data for the whole session.
    pub historical_ttl_minutes: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { weather_ttl_minutes: 10, forecast_ttl_minutes: 30, historical_ttl_minutes: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of daily entries to produce; clamped to 1..=7.
    pub daily_limit: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { daily_limit: 5 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// api_key = "..."
/// timeout_secs = 10
///
/// [cache]
/// weather_ttl_minutes = 10
/// forecast_ttl_minutes = 30
///
/// [forecast]
/// daily_limit = 5
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub cache: CacheConfig,
    pub forecast: ForecastConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// The API key from the environment wins over the file.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory for durable user data (preferences).
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    /// Applies overrides from an environment lookup function.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty()) {
            self.provider.api_key = Some(key);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.provider.api_key = Some(api_key);
    }

    pub fn has_api_key(&self) -> bool {
        self.provider.api_key().is_some()
    }

    pub fn cache_ttls(&self) -> CacheTtls {
        CacheTtls {
            weather: Duration::from_secs(self.cache.weather_ttl_minutes * 60),
            forecast: Duration::from_secs(self.cache.forecast_ttl_minutes * 60),
            historical: self.cache.historical_ttl_minutes.map(|m| Duration::from_secs(m * 60)),
        }
    }

    pub fn daily_limit(&self) -> usize {
        self.forecast.daily_limit.clamp(1, 7)
    }
}
