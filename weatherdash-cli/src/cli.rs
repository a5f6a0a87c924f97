use anyhow::{Context, Result, bail};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use tracing::info;

use weatherdash_core::{
    CacheKind, Config, ForecastBundle, Location, SourceTier, TemperatureUnit, Theme,
    WeatherDashboard, WeatherSnapshot,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// List locations matching a query.
    Search {
        /// City, state or country name.
        query: String,
    },

    /// Show current conditions.
    Current { query: String },

    /// Show the daily forecast.
    Forecast {
        query: String,

        /// Number of days (1-7); defaults to the configured limit.
        #[arg(long)]
        days: Option<usize>,
    },

    /// Show the last 24 hours.
    History { query: String },

    /// Manage favorite locations.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Set the temperature unit: celsius or fahrenheit.
    Unit { unit: String },

    /// Set the theme: default, light or dark.
    Theme { theme: String },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    List,
    /// Resolve a query and save its first match.
    Add { query: String },
    /// Remove by location id (see `favorites list`).
    Remove { id: String },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            command => run_command(command).await,
        }
    }
}

async fn run_command(command: Command) -> Result<()> {
    let mut config = Config::load()?;
    if let Command::Forecast { days: Some(days), .. } = &command {
        if !(1..=7).contains(days) {
            bail!("--days must be between 1 and 7, got {days}");
        }
        config.forecast.daily_limit = *days;
    }
    if !config.has_api_key() {
        info!("no API key configured, showing offline data; run `weatherdash configure`");
    }

    let dashboard = WeatherDashboard::from_config(&config)?;
    let unit = dashboard.preferences().preferences().unit;

    match command {
        Command::Configure => configure()?,
        Command::Search { query } => {
            let found = dashboard.resolver().resolve(&query).await;
            if found.is_empty() {
                println!("No matches for '{query}'.");
            }
            let prefs = dashboard.preferences().preferences();
            for loc in &found {
                let star = if prefs.is_favorite(&loc.id) { "*" } else { " " };
                println!(
                    "{star} {:<40} {:>8.4} {:>9.4}  [{}] {}",
                    loc.display_name(),
                    loc.lat,
                    loc.lon,
                    tier_label(loc.source_tier),
                    loc.id
                );
            }
        }
        Command::Current { query } => {
            let loc = dashboard.resolver().resolve_first(&query).await?;
            let snapshot = dashboard.fetcher().fetch_current(&loc).await;
            print_current(&loc, &snapshot, unit);
            let stale = dashboard.fetcher().freshness(CacheKind::Weather, &loc);
            if stale.is_some_and(|f| f.is_stale) {
                println!("(data may be outdated)");
            }
        }
        Command::Forecast { query, .. } => {
            let loc = dashboard.resolver().resolve_first(&query).await?;
            let bundle = dashboard.fetcher().fetch_forecast(&loc).await;
            print_forecast(&loc, &bundle, unit);
        }
        Command::History { query } => {
            let loc = dashboard.resolver().resolve_first(&query).await?;
            let series = dashboard.fetcher().fetch_historical(&loc).await;
            println!("{}{}", loc.display_name(), synthetic_note(series.is_synthetic));
            for point in &series.points {
                let at = DateTime::from_timestamp(point.epoch_seconds, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| point.epoch_seconds.to_string());
                println!(
                    "  {at}  {:>6}  {:>3}%  {:.0} hPa",
                    unit.format(point.temp_c),
                    point.humidity_pct,
                    point.pressure_hpa
                );
            }
        }
        Command::Favorites { action } => favorites(&dashboard, action, unit).await?,
        Command::Unit { unit } => {
            let unit: TemperatureUnit = unit.parse()?;
            dashboard.preferences().set_unit(unit)?;
            println!("Temperature unit set to {unit}.");
        }
        Command::Theme { theme } => {
            let theme: Theme = theme.parse()?;
            dashboard.preferences().set_theme(theme)?;
            println!("Theme set to {theme}.");
        }
    }

    Ok(())
}

fn configure() -> Result<()> {
    // The file alone, so an API key from the environment is not written to disk.
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.trim().to_string());
    config.save_to(&path)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn favorites(
    dashboard: &WeatherDashboard,
    action: FavoritesAction,
    unit: TemperatureUnit,
) -> Result<()> {
    let store = dashboard.preferences();

    match action {
        FavoritesAction::List => {
            let favorites = store.preferences().favorites;
            if favorites.is_empty() {
                println!("No favorites yet. Add one with `weatherdash favorites add <query>`.");
            }
            for loc in &favorites {
                let snapshot = dashboard.fetcher().fetch_current(loc).await;
                println!(
                    "{:<40} {:>6}  {:<10}  {}{}",
                    loc.display_name(),
                    unit.format(snapshot.temp_c),
                    snapshot.condition_main.as_str(),
                    loc.id,
                    synthetic_note(snapshot.is_synthetic)
                );
            }
        }
        FavoritesAction::Add { query } => {
            let loc = dashboard.resolver().resolve_first(&query).await?;
            if store.add_favorite(loc.clone())? {
                println!("Added {} ({}).", loc.display_name(), loc.id);
            } else {
                println!("{} is already a favorite.", loc.display_name());
            }
        }
        FavoritesAction::Remove { id } => {
            if !store.remove_favorite(&id)? {
                bail!("No favorite with id '{id}'");
            }
            println!("Removed {id}.");
        }
    }

    Ok(())
}

fn print_current(loc: &Location, snapshot: &WeatherSnapshot, unit: TemperatureUnit) {
    println!("{}{}", loc.display_name(), synthetic_note(snapshot.is_synthetic));
    println!(
        "  {}  {} (feels like {})",
        snapshot.condition_description,
        unit.format(snapshot.temp_c),
        unit.format(snapshot.feels_like_c)
    );
    println!("  Humidity:   {}%", snapshot.humidity_pct);
    println!("  Pressure:   {:.0} hPa", snapshot.pressure_hpa);
    match snapshot.wind_deg {
        Some(deg) => println!("  Wind:       {:.1} m/s from {deg:.0}°", snapshot.wind_speed_ms),
        None => println!("  Wind:       {:.1} m/s", snapshot.wind_speed_ms),
    }
    println!("  Visibility: {:.1} km", snapshot.visibility_km);
    println!("  Observed:   {}", snapshot.observed_at.format("%Y-%m-%d %H:%M UTC"));
}

fn print_forecast(loc: &Location, bundle: &ForecastBundle, unit: TemperatureUnit) {
    println!("{}{}", loc.display_name(), synthetic_note(bundle.is_synthetic));
    for day in &bundle.daily {
        println!(
            "  {}  {:>6} / {:<6}  {:<22} {:>3}%  {:.1} m/s",
            day.date.format("%a %d %b"),
            unit.format(day.temp_min_c),
            unit.format(day.temp_max_c),
            day.condition_description,
            day.humidity_pct,
            day.wind_speed_ms
        );
    }
}

fn synthetic_note(is_synthetic: bool) -> &'static str {
    if is_synthetic { "  (offline sample data)" } else { "" }
}

fn tier_label(tier: SourceTier) -> &'static str {
    match tier {
        SourceTier::Live => "live",
        SourceTier::Geocode => "geocode",
        SourceTier::StaticRegion => "region",
        SourceTier::StaticSample => "sample",
    }
}
