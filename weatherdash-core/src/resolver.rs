//! Free-text query to [`Location`] resolution.
//!
//! Four strategies are tried strictly in order and the first non-empty result
//! wins. Provider failures inside a strategy count as "nothing found"; the only
//! outcome a caller ever sees is a possibly empty list.

use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

use crate::{
    catalog::{self, RegionCapital, SampleCity},
    error::WeatherError,
    model::{Location, PlaceMatch, SourceTier, stable_id},
    provider::{WeatherProvider, bounded},
};

/// Shorter (trimmed) queries are answered with an empty list.
pub const MIN_QUERY_LEN: usize = 2;
pub const GEOCODE_LIMIT: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Live,
    Geocode,
    StaticRegion,
    StaticSample,
}

impl Strategy {
    const ORDER: [Strategy; 4] =
        [Strategy::Live, Strategy::Geocode, Strategy::StaticRegion, Strategy::StaticSample];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Geocode => "geocode",
            Self::StaticRegion => "static_region",
            Self::StaticSample => "static_sample",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    provider: Arc<dyn WeatherProvider>,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn WeatherProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn resolve(&self, query: &str) -> Vec<Location> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }

        for strategy in Strategy::ORDER {
            match self.run(strategy, query).await {
                Ok(found) if !found.is_empty() => {
                    debug!(query, strategy = strategy.as_str(), count = found.len(), "resolved");
                    return found;
                }
                Ok(_) => debug!(query, strategy = strategy.as_str(), "no match"),
                Err(err) if err.is_expected() => {
                    debug!(query, strategy = strategy.as_str(), error = %err, "strategy skipped")
                }
                Err(err) => {
                    warn!(query, strategy = strategy.as_str(), error = %err, "strategy failed")
                }
            }
        }

        Vec::new()
    }

    /// First location for `query`, or [`WeatherError::NoMatch`].
    pub async fn resolve_first(&self, query: &str) -> Result<Location, WeatherError> {
        self.resolve(query)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NoMatch(query.trim().to_string()))
    }

    async fn run(&self, strategy: Strategy, query: &str) -> Result<Vec<Location>, WeatherError> {
        match strategy {
            Strategy::Live => {
                let place =
                    bounded(self.timeout, "live lookup", self.provider.lookup_by_name(query))
                        .await?;
                Ok(vec![live_location(place)])
            }
            Strategy::Geocode => {
                let places = bounded(
                    self.timeout,
                    "geocoding",
                    self.provider.geocode(query, GEOCODE_LIMIT),
                )
                .await?;
                Ok(places.into_iter().map(geocoded_location).collect())
            }
            Strategy::StaticRegion => {
                let key = query.to_lowercase();
                Ok(catalog::region_capital(&key).map(region_location).into_iter().collect())
            }
            Strategy::StaticSample => {
                let term = query.to_lowercase();
                Ok(catalog::matching_samples(&term).map(sample_location).collect())
            }
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn live_location(place: PlaceMatch) -> Location {
    let id = match &place.provider_id {
        Some(id) => id.clone(),
        None => place_id(&place),
    };
    from_place(id, place, SourceTier::Live)
}

fn geocoded_location(place: PlaceMatch) -> Location {
    let id = place_id(&place);
    from_place(id, place, SourceTier::Geocode)
}

fn place_id(place: &PlaceMatch) -> String {
    stable_id(&[&place.name, &place.country, &place.lat.to_string(), &place.lon.to_string()])
}

fn from_place(id: String, place: PlaceMatch, source_tier: SourceTier) -> Location {
    Location {
        id,
        name: place.name,
        country: place.country,
        state: place.state,
        lat: place.lat,
        lon: place.lon,
        is_capital: false,
        source_tier,
    }
}

fn region_location(capital: &RegionCapital) -> Location {
    Location {
        id: stable_id(&[capital.name, capital.country]),
        name: capital.name.to_string(),
        country: capital.country.to_string(),
        state: non_empty(capital.state),
        lat: capital.lat,
        lon: capital.lon,
        is_capital: true,
        source_tier: SourceTier::StaticRegion,
    }
}

fn sample_location(city: &SampleCity) -> Location {
    Location {
        id: city.id.to_string(),
        name: city.name.to_string(),
        country: city.country.to_string(),
        state: non_empty(city.state),
        lat: city.lat,
        lon: city.lon,
        is_capital: city.is_capital,
        source_tier: SourceTier::StaticSample,
    }
}
