//! Built-in location tables used when the provider cannot answer a search.
//!
//! The region table maps a state or country name to one representative city,
//! usually its capital. The sample list is a handful of well-known cities that
//! can be substring-matched offline.

/// Representative city for a region name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionCapital {
    pub name: &'static str,
    pub country: &'static str,
    pub state: &'static str,
    pub lat: f64,
    pub lon: f64,
}

/// One entry of the offline sample list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleCity {
    pub id: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    pub state: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub is_capital: bool,
}

const fn capital(
    name: &'static str,
    country: &'static str,
    state: &'static str,
    lat: f64,
    lon: f64,
) -> RegionCapital {
    RegionCapital { name, country, state, lat, lon }
}

/// Keys are lowercase region names.
pub const REGION_TABLE: &[(&str, RegionCapital)] = &[
    // Indian states
    ("maharashtra", capital("Mumbai", "IN", "Maharashtra", 19.0760, 72.8777)),
    ("delhi", capital("New Delhi", "IN", "Delhi", 28.6139, 77.2090)),
    ("karnataka", capital("Bengaluru", "IN", "Karnataka", 12.9716, 77.5946)),
    ("tamil nadu", capital("Chennai", "IN", "Tamil Nadu", 13.0827, 80.2707)),
    ("kerala", capital("Thiruvananthapuram", "IN", "Kerala", 8.5241, 76.9366)),
    ("gujarat", capital("Gandhinagar", "IN", "Gujarat", 23.2156, 72.6369)),
    ("rajasthan", capital("Jaipur", "IN", "Rajasthan", 26.9124, 75.7873)),
    ("punjab", capital("Chandigarh", "IN", "Punjab", 30.7333, 76.7794)),
    ("west bengal", capital("Kolkata", "IN", "West Bengal", 22.5726, 88.3639)),
    ("uttar pradesh", capital("Lucknow", "IN", "Uttar Pradesh", 26.8467, 80.9462)),
    // Countries
    ("india", capital("New Delhi", "IN", "Delhi", 28.6139, 77.2090)),
    ("usa", capital("Washington DC", "US", "District of Columbia", 38.9072, -77.0369)),
    ("united states", capital("Washington DC", "US", "District of Columbia", 38.9072, -77.0369)),
    ("canada", capital("Ottawa", "CA", "Ontario", 45.4215, -75.6972)),
    ("australia", capital("Canberra", "AU", "ACT", -35.2809, 149.1300)),
    ("uk", capital("London", "GB", "England", 51.5074, -0.1278)),
    ("united kingdom", capital("London", "GB", "England", 51.5074, -0.1278)),
    ("germany", capital("Berlin", "DE", "Berlin", 52.5200, 13.4050)),
    ("france", capital("Paris", "FR", "Paris", 48.8566, 2.3522)),
    ("japan", capital("Tokyo", "JP", "Tokyo", 35.6762, 139.6503)),
    ("china", capital("Beijing", "CN", "Beijing", 39.9042, 116.4074)),
    ("brazil", capital("Brasília", "BR", "Federal District", -15.7975, -47.8919)),
    ("russia", capital("Moscow", "RU", "Moscow", 55.7558, 37.6173)),
    ("mexico", capital("Mexico City", "MX", "CDMX", 19.4326, -99.1332)),
    // US states
    ("california", capital("Sacramento", "US", "California", 38.5816, -121.4944)),
    ("texas", capital("Austin", "US", "Texas", 30.2672, -97.7431)),
    ("florida", capital("Tallahassee", "US", "Florida", 30.4383, -84.2807)),
    ("new york", capital("Albany", "US", "New York", 42.6526, -73.7562)),
    ("illinois", capital("Springfield", "US", "Illinois", 39.7817, -89.6501)),
];

const fn sample(
    id: &'static str,
    name: &'static str,
    country: &'static str,
    state: &'static str,
    lat: f64,
    lon: f64,
    is_capital: bool,
) -> SampleCity {
    SampleCity { id, name, country, state, lat, lon, is_capital }
}

pub const SAMPLE_CITIES: &[SampleCity] = &[
    sample("mumbai-maharashtra", "Mumbai", "IN", "Maharashtra", 19.0760, 72.8777, true),
    sample("new-delhi-delhi", "New Delhi", "IN", "Delhi", 28.6139, 77.2090, true),
    sample("bengaluru-karnataka", "Bengaluru", "IN", "Karnataka", 12.9716, 77.5946, true),
    sample("chennai-tamilnadu", "Chennai", "IN", "Tamil Nadu", 13.0827, 80.2707, true),
    sample(
        "thiruvananthapuram-kerala",
        "Thiruvananthapuram",
        "IN",
        "Kerala",
        8.5241,
        76.9366,
        true,
    ),
    sample(
        "washington-usa",
        "Washington DC",
        "US",
        "District of Columbia",
        38.9072,
        -77.0369,
        true,
    ),
    sample("ottawa-canada", "Ottawa", "CA", "Ontario", 45.4215, -75.6972, true),
    sample("london-uk", "London", "GB", "England", 51.5074, -0.1278, true),
    sample("tokyo-japan", "Tokyo", "JP", "Tokyo", 35.6762, 139.6503, true),
    sample("beijing-china", "Beijing", "CN", "Beijing", 39.9042, 116.4074, true),
    sample("5128581", "New York", "US", "NY", 40.7128, -74.0060, false),
    sample("5368361", "Los Angeles", "US", "CA", 34.0522, -118.2437, false),
    sample("1850147", "Tokyo", "JP", "Tokyo", 35.6762, 139.6503, false),
    sample("2643743", "London", "GB", "England", 51.5074, -0.1278, false),
    sample("2988507", "Paris", "FR", "Paris", 48.8566, 2.3522, false),
];

/// Spelling variants accepted for a state name, mapped to the canonical
/// lowercase state.
const STATE_ALIASES: &[(&str, &str)] = &[
    ("maharashtra", "maharashtra"),
    ("delhi", "delhi"),
    ("karnataka", "karnataka"),
    ("tamil nadu", "tamil nadu"),
    ("tamilnadu", "tamil nadu"),
    ("kerala", "kerala"),
    ("gujarat", "gujarat"),
    ("rajasthan", "rajasthan"),
    ("punjab", "punjab"),
    ("west bengal", "west bengal"),
    ("uttar pradesh", "uttar pradesh"),
    ("california", "california"),
    ("texas", "texas"),
    ("florida", "florida"),
    ("new york", "new york"),
    ("illinois", "illinois"),
];

/// Country names mapped to lowercase ISO codes.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("india", "in"),
    ("usa", "us"),
    ("united states", "us"),
    ("canada", "ca"),
    ("australia", "au"),
    ("uk", "gb"),
    ("united kingdom", "gb"),
    ("germany", "de"),
    ("france", "fr"),
    ("japan", "jp"),
    ("china", "cn"),
    ("brazil", "br"),
    ("russia", "ru"),
    ("mexico", "mx"),
];

/// Exact lookup; `key` must already be lowercased and trimmed.
pub fn region_capital(key: &str) -> Option<&'static RegionCapital> {
    REGION_TABLE
        .iter()
        .find(|(region, _)| *region == key)
        .map(|(_, capital)| capital)
}

pub fn state_for_query(key: &str) -> Option<&'static str> {
    lookup(STATE_ALIASES, key)
}

pub fn country_code_for_query(key: &str) -> Option<&'static str> {
    lookup(COUNTRY_ALIASES, key)
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(alias, _)| *alias == key).map(|(_, value)| *value)
}

/// Sample cities matching a lowercase search term.
pub fn matching_samples(term: &str) -> impl Iterator<Item = &'static SampleCity> + '_ {
    let state = state_for_query(term);
    let country = country_code_for_query(term);

    SAMPLE_CITIES.iter().filter(move |city| {
        let state_lower = city.state.to_lowercase();
        let country_lower = city.country.to_lowercase();

        city.name.to_lowercase().contains(term)
            || state_lower.contains(term)
            || country_lower.contains(term)
            || (city.is_capital && state == Some(state_lower.as_str()))
            || (city.is_capital && country == Some(country_lower.as_str()))
    })
}
