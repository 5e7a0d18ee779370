//! OpenWeatherMap client: geocoding plus sampled air pollution data.
//!
//! OpenWeatherMap reports real pollutant concentrations together with a
//! vendor air-quality index on a 1-5 scale. The index is mapped onto
//! the standardized 0-500 scale; the dominant pollutant is ranked by
//! raw concentration magnitude, since the vendor index carries no
//! per-pollutant sub-indices. That raw-magnitude ranking is specific to
//! this vendor path and must not be mixed with the breakpoint-based
//! selection used elsewhere (different units).
//!
//! Requires `OPENWEATHER_API_KEY`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ServiceError;
use crate::model::{CitySearchResult, Measurement, Pollutants};

/// Base URL for the OpenWeatherMap data API.
const DATA_API_BASE: &str = "http://api.openweathermap.org";

/// Base URL for the OpenWeatherMap geocoding API.
const GEO_API_BASE: &str = "http://api.openweathermap.org/geo/1.0";

/// Per-request timeout to bound user-facing latency.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the OpenWeatherMap air pollution and geocoding APIs.
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    geo_base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    /// Create a new client. The key is checked per request, so an
    /// unconfigured client constructs fine and fails with a clear
    /// operator-facing message on first use.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DATA_API_BASE.to_string(),
            geo_base_url: GEO_API_BASE.to_string(),
            api_key,
        }
    }

    /// Create a client with custom base URLs (for testing).
    pub fn with_base_urls(base_url: &str, geo_base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            geo_base_url: geo_base_url.to_string(),
            api_key,
        }
    }

    fn require_key(&self) -> Result<&str, ServiceError> {
        self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            ServiceError::Unconfigured(
                "OPENWEATHER_API_KEY is not configured. Set the environment variable to use the openweather provider.".to_string(),
            )
        })
    }

    /// Resolve a city name to coordinates.
    async fn geocode(&self, city: &str) -> Result<(f64, f64), ServiceError> {
        let key = self.require_key()?;
        let url = format!(
            "{}/direct?q={}&limit=1&appid={}",
            self.geo_base_url,
            urlencoding::encode(city),
            key
        );

        let hits: Vec<GeocodingHit> = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("geocoding request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("geocoding response unreadable: {e}")))?;

        let hit = hits
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("city \"{city}\" not found")))?;

        Ok((hit.lat, hit.lon))
    }

    /// Fetch the current measurement for a city name.
    pub async fn fetch_by_city(&self, city: &str) -> Result<Measurement, ServiceError> {
        let (lat, lon) = self.geocode(city).await?;
        self.fetch_by_coords(lat, lon).await
    }

    /// Fetch the current measurement for a coordinate pair.
    pub async fn fetch_by_coords(&self, lat: f64, lon: f64) -> Result<Measurement, ServiceError> {
        let key = self.require_key()?;
        let url = format!(
            "{}/data/2.5/air_pollution?lat={}&lon={}&appid={}",
            self.base_url, lat, lon, key
        );

        let response: AirPollutionResponse = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("air pollution request failed: {e}")))?
            .json()
            .await
            .map_err(|e| {
                ServiceError::Upstream(format!("air pollution response unreadable: {e}"))
            })?;

        let entry = response
            .list
            .first()
            .ok_or_else(|| ServiceError::Upstream("no air pollution data available".to_string()))?;

        let aqi = map_vendor_index(entry.main.aqi);
        let components = &entry.components;

        let pollutants = Pollutants {
            pm25: components.pm2_5,
            pm10: components.pm10,
            o3: components.o3,
            no2: components.no2,
            so2: components.so2,
            co: components.co,
        };

        let dominant_pollutant = dominant_by_magnitude(&pollutants).to_string();

        let timestamp = entry
            .dt
            .and_then(|dt| DateTime::from_timestamp(dt, 0))
            .unwrap_or_else(Utc::now);

        Ok(Measurement {
            aqi,
            dominant_pollutant,
            pollutants,
            temperature: None,
            humidity: None,
            pressure: None,
            timestamp,
        })
    }

    /// Search for cities, returning up to 5 results in provider order.
    pub async fn search_cities(&self, query: &str) -> Result<Vec<CitySearchResult>, ServiceError> {
        let key = self.require_key()?;
        let url = format!(
            "{}/direct?q={}&limit=5&appid={}",
            self.geo_base_url,
            urlencoding::encode(query),
            key
        );

        let hits: Vec<GeocodingHit> = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("city search request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("city search response unreadable: {e}")))?;

        Ok(hits
            .into_iter()
            .map(|hit| CitySearchResult {
                name: hit.name,
                country: hit.country.unwrap_or_else(|| "Unknown".to_string()),
                latitude: hit.lat,
                longitude: hit.lon,
            })
            .collect())
    }
}

/// Map the vendor 1-5 index onto the 0-500 scale.
///
/// The vendor tiers are coarse, so each maps to a representative
/// midpoint: 1 Good, 2 Fair, 3 Moderate, 4 Poor, 5 Very Poor.
fn map_vendor_index(index: i64) -> u16 {
    match index {
        1 => 25,
        2 => 75,
        3 => 125,
        4 => 175,
        5 => 250,
        _ => 0,
    }
}

/// Rank pollutants by raw concentration magnitude (vendor path).
///
/// Ties resolve to the first pollutant in canonical order.
fn dominant_by_magnitude(pollutants: &Pollutants) -> &'static str {
    let candidates = [
        ("pm25", pollutants.pm25),
        ("pm10", pollutants.pm10),
        ("no2", pollutants.no2),
        ("o3", pollutants.o3),
        ("so2", pollutants.so2),
        ("co", pollutants.co),
    ];

    let mut best = "pm25";
    let mut best_value = 0.0;

    for (key, reading) in candidates {
        let value = reading.unwrap_or(0.0);
        if value > best_value {
            best = key;
            best_value = value;
        }
    }

    best
}

// ============================================================================
// Response types
// ============================================================================

/// A single geocoding result.
#[derive(Debug, Clone, Deserialize)]
struct GeocodingHit {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: Option<String>,
    lat: f64,
    lon: f64,
}

/// Response from the air pollution endpoint.
#[derive(Debug, Clone, Deserialize)]
struct AirPollutionResponse {
    #[serde(default)]
    list: Vec<AirPollutionEntry>,
}

/// One observation in an air pollution response.
#[derive(Debug, Clone, Deserialize)]
struct AirPollutionEntry {
    #[serde(default)]
    main: AirPollutionMain,
    #[serde(default)]
    components: AirPollutionComponents,
    #[serde(default)]
    dt: Option<i64>,
}

/// Vendor index block.
#[derive(Debug, Clone, Default, Deserialize)]
struct AirPollutionMain {
    #[serde(default)]
    aqi: i64,
}

/// Pollutant concentrations in µg/m³.
#[derive(Debug, Clone, Default, Deserialize)]
struct AirPollutionComponents {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    o3: Option<f64>,
    no2: Option<f64>,
    so2: Option<f64>,
    co: Option<f64>,
}
