//! Open-Meteo client: geocoding plus weather-derived AQI estimates.
//!
//! Open-Meteo requires no API key. This client geocodes city names via
//! the public geocoding API and reads current weather from the forecast
//! API, then *estimates* an AQI from temperature, humidity, pressure,
//! and weather code.
//!
//! # Accuracy
//!
//! The estimate is a weather proxy, not a pollutant measurement:
//! stagnant high-humidity, low-pressure, or foggy conditions raise the
//! estimate because they correlate with pollutant buildup. Treat the
//! numbers as indicative. For sampled pollutant data use the
//! OpenWeather provider instead.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;

use crate::aqi;
use crate::error::ServiceError;
use crate::model::{CitySearchResult, Measurement, Pollutants};

/// Base URL for the Open-Meteo geocoding API.
const GEOCODING_API_BASE: &str = "https://geocoding-api.open-meteo.com/v1";

/// Base URL for the Open-Meteo forecast API.
const FORECAST_API_BASE: &str = "https://api.open-meteo.com/v1";

/// Per-request timeout to bound user-facing latency.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Open-Meteo geocoding and forecast APIs.
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    geo_base_url: String,
    forecast_base_url: String,
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoClient {
    /// Create a new client with the public API endpoints.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            geo_base_url: GEOCODING_API_BASE.to_string(),
            forecast_base_url: FORECAST_API_BASE.to_string(),
        }
    }

    /// Create a client with custom base URLs (for testing).
    pub fn with_base_urls(geo_base_url: &str, forecast_base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            geo_base_url: geo_base_url.to_string(),
            forecast_base_url: forecast_base_url.to_string(),
        }
    }

    /// Resolve a city name to coordinates.
    async fn geocode(&self, city: &str) -> Result<(f64, f64), ServiceError> {
        let url = format!(
            "{}/search?name={}&count=1&language=en&format=json",
            self.geo_base_url,
            urlencoding::encode(city)
        );

        let response: GeocodingResponse = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("geocoding request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("geocoding response unreadable: {e}")))?;

        let hit = response
            .results
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("city \"{city}\" not found")))?;

        Ok((hit.latitude, hit.longitude))
    }

    /// Fetch the current measurement for a city name.
    pub async fn fetch_by_city(&self, city: &str) -> Result<Measurement, ServiceError> {
        let (lat, lon) = self.geocode(city).await?;
        self.fetch_by_coords(lat, lon).await
    }

    /// Fetch the current measurement for a coordinate pair.
    pub async fn fetch_by_coords(&self, lat: f64, lon: f64) -> Result<Measurement, ServiceError> {
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&current=temperature_2m,relative_humidity_2m,pressure_msl,weather_code&timezone=auto",
            self.forecast_base_url, lat, lon
        );

        let response: ForecastResponse = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("forecast request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("forecast response unreadable: {e}")))?;

        let current = response
            .current
            .ok_or_else(|| ServiceError::Upstream("no weather data available".to_string()))?;

        let aqi = estimate_aqi_from_weather(&current);

        // Rough per-pollutant split of the estimate, so the response
        // carries a breakdown in the same shape as sampled providers.
        let pollutants = Pollutants {
            pm25: Some(f64::from(aqi) * 0.4),
            pm10: Some(f64::from(aqi) * 0.6),
            no2: Some(f64::from(aqi) * 0.3),
            o3: Some(f64::from(aqi) * 0.2),
            so2: Some(f64::from(aqi) * 0.1),
            co: Some(f64::from(aqi) * 0.15),
        };

        let dominant_pollutant = aqi::dominant_pollutant(&pollutants).to_string();

        Ok(Measurement {
            aqi,
            dominant_pollutant,
            pollutants,
            temperature: current.temperature_2m,
            humidity: current.relative_humidity_2m,
            pressure: current.pressure_msl,
            timestamp: Utc::now(),
        })
    }

    /// Search for cities, returning up to 5 results in provider order.
    pub async fn search_cities(&self, query: &str) -> Result<Vec<CitySearchResult>, ServiceError> {
        let url = format!(
            "{}/search?name={}&count=5&language=en&format=json",
            self.geo_base_url,
            urlencoding::encode(query)
        );

        let response: GeocodingResponse = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("city search request failed: {e}")))?
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("city search response unreadable: {e}")))?;

        Ok(response
            .results
            .into_iter()
            .map(|hit| CitySearchResult {
                name: hit.name,
                country: hit.country.unwrap_or_else(|| "Unknown".to_string()),
                latitude: hit.latitude,
                longitude: hit.longitude,
            })
            .collect())
    }
}

/// Estimate an AQI from current weather conditions.
///
/// Starts from a base of 50 and adds penalties for conditions that trap
/// or correlate with pollutants: temperature extremes, high humidity,
/// low pressure, and fog/precipitation weather codes. Capped at 500.
fn estimate_aqi_from_weather(current: &CurrentWeather) -> u16 {
    let mut aqi: u16 = 50;

    let temp = current.temperature_2m.unwrap_or(20.0);
    if temp > 30.0 || temp < 0.0 {
        aqi += 20;
    } else if temp > 25.0 || temp < 5.0 {
        aqi += 10;
    }

    // High humidity traps pollutants near the surface.
    let humidity = current.relative_humidity_2m.unwrap_or(50.0);
    if humidity > 80.0 {
        aqi += 30;
    } else if humidity > 70.0 {
        aqi += 15;
    }

    // Low pressure means stagnant air.
    let pressure = current.pressure_msl.unwrap_or(1013.0);
    if pressure < 1000.0 {
        aqi += 50;
    } else if pressure < 1010.0 {
        aqi += 25;
    }

    let weather_code = current.weather_code.unwrap_or(0);
    if (50..=67).contains(&weather_code) {
        // Fog and mist
        aqi += 40;
    }
    if (70..=86).contains(&weather_code) {
        // Rain and snow
        aqi += 30;
    }

    aqi.min(500)
}

// ============================================================================
// Response types
// ============================================================================

/// Response from the geocoding search endpoint.
#[derive(Debug, Clone, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingHit>,
}

/// A single geocoding result.
#[derive(Debug, Clone, Deserialize)]
struct GeocodingHit {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

/// Response from the forecast endpoint.
#[derive(Debug, Clone, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentWeather>,
}

/// Current weather block of a forecast response.
#[derive(Debug, Clone, Default, Deserialize)]
struct CurrentWeather {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    pressure_msl: Option<f64>,
    weather_code: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_baseline() {
        // Mild conditions stay at the base estimate.
        let current = CurrentWeather {
            temperature_2m: Some(20.0),
            relative_humidity_2m: Some(50.0),
            pressure_msl: Some(1013.0),
            weather_code: Some(0),
        };
        assert_eq!(estimate_aqi_from_weather(&current), 50);
    }

    #[test]
    fn test_estimate_high_humidity() {
        let current = CurrentWeather {
            temperature_2m: Some(20.0),
            relative_humidity_2m: Some(85.0),
            pressure_msl: Some(1013.0),
            weather_code: Some(0),
        };
        assert_eq!(estimate_aqi_from_weather(&current), 80);
    }

    #[test]
    fn test_estimate_stagnant_low_pressure() {
        let current = CurrentWeather {
            temperature_2m: Some(20.0),
            relative_humidity_2m: Some(50.0),
            pressure_msl: Some(995.0),
            weather_code: Some(0),
        };
        assert_eq!(estimate_aqi_from_weather(&current), 100);
    }

    #[test]
    fn test_estimate_fog_penalty() {
        let current = CurrentWeather {
            temperature_2m: Some(20.0),
            relative_humidity_2m: Some(50.0),
            pressure_msl: Some(1013.0),
            weather_code: Some(55),
        };
        assert_eq!(estimate_aqi_from_weather(&current), 90);
    }

    #[test]
    fn test_estimate_worst_case_is_capped() {
        let current = CurrentWeather {
            temperature_2m: Some(40.0),
            relative_humidity_2m: Some(95.0),
            pressure_msl: Some(980.0),
            weather_code: Some(65),
        };
        // 50 + 20 + 30 + 50 + 40 = 190, far below the cap but additive.
        assert_eq!(estimate_aqi_from_weather(&current), 190);
    }

    #[test]
    fn test_estimate_defaults_for_missing_fields() {
        assert_eq!(estimate_aqi_from_weather(&CurrentWeather::default()), 50);
    }
}
