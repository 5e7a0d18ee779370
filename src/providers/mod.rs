//! External AQI data providers.
//!
//! Two clients with different accuracy guarantees sit behind one
//! dispatch enum:
//!
//! - [`open_meteo`]: key-less Open-Meteo client that *estimates* AQI
//!   from current weather conditions (a heuristic, not a pollutant
//!   measurement).
//! - [`openweather`]: OpenWeatherMap client reporting true pollutant
//!   sampling through a 1-5 vendor index; requires an API key.
//!
//! The strategies are kept as distinct implementations rather than
//! unified, so callers can choose accuracy vs. zero-configuration.

pub mod open_meteo;
pub mod openweather;

pub use open_meteo::OpenMeteoClient;
pub use openweather::OpenWeatherClient;

use crate::error::ServiceError;
use crate::model::{CitySearchResult, Measurement};

/// A configured AQI provider.
#[derive(Clone)]
pub enum Provider {
    /// Weather-proxy heuristic estimates; no credentials required.
    OpenMeteo(OpenMeteoClient),
    /// Vendor-indexed pollutant sampling; needs an API key.
    OpenWeather(OpenWeatherClient),
}

impl Provider {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenMeteo(_) => "open-meteo",
            Provider::OpenWeather(_) => "openweather",
        }
    }

    /// Fetch the current measurement for a city name.
    pub async fn fetch_by_city(&self, city: &str) -> Result<Measurement, ServiceError> {
        match self {
            Provider::OpenMeteo(client) => client.fetch_by_city(city).await,
            Provider::OpenWeather(client) => client.fetch_by_city(city).await,
        }
    }

    /// Fetch the current measurement for a coordinate pair.
    pub async fn fetch_by_coords(&self, lat: f64, lon: f64) -> Result<Measurement, ServiceError> {
        match self {
            Provider::OpenMeteo(client) => client.fetch_by_coords(lat, lon).await,
            Provider::OpenWeather(client) => client.fetch_by_coords(lat, lon).await,
        }
    }

    /// Search for cities matching a query, in provider relevance order.
    pub async fn search_cities(&self, query: &str) -> Result<Vec<CitySearchResult>, ServiceError> {
        match self {
            Provider::OpenMeteo(client) => client.search_cities(query).await,
            Provider::OpenWeather(client) => client.search_cities(query).await,
        }
    }
}
