//! AQI aggregation service.
//!
//! Orchestrates the per-request pipeline: cache lookup, provider fetch
//! on a miss, enrichment with category and health guidance, best-effort
//! persistence, and a best-effort cache write-through. The side-effect
//! steps (persist, cache write) are logged on failure and swallowed;
//! the caller still gets a valid answer when storage is down.
//!
//! Concurrent misses for the same key are not coalesced; each performs
//! its own provider fetch and the last write-through wins.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::cache::{self, AQI_KEY_PREFIX, Cache};
use crate::error::ServiceError;
use crate::health;
use crate::model::{
    AqiCategory, AqiResponse, CitySearchResponse, HistoricalResponse, HistoryPeriod,
    HistorySummary, Measurement,
};
use crate::providers::Provider;
use crate::storage::Storage;

/// Cache behavior for the service.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// Whether the read-through cache is consulted and written at all.
    pub enabled: bool,
    /// TTL for cached responses, in seconds.
    pub ttl_seconds: i64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
        }
    }
}

/// The aggregation service owning its provider, cache, and store.
#[derive(Clone)]
pub struct AqiService {
    provider: Provider,
    storage: Storage,
    cache: Cache,
    policy: CachePolicy,
}

impl AqiService {
    /// Create a new service from explicitly constructed collaborators.
    pub fn new(provider: Provider, storage: Storage, cache: Cache, policy: CachePolicy) -> Self {
        Self {
            provider,
            storage,
            cache,
            policy,
        }
    }

    /// Get the enriched AQI response for a city name.
    ///
    /// Read-through: a cache hit short-circuits the provider entirely;
    /// a miss fetches once (no retry), enriches, persists best-effort,
    /// and writes the cache back.
    pub async fn get_aqi_for_city(&self, city: &str) -> Result<AqiResponse, ServiceError> {
        let key = cache::city_key(city);

        if let Some(cached) = self.read_cache(&key).await {
            info!(city, "cache hit");
            return Ok(cached);
        }

        debug!(city, provider = self.provider.name(), "cache miss, fetching");
        let measurement = self.provider.fetch_by_city(city).await?;
        let response = enrich_measurement(measurement.clone(), Some(city.to_string()));

        self.persist_record(city, &measurement, response.category_code)
            .await;
        self.write_cache(&key, &response).await;

        info!(
            city,
            aqi = response.aqi,
            category = %response.category,
            "fresh AQI response"
        );

        Ok(response)
    }

    /// Get the enriched AQI response for a coordinate pair.
    ///
    /// Same pipeline as the city path minus geocoding and persistence:
    /// a bare coordinate pair has no city identity to record against.
    pub async fn get_aqi_for_coords(&self, lat: f64, lon: f64) -> Result<AqiResponse, ServiceError> {
        let key = cache::coords_key(lat, lon);

        if let Some(cached) = self.read_cache(&key).await {
            info!(lat, lon, "cache hit");
            return Ok(cached);
        }

        debug!(lat, lon, provider = self.provider.name(), "cache miss, fetching");
        let measurement = self.provider.fetch_by_coords(lat, lon).await?;
        let response = enrich_measurement(measurement, None);

        self.write_cache(&key, &response).await;

        info!(
            lat,
            lon,
            aqi = response.aqi,
            category = %response.category,
            "fresh AQI response"
        );

        Ok(response)
    }

    /// Get historical records and a trend summary for a city.
    ///
    /// `hours` is validated at the API boundary (1-720). An unknown
    /// city, an empty window, or a degraded store all surface as
    /// `NotFound`: no data is no data, never a crash.
    pub async fn get_historical(
        &self,
        city: &str,
        hours: i64,
        now: DateTime<Utc>,
    ) -> Result<HistoricalResponse, ServiceError> {
        let no_data = || {
            ServiceError::NotFound(format!("no historical data available for city \"{city}\""))
        };

        let city_id = match self.storage.find_city(city).await {
            Ok(Some(id)) => id,
            Ok(None) => return Err(no_data()),
            Err(e) => {
                warn!(city, error = %e, "historical lookup failed, reporting no data");
                return Err(no_data());
            }
        };

        let since = now - Duration::hours(hours);
        let records = match self.storage.query_history(city_id, since).await {
            Ok(records) => records,
            Err(e) => {
                warn!(city, error = %e, "historical query failed, reporting no data");
                return Err(no_data());
            }
        };

        let values: Vec<i64> = records.iter().map(|r| r.aqi).collect();
        let summary = HistorySummary::from_values(&values).ok_or_else(no_data)?;

        info!(city, records = records.len(), trend = ?summary.trend, "history queried");

        Ok(HistoricalResponse {
            city_name: city.to_string(),
            period: HistoryPeriod {
                start: since,
                end: now,
                hours,
            },
            data: records,
            summary,
        })
    }

    /// Search for cities through the configured provider.
    pub async fn search_cities(&self, query: &str) -> Result<CitySearchResponse, ServiceError> {
        let results = self.provider.search_cities(query).await?;

        Ok(CitySearchResponse {
            query: query.to_string(),
            results,
        })
    }

    /// Clear every cached AQI response. Administrative escape hatch for
    /// category corrections or bad upstream data; normal operation
    /// relies on TTL expiry alone.
    pub async fn clear_cache(&self) -> Result<u64, ServiceError> {
        self.cache
            .delete_by_prefix(AQI_KEY_PREFIX)
            .await
            .map_err(|e| ServiceError::Storage(format!("cache clear failed: {e}")))
    }

    /// Cache read that never fails the request: errors and undecodable
    /// payloads are logged and treated as a miss.
    async fn read_cache(&self, key: &str) -> Option<AqiResponse> {
        if !self.policy.enabled {
            return None;
        }

        let bytes = match self.cache.get(key).await {
            Ok(found) => found?,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(key, error = %e, "cached payload undecodable, treating as miss");
                None
            }
        }
    }

    /// Best-effort cache write-through.
    async fn write_cache(&self, key: &str, response: &AqiResponse) {
        if !self.policy.enabled {
            return;
        }

        let bytes = match serde_json::to_vec(response) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "response serialization failed, skipping cache write");
                return;
            }
        };

        if let Err(e) = self
            .cache
            .set_with_ttl(key, &bytes, self.policy.ttl_seconds)
            .await
        {
            warn!(key, error = %e, "cache write failed");
        } else {
            debug!(key, ttl = self.policy.ttl_seconds, "response cached");
        }
    }

    /// Best-effort historical append. Never propagates: a broken store
    /// must not break the user-facing request.
    async fn persist_record(&self, city: &str, measurement: &Measurement, category: AqiCategory) {
        // Country and coordinates are unknown on the city-name path;
        // the geocoded identity lives with the provider.
        let city_id = match self.storage.upsert_city(city, "Unknown", 0.0, 0.0).await {
            Ok(id) => id,
            Err(e) => {
                warn!(city, error = %e, "city upsert failed, skipping record");
                return;
            }
        };

        if let Err(e) = self
            .storage
            .insert_record(city_id, measurement, category.code())
            .await
        {
            warn!(city, error = %e, "record insert failed");
        } else {
            debug!(city, aqi = measurement.aqi, "record stored");
        }
    }
}

/// Enrich a raw measurement into the full response shape.
///
/// Pure: classification, health interpretation, and preventive actions
/// are all deterministic functions of the measurement.
fn enrich_measurement(measurement: Measurement, city_name: Option<String>) -> AqiResponse {
    let category = AqiCategory::from_aqi(measurement.aqi);
    let info = category.info();
    let interpretation = health::interpret(category);

    let recommendation = match measurement.temperature {
        Some(t) => health::temperature_adjusted_recommendation(&interpretation.recommendation, t),
        None => interpretation.recommendation,
    };

    let preventive_actions = health::preventive_actions(category, measurement.temperature);

    AqiResponse {
        aqi: measurement.aqi,
        category: info.label.to_string(),
        category_code: category,
        color: info.color.to_string(),
        dominant_pollutant: measurement.dominant_pollutant,
        pollutants: measurement.pollutants,
        temperature: measurement.temperature,
        humidity: measurement.humidity,
        health_impact: interpretation.impact,
        recommendation,
        sensitive_groups: interpretation.sensitive_groups,
        activities: interpretation.activities,
        preventive_actions,
        timestamp: measurement.timestamp,
        city_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutdoorActivity, Pollutants, Trend};
    use crate::providers::OpenMeteoClient;

    async fn setup_test_service() -> AqiService {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        let cache = Cache::new("sqlite::memory:").await.unwrap();
        let provider = Provider::OpenMeteo(OpenMeteoClient::new());

        AqiService::new(provider, storage, cache, CachePolicy::default())
    }

    fn sample_measurement(aqi: u16) -> Measurement {
        Measurement {
            aqi,
            dominant_pollutant: "pm25".to_string(),
            pollutants: Pollutants {
                pm25: Some(30.0),
                pm10: Some(18.0),
                ..Default::default()
            },
            temperature: Some(21.0),
            humidity: Some(55.0),
            pressure: Some(1015.0),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_enrich_moderate_measurement() {
        let response = enrich_measurement(sample_measurement(85), Some("Paris".to_string()));

        assert_eq!(response.aqi, 85);
        assert_eq!(response.category, "Moderate");
        assert_eq!(response.category_code, AqiCategory::Moderate);
        assert_eq!(response.color, "#FFFF00");
        assert_eq!(response.activities.outdoor, OutdoorActivity::Safe);
        assert_eq!(response.city_name.as_deref(), Some("Paris"));
        assert_eq!(response.dominant_pollutant, "pm25");
    }

    #[test]
    fn test_enrich_applies_temperature_adjustment() {
        let mut measurement = sample_measurement(42);
        measurement.temperature = Some(33.0);

        let response = enrich_measurement(measurement, None);

        assert!(response.recommendation.ends_with("seek shade when outdoors."));
        assert!(response.preventive_actions.contains(&"Stay hydrated".to_string()));
        assert!(response.city_name.is_none());
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let a = enrich_measurement(sample_measurement(160), None);
        let b = enrich_measurement(sample_measurement(160), None);
        assert_eq!(a.health_impact, b.health_impact);
        assert_eq!(a.preventive_actions, b.preventive_actions);
        assert_eq!(a.activities, b.activities);
    }

    #[tokio::test]
    async fn test_cache_hit_short_circuits_provider() {
        let service = setup_test_service().await;

        // Seed the cache directly; the provider would need the network,
        // so a hit proves the fetch never ran.
        let response = enrich_measurement(sample_measurement(85), Some("Paris".to_string()));
        let bytes = serde_json::to_vec(&response).unwrap();
        service
            .cache
            .set_with_ttl(&cache::city_key("Paris"), &bytes, 3600)
            .await
            .unwrap();

        let served = service.get_aqi_for_city("Paris").await.unwrap();
        assert_eq!(served.aqi, 85);
        assert_eq!(served.category, "Moderate");
    }

    #[tokio::test]
    async fn test_cache_key_normalization_shares_entries() {
        let service = setup_test_service().await;

        let response = enrich_measurement(sample_measurement(42), Some("Paris".to_string()));
        let bytes = serde_json::to_vec(&response).unwrap();
        service
            .cache
            .set_with_ttl(&cache::city_key("paris"), &bytes, 3600)
            .await
            .unwrap();

        // Different casing hits the same normalized key.
        let served = service.get_aqi_for_city("PARIS").await.unwrap();
        assert_eq!(served.aqi, 42);
    }

    #[tokio::test]
    async fn test_historical_unknown_city_is_not_found() {
        let service = setup_test_service().await;

        let result = service.get_historical("Atlantis", 24, Utc::now()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_historical_known_city_without_records_is_not_found() {
        let service = setup_test_service().await;
        service
            .storage
            .upsert_city("Paris", "Unknown", 0.0, 0.0)
            .await
            .unwrap();

        let result = service.get_historical("Paris", 24, Utc::now()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_historical_trend_over_records() {
        let service = setup_test_service().await;
        let now = Utc::now();

        let city_id = service
            .storage
            .upsert_city("Paris", "Unknown", 0.0, 0.0)
            .await
            .unwrap();

        for (i, aqi) in [40u16, 40, 40, 80, 80, 80].into_iter().enumerate() {
            let mut measurement = sample_measurement(aqi);
            measurement.timestamp = now - Duration::minutes(60 - i as i64 * 10);
            service
                .storage
                .insert_record(city_id, &measurement, AqiCategory::from_aqi(aqi).code())
                .await
                .unwrap();
        }

        let history = service.get_historical("Paris", 24, now).await.unwrap();

        assert_eq!(history.data.len(), 6);
        assert_eq!(history.summary.average, 60);
        assert_eq!(history.summary.min, 40);
        assert_eq!(history.summary.max, 80);
        assert_eq!(history.summary.trend, Trend::Worsening);
        assert_eq!(history.period.hours, 24);
    }

    #[tokio::test]
    async fn test_clear_cache_reports_count() {
        let service = setup_test_service().await;

        service
            .cache
            .set_with_ttl(&cache::city_key("Paris"), b"{}", 3600)
            .await
            .unwrap();
        service
            .cache
            .set_with_ttl(&cache::coords_key(1.0, 2.0), b"{}", 3600)
            .await
            .unwrap();

        assert_eq!(service.clear_cache().await.unwrap(), 2);
        assert_eq!(service.clear_cache().await.unwrap(), 0);
    }
}
