//! HTTP API handlers for Airsight.
//!
//! Thin axum handlers over the aggregation service: they validate
//! parameters, delegate, and map failures through [`ServiceError`]'s
//! response mapping. Error bodies carry the identifier and stage but
//! never credentials or internals.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::ServiceError;
use crate::health;
use crate::model::{
    AqiCategory, AqiQuery, AqiResponse, CitySearchQuery, CitySearchResponse, HealthRequest,
    HealthResponse, HistoricalResponse, HistoryQuery,
};
use crate::service::AqiService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: AqiService,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/aqi", get(get_aqi))
        .route("/api/aqi/history", get(get_history))
        .route("/api/health", post(interpret_health))
        .route("/api/cities", get(search_cities))
        .route("/api/cache", delete(clear_cache))
        .route("/health", get(health_check))
        .with_state(state)
}

/// GET /api/aqi - Current AQI for a city or coordinate pair.
///
/// # Query Parameters
///
/// - `city`: city name, or
/// - `lat` and `lon`: coordinates in degrees
///
/// Exactly one of the two forms must be present.
#[instrument(skip(state))]
pub async fn get_aqi(
    State(state): State<AppState>,
    Query(query): Query<AqiQuery>,
) -> Result<Json<AqiResponse>, ServiceError> {
    let result = match (&query.city, query.lat, query.lon) {
        (Some(city), _, _) => {
            let city = city.trim();
            if city.is_empty() {
                return Err(ServiceError::Validation(
                    "city must not be empty".to_string(),
                ));
            }
            state.service.get_aqi_for_city(city).await
        }
        (None, Some(lat), Some(lon)) => {
            validate_coordinates(lat, lon)?;
            state.service.get_aqi_for_coords(lat, lon).await
        }
        _ => Err(ServiceError::Validation(
            "missing required parameters: city or (lat & lon)".to_string(),
        )),
    };

    match result {
        Ok(response) => {
            info!(
                aqi = response.aqi,
                category = %response.category,
                "AQI request completed"
            );
            Ok(Json(response))
        }
        Err(e) => {
            warn!(error = %e, code = e.code(), "AQI request failed");
            Err(e)
        }
    }
}

/// GET /api/aqi/history - Historical AQI and trend summary for a city.
///
/// # Query Parameters
///
/// - `city` (required)
/// - `hours` (optional): lookback window, 1-720 (default: 24)
#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoricalResponse>, ServiceError> {
    let city = query.city.trim();
    if city.is_empty() {
        return Err(ServiceError::Validation(
            "city must not be empty".to_string(),
        ));
    }

    if !(1..=720).contains(&query.hours) {
        return Err(ServiceError::Validation(
            "invalid hours parameter, must be between 1 and 720".to_string(),
        ));
    }

    match state.service.get_historical(city, query.hours, Utc::now()).await {
        Ok(response) => {
            info!(
                city,
                records = response.data.len(),
                trend = ?response.summary.trend,
                "history request completed"
            );
            Ok(Json(response))
        }
        Err(e) => {
            warn!(city, error = %e, "history request failed");
            Err(e)
        }
    }
}

/// POST /api/health - Health interpretation for an AQI value.
///
/// # Request Body
///
/// ```json
/// {
///     "aqi": 85,
///     "temperature": 31.5
/// }
/// ```
///
/// Pure computation; nothing is fetched or stored.
#[instrument]
pub async fn interpret_health(
    Json(request): Json<HealthRequest>,
) -> Result<Json<HealthResponse>, ServiceError> {
    if !request.aqi.is_finite() || !(0.0..=500.0).contains(&request.aqi) {
        return Err(ServiceError::Validation(
            "invalid AQI value, must be between 0 and 500".to_string(),
        ));
    }

    let category = AqiCategory::from_aqi(request.aqi.round() as u16);
    let interpretation = health::interpret(category);
    let preventive_actions = health::preventive_actions(category, request.temperature);

    Ok(Json(HealthResponse {
        health_impact: interpretation.impact,
        recommendation: interpretation.recommendation,
        sensitive_groups: interpretation.sensitive_groups,
        preventive_actions,
        activities: interpretation.activities,
    }))
}

/// GET /api/cities - Search cities by name through the provider.
#[instrument(skip(state))]
pub async fn search_cities(
    State(state): State<AppState>,
    Query(query): Query<CitySearchQuery>,
) -> Result<Json<CitySearchResponse>, ServiceError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ServiceError::Validation(
            "query must not be empty".to_string(),
        ));
    }

    match state.service.search_cities(q).await {
        Ok(response) => {
            info!(query = q, results = response.results.len(), "city search completed");
            Ok(Json(response))
        }
        Err(e) => {
            warn!(query = q, error = %e, "city search failed");
            Err(e)
        }
    }
}

/// Response for DELETE /api/cache.
#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub cleared: u64,
}

/// DELETE /api/cache - Clear all cached AQI responses.
///
/// Administrative endpoint for category corrections or bad upstream
/// data; day-to-day expiry is TTL-driven.
#[instrument(skip(state))]
pub async fn clear_cache(
    State(state): State<AppState>,
) -> Result<Json<CacheClearResponse>, ServiceError> {
    match state.service.clear_cache().await {
        Ok(cleared) => {
            info!(cleared, "cache cleared");
            Ok(Json(CacheClearResponse { cleared }))
        }
        Err(e) => {
            warn!(error = %e, "cache clear failed");
            Err(e)
        }
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<(), ServiceError> {
    if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon)
    {
        return Err(ServiceError::Validation("invalid coordinates".to_string()));
    }
    Ok(())
}
