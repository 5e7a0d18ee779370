//! Integration tests for Airsight API endpoints.
//!
//! These tests verify the full request/response cycle through the HTTP
//! API. A second local axum app stands in for the Open-Meteo upstream so
//! the provider path runs for real, with a request counter proving that
//! cached responses never reach the provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Json, Router, routing::get};
use axum_test::TestServer;
use serde_json::{Value, json};

use airsight::api::{AppState, router};
use airsight::cache::Cache;
use airsight::providers::{OpenMeteoClient, Provider};
use airsight::service::{AqiService, CachePolicy};
use airsight::storage::Storage;

/// Start a mock Open-Meteo upstream on an ephemeral port.
///
/// `/search` geocodes everything to Paris; `/forecast` reports weather
/// that the heuristic maps to AQI 85 (temp 27 adds 10, pressure 1005
/// adds 25 on the base 50). Returns the base URL and a counter of
/// forecast (i.e. provider fetch) calls.
async fn spawn_mock_provider() -> (String, Arc<AtomicUsize>) {
    let fetch_count = Arc::new(AtomicUsize::new(0));
    let counter = fetch_count.clone();

    let app = Router::new()
        .route(
            "/search",
            get(|| async {
                Json(json!({
                    "results": [
                        {
                            "name": "Paris",
                            "country": "France",
                            "latitude": 48.85,
                            "longitude": 2.35
                        }
                    ]
                }))
            }),
        )
        .route(
            "/forecast",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "current": {
                            "temperature_2m": 27.0,
                            "relative_humidity_2m": 50.0,
                            "pressure_msl": 1005.0,
                            "weather_code": 0
                        }
                    }))
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), fetch_count)
}

async fn create_test_server() -> (TestServer, Arc<AtomicUsize>) {
    let (base_url, fetch_count) = spawn_mock_provider().await;

    let storage = Storage::new("sqlite::memory:").await.unwrap();
    let cache = Cache::new("sqlite::memory:").await.unwrap();
    let provider = Provider::OpenMeteo(OpenMeteoClient::with_base_urls(&base_url, &base_url));

    let service = AqiService::new(provider, storage, cache, CachePolicy::default());
    let server = TestServer::new(router(AppState { service })).unwrap();

    (server, fetch_count)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _) = create_test_server().await;

    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_aqi_for_city_end_to_end() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api/aqi?city=Paris").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["aqi"], 85);
    assert_eq!(body["category"], "Moderate");
    assert_eq!(body["categoryCode"], "moderate");
    assert_eq!(body["color"], "#FFFF00");
    assert_eq!(body["cityName"], "Paris");
    assert_eq!(body["activities"]["outdoor"], "safe");
    assert_eq!(body["activities"]["indoor"], "normal");
    assert_eq!(body["activities"]["exercise"], "safe");
    assert_eq!(body["dominantPollutant"], "pm25");
    assert_eq!(body["temperature"], 27.0);
    assert!(body["pollutants"]["pm25"].is_number());
    assert!(body["healthImpact"].as_str().unwrap().contains("acceptable"));
    assert!(!body["preventiveActions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_second_request_is_served_from_cache() {
    let (server, fetch_count) = create_test_server().await;

    let first = server.get("/api/aqi?city=Paris").await;
    first.assert_status_ok();
    assert_eq!(fetch_count.load(Ordering::SeqCst), 1);

    let second = server.get("/api/aqi?city=Paris").await;
    second.assert_status_ok();

    // Same payload, no second provider call.
    assert_eq!(fetch_count.load(Ordering::SeqCst), 1);
    let first_body: Value = first.json();
    let second_body: Value = second.json();
    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn test_city_case_shares_cache_entry() {
    let (server, fetch_count) = create_test_server().await;

    server.get("/api/aqi?city=Paris").await.assert_status_ok();
    server.get("/api/aqi?city=paris").await.assert_status_ok();

    assert_eq!(fetch_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_aqi_by_coordinates() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api/aqi?lat=48.85&lon=2.35").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["aqi"], 85);
    assert_eq!(body["categoryCode"], "moderate");
    // Coordinate queries carry no city identity.
    assert!(body.get("cityName").is_none());
}

#[tokio::test]
async fn test_missing_parameters_rejected() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api/aqi").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_PARAMS");
}

#[tokio::test]
async fn test_invalid_coordinates_rejected() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api/aqi?lat=91.0&lon=0.0").await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_after_fetch() {
    let (server, _) = create_test_server().await;

    server.get("/api/aqi?city=Paris").await.assert_status_ok();

    let response = server.get("/api/aqi/history?city=Paris&hours=24").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["cityName"], "Paris");
    assert_eq!(body["period"]["hours"], 24);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["aqi"], 85);
    assert_eq!(body["summary"]["average"], 85);
    assert_eq!(body["summary"]["min"], 85);
    assert_eq!(body["summary"]["max"], 85);
    // Single record: empty first half is guarded as stable.
    assert_eq!(body["summary"]["trend"], "stable");
}

#[tokio::test]
async fn test_history_without_records_is_not_found() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api/aqi/history?city=Ghosttown").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_history_hours_out_of_range() {
    let (server, _) = create_test_server().await;

    server
        .get("/api/aqi/history?city=Paris&hours=0")
        .await
        .assert_status(axum::http::StatusCode::BAD_REQUEST);
    server
        .get("/api/aqi/history?city=Paris&hours=721")
        .await
        .assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_interpretation() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/api/health")
        .json(&json!({ "aqi": 85 }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["activities"]["outdoor"], "safe");
    assert!(body["healthImpact"].as_str().unwrap().contains("acceptable"));
}

#[tokio::test]
async fn test_health_interpretation_cold_weather_actions() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/api/health")
        .json(&json!({ "aqi": 320, "temperature": 2.0 }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["activities"]["outdoor"], "avoid");
    let actions: Vec<&str> = body["preventiveActions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_str().unwrap())
        .collect();
    assert!(actions.contains(&"Dress warmly"));
    assert!(actions.contains(&"Limit cold air exposure"));
}

#[tokio::test]
async fn test_health_interpretation_rejects_out_of_scale() {
    let (server, _) = create_test_server().await;

    server
        .post("/api/health")
        .json(&json!({ "aqi": 600 }))
        .await
        .assert_status(axum::http::StatusCode::BAD_REQUEST);
    server
        .post("/api/health")
        .json(&json!({ "aqi": -1 }))
        .await
        .assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_city_search() {
    let (server, _) = create_test_server().await;

    let response = server.get("/api/cities?q=Par").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["query"], "Par");
    assert_eq!(body["results"][0]["name"], "Paris");
    assert_eq!(body["results"][0]["country"], "France");
}

#[tokio::test]
async fn test_cache_clear_forces_refetch() {
    let (server, fetch_count) = create_test_server().await;

    server.get("/api/aqi?city=Paris").await.assert_status_ok();
    assert_eq!(fetch_count.load(Ordering::SeqCst), 1);

    let cleared = server.delete("/api/cache").await;
    cleared.assert_status_ok();
    let body: Value = cleared.json();
    assert_eq!(body["cleared"], 1);

    server.get("/api/aqi?city=Paris").await.assert_status_ok();
    assert_eq!(fetch_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_full_workflow() {
    let (server, fetch_count) = create_test_server().await;

    // 1. Health check
    server.get("/health").await.assert_status_ok();

    // 2. Look up a city, fetch its AQI, then re-fetch from cache
    server.get("/api/cities?q=Paris").await.assert_status_ok();
    server.get("/api/aqi?city=Paris").await.assert_status_ok();
    server.get("/api/aqi?city=Paris").await.assert_status_ok();
    assert_eq!(fetch_count.load(Ordering::SeqCst), 1);

    // 3. History reflects the single fresh fetch
    let history = server.get("/api/aqi/history?city=Paris").await;
    history.assert_status_ok();
    let body: Value = history.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // 4. Interpretation endpoint agrees with the pipeline output
    let health = server
        .post("/api/health")
        .json(&json!({ "aqi": 85, "temperature": 27.0 }))
        .await;
    health.assert_status_ok();
    let health_body: Value = health.json();
    assert_eq!(health_body["activities"]["outdoor"], "safe");
}
