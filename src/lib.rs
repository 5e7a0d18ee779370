//! Airsight - a city air quality dashboard service.
//!
//! # Overview
//!
//! Airsight reports the air-quality index (AQI) for a city or coordinate
//! pair, enriches the raw measurement with EPA categorization and health
//! guidance, and serves the result through a read-through TTL cache with
//! append-only history behind it.
//!
//! The request pipeline is a short linear chain: cache lookup, provider
//! fetch on a miss, enrichment, best-effort persistence, best-effort
//! cache write-through. Storage failures on the side-effect steps are
//! logged and swallowed; the caller always gets an answer when the
//! provider does.
//!
//! # Modules
//!
//! - [`model`]: Wire types, the category scale, and trend summaries
//! - [`aqi`]: EPA breakpoint conversion and dominant-pollutant selection
//! - [`health`]: Health interpretation tables and preventive actions
//! - [`providers`]: Open-Meteo and OpenWeatherMap clients
//! - [`cache`]: SQLite-backed TTL key-value cache
//! - [`storage`]: SQLite layer for cities and historical records
//! - [`service`]: The aggregation pipeline
//! - [`api`]: HTTP API handlers
//! - [`error`]: Error taxonomy with HTTP mappings

pub mod api;
pub mod aqi;
pub mod cache;
pub mod error;
pub mod health;
pub mod model;
pub mod providers;
pub mod service;
pub mod storage;
