//! Data models for Airsight.
//!
//! Wire types for the AQI API plus the domain enums they are built from.
//! The category scale follows the EPA convention: six ordered tiers
//! covering 0-500, each with fixed display metadata. Metadata is
//! expressed as exhaustive matches so adding a tier cannot silently miss
//! an entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the six EPA AQI categories, ordered from cleanest to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    /// 0-50. Air quality is satisfactory.
    Good,
    /// 51-100. Acceptable for most people.
    Moderate,
    /// 101-150. Sensitive groups may experience effects.
    UnhealthySensitive,
    /// 151-200. Everyone may begin to experience effects.
    Unhealthy,
    /// 201-300. Health alert conditions.
    VeryUnhealthy,
    /// 301-500. Emergency conditions.
    Hazardous,
}

/// Static display metadata for an AQI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Human-readable label (e.g. "Unhealthy for Sensitive Groups").
    pub label: &'static str,
    /// EPA hex color for the category.
    pub color: &'static str,
    /// Contrasting text color for display on top of `color`.
    pub text_color: &'static str,
    /// Closed AQI range `[min, max]` covered by this category.
    pub range: (u16, u16),
    /// One-sentence description of the category.
    pub description: &'static str,
}

impl AqiCategory {
    /// Classify an AQI value into its category.
    ///
    /// Total over the whole scale: values above 500 saturate to
    /// `Hazardous` rather than failing. Negative inputs are a caller
    /// contract violation and are validated upstream.
    pub fn from_aqi(aqi: u16) -> Self {
        if aqi <= 50 {
            AqiCategory::Good
        } else if aqi <= 100 {
            AqiCategory::Moderate
        } else if aqi <= 150 {
            AqiCategory::UnhealthySensitive
        } else if aqi <= 200 {
            AqiCategory::Unhealthy
        } else if aqi <= 300 {
            AqiCategory::VeryUnhealthy
        } else {
            AqiCategory::Hazardous
        }
    }

    /// Get the full display metadata for this category.
    pub fn info(&self) -> CategoryInfo {
        match self {
            AqiCategory::Good => CategoryInfo {
                label: "Good",
                color: "#00E400",
                text_color: "#000000",
                range: (0, 50),
                description: "Air quality is satisfactory, and air pollution poses little or no risk.",
            },
            AqiCategory::Moderate => CategoryInfo {
                label: "Moderate",
                color: "#FFFF00",
                text_color: "#000000",
                range: (51, 100),
                description: "Air quality is acceptable. However, there may be a risk for some people, particularly those who are unusually sensitive to air pollution.",
            },
            AqiCategory::UnhealthySensitive => CategoryInfo {
                label: "Unhealthy for Sensitive Groups",
                color: "#FF7E00",
                text_color: "#FFFFFF",
                range: (101, 150),
                description: "Members of sensitive groups may experience health effects. The general public is less likely to be affected.",
            },
            AqiCategory::Unhealthy => CategoryInfo {
                label: "Unhealthy",
                color: "#FF0000",
                text_color: "#FFFFFF",
                range: (151, 200),
                description: "Some members of the general public may experience health effects; members of sensitive groups may experience more serious health effects.",
            },
            AqiCategory::VeryUnhealthy => CategoryInfo {
                label: "Very Unhealthy",
                color: "#8F3F97",
                text_color: "#FFFFFF",
                range: (201, 300),
                description: "Health alert: The risk of health effects is increased for everyone.",
            },
            AqiCategory::Hazardous => CategoryInfo {
                label: "Hazardous",
                color: "#7E0023",
                text_color: "#FFFFFF",
                range: (301, 500),
                description: "Health warning of emergency conditions: everyone is more likely to be affected.",
            },
        }
    }

    /// Get the human-readable label.
    pub fn label(&self) -> &'static str {
        self.info().label
    }

    /// Get the EPA hex color.
    pub fn color(&self) -> &'static str {
        self.info().color
    }

    /// Stable string code used in storage and JSON (`"unhealthy_sensitive"`).
    pub fn code(&self) -> &'static str {
        match self {
            AqiCategory::Good => "good",
            AqiCategory::Moderate => "moderate",
            AqiCategory::UnhealthySensitive => "unhealthy_sensitive",
            AqiCategory::Unhealthy => "unhealthy",
            AqiCategory::VeryUnhealthy => "very_unhealthy",
            AqiCategory::Hazardous => "hazardous",
        }
    }
}

/// Per-pollutant concentration readings in µg/m³. Any reading may be
/// absent; absent readings are omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub o3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub so2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co: Option<f64>,
}

/// A point-in-time observation produced by a provider fetch.
///
/// Immutable once produced; the aggregation service consumes it to build
/// an [`AqiResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Standardized AQI value on the 0-500 scale.
    pub aqi: u16,

    /// Lowercase key of the pollutant contributing the highest sub-index
    /// (e.g. "pm25").
    pub dominant_pollutant: String,

    /// Per-pollutant concentration breakdown.
    pub pollutants: Pollutants,

    /// Temperature in °C, when the provider reports it.
    pub temperature: Option<f64>,

    /// Relative humidity in percent.
    pub humidity: Option<f64>,

    /// Surface pressure in hPa.
    pub pressure: Option<f64>,

    /// When the observation was taken (provider time, UTC).
    pub timestamp: DateTime<Utc>,
}

/// Outdoor and exercise activity guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutdoorActivity {
    Safe,
    Limited,
    Avoid,
}

/// Indoor activity guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndoorActivity {
    /// Normal ventilation is fine.
    Normal,
    /// Keep windows closed, filter indoor air.
    Filtered,
    /// Seal the space; windows and doors stay closed.
    Closed,
}

/// Activity-safety triple derived from the AQI category.
///
/// `exercise` mirrors `outdoor`: exertion raises intake, so the guidance
/// tightens at the same category thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecommendations {
    pub outdoor: OutdoorActivity,
    pub indoor: IndoorActivity,
    pub exercise: OutdoorActivity,
}

/// Derived health reading for a category.
///
/// Pure function of the category; never persisted, recomputed on every
/// read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInterpretation {
    /// Health impact statement.
    pub impact: String,
    /// Actionable recommendation.
    pub recommendation: String,
    /// Groups at elevated risk.
    pub sensitive_groups: Vec<String>,
    /// Activity-safety guidance.
    pub activities: ActivityRecommendations,
}

/// Full enriched response for a single AQI query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AqiResponse {
    /// AQI value on the 0-500 scale.
    pub aqi: u16,

    /// Display label for the category (e.g. "Moderate").
    pub category: String,

    /// Stable category code (e.g. "moderate").
    pub category_code: AqiCategory,

    /// EPA hex color for the category.
    pub color: String,

    /// Lowercase key of the dominant pollutant.
    pub dominant_pollutant: String,

    /// Per-pollutant breakdown.
    pub pollutants: Pollutants,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,

    /// Health impact statement for the category.
    pub health_impact: String,

    /// Actionable recommendation, adjusted for temperature when known.
    pub recommendation: String,

    /// Groups at elevated risk at this category.
    pub sensitive_groups: Vec<String>,

    /// Activity-safety guidance.
    pub activities: ActivityRecommendations,

    /// Ordered preventive actions for the category.
    pub preventive_actions: Vec<String>,

    /// Observation timestamp from the provider.
    pub timestamp: DateTime<Utc>,

    /// City name for city-based queries; absent for raw coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
}

/// One persisted historical observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub aqi: i64,
    pub category: String,
}

/// Direction of the AQI over a historical window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

impl Trend {
    /// Determine the trend of an AQI series ordered oldest-first.
    ///
    /// The series is split at `floor(n/2)` and the two halves averaged:
    /// a second half more than 5 points below the first is `Improving`,
    /// more than 5 above is `Worsening`, anything else `Stable`.
    /// Series shorter than two points have an empty first half and are
    /// reported `Stable`.
    pub fn from_series(values: &[i64]) -> Self {
        if values.len() < 2 {
            return Trend::Stable;
        }

        let midpoint = values.len() / 2;
        let (first, second) = values.split_at(midpoint);

        let first_avg = first.iter().sum::<i64>() as f64 / first.len() as f64;
        let second_avg = second.iter().sum::<i64>() as f64 / second.len() as f64;
        let difference = second_avg - first_avg;

        if difference < -5.0 {
            Trend::Improving
        } else if difference > 5.0 {
            Trend::Worsening
        } else {
            Trend::Stable
        }
    }
}

/// Summary statistics over a historical window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    /// Mean AQI, rounded to the nearest integer.
    pub average: i64,
    pub min: i64,
    pub max: i64,
    pub trend: Trend,
}

impl HistorySummary {
    /// Compute summary statistics for a series ordered oldest-first.
    ///
    /// Returns `None` for an empty series; the caller surfaces that as a
    /// no-data condition rather than a crash.
    pub fn from_values(values: &[i64]) -> Option<Self> {
        let min = values.iter().copied().min()?;
        let max = values.iter().copied().max()?;

        let sum: i64 = values.iter().sum();
        let average = (sum as f64 / values.len() as f64).round() as i64;

        Some(Self {
            average,
            min,
            max,
            trend: Trend::from_series(values),
        })
    }
}

/// The time window a historical query covered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub hours: i64,
}

/// Response for `GET /api/aqi/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalResponse {
    pub city_name: String,
    pub period: HistoryPeriod,
    pub data: Vec<HistoricalPoint>,
    pub summary: HistorySummary,
}

/// One geocoding hit from a provider city search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySearchResult {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Response for `GET /api/cities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySearchResponse {
    pub query: String,
    pub results: Vec<CitySearchResult>,
}

/// Query parameters for `GET /api/aqi`.
///
/// Exactly one of `city` or the `lat`/`lon` pair must be present.
#[derive(Debug, Deserialize)]
pub struct AqiQuery {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Query parameters for `GET /api/aqi/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub city: String,

    /// Lookback window in hours (default: 24, accepted range 1-720).
    #[serde(default = "default_history_hours")]
    pub hours: i64,
}

fn default_history_hours() -> i64 {
    24
}

/// Query parameters for `GET /api/cities`.
#[derive(Debug, Deserialize)]
pub struct CitySearchQuery {
    pub q: String,
}

/// Request body for `POST /api/health`.
#[derive(Debug, Deserialize)]
pub struct HealthRequest {
    pub aqi: f64,
    pub temperature: Option<f64>,
}

/// Response body for `POST /api/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub health_impact: String,
    pub recommendation: String,
    pub sensitive_groups: Vec<String>,
    pub preventive_actions: Vec<String>,
    pub activities: ActivityRecommendations,
}
