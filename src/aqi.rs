//! EPA breakpoint conversion from pollutant concentrations to AQI.
//!
//! Each supported pollutant has an ordered table of concentration bands,
//! each mapped onto an AQI sub-range. A concentration inside a band is
//! converted with the EPA linear interpolation formula:
//!
//! `aqi = (aqiHigh - aqiLow) / (cHigh - cLow) * (c - cLow) + aqiLow`
//!
//! rounded to the nearest integer. A concentration above the highest
//! band saturates to 500 instead of failing.

use thiserror::Error;

use crate::model::Pollutants;

/// Pollutants a measurement may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    Pm25,
    Pm10,
    O3,
    No2,
    So2,
    Co,
}

impl Pollutant {
    /// Lowercase key used in JSON payloads and storage columns.
    pub fn key(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::O3 => "o3",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::Co => "co",
        }
    }
}

/// Errors from the breakpoint converter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AqiError {
    /// The pollutant has no breakpoint table.
    #[error("no breakpoint table for pollutant '{0}'")]
    UnsupportedPollutant(&'static str),
}

/// One EPA breakpoint band: a concentration range mapped onto an AQI
/// sub-range.
struct Breakpoint {
    c_low: f64,
    c_high: f64,
    aqi_low: f64,
    aqi_high: f64,
}

/// EPA PM2.5 breakpoints (24-hour, µg/m³).
const PM25_BREAKPOINTS: &[Breakpoint] = &[
    Breakpoint { c_low: 0.0, c_high: 12.0, aqi_low: 0.0, aqi_high: 50.0 },
    Breakpoint { c_low: 12.1, c_high: 35.4, aqi_low: 51.0, aqi_high: 100.0 },
    Breakpoint { c_low: 35.5, c_high: 55.4, aqi_low: 101.0, aqi_high: 150.0 },
    Breakpoint { c_low: 55.5, c_high: 150.4, aqi_low: 151.0, aqi_high: 200.0 },
    Breakpoint { c_low: 150.5, c_high: 250.4, aqi_low: 201.0, aqi_high: 300.0 },
    Breakpoint { c_low: 250.5, c_high: 500.4, aqi_low: 301.0, aqi_high: 500.0 },
];

/// EPA PM10 breakpoints (24-hour, µg/m³).
const PM10_BREAKPOINTS: &[Breakpoint] = &[
    Breakpoint { c_low: 0.0, c_high: 54.0, aqi_low: 0.0, aqi_high: 50.0 },
    Breakpoint { c_low: 55.0, c_high: 154.0, aqi_low: 51.0, aqi_high: 100.0 },
    Breakpoint { c_low: 155.0, c_high: 254.0, aqi_low: 101.0, aqi_high: 150.0 },
    Breakpoint { c_low: 255.0, c_high: 354.0, aqi_low: 151.0, aqi_high: 200.0 },
    Breakpoint { c_low: 355.0, c_high: 424.0, aqi_low: 201.0, aqi_high: 300.0 },
    Breakpoint { c_low: 425.0, c_high: 604.0, aqi_low: 301.0, aqi_high: 500.0 },
];

/// Convert a pollutant concentration to an AQI value on the 0-500 scale.
///
/// Fails with [`AqiError::UnsupportedPollutant`] when no breakpoint
/// table exists for the pollutant. A concentration above the top band
/// returns 500 (saturation, not an error).
pub fn calculate_aqi(concentration: f64, pollutant: Pollutant) -> Result<u16, AqiError> {
    let table = match pollutant {
        Pollutant::Pm25 => PM25_BREAKPOINTS,
        Pollutant::Pm10 => PM10_BREAKPOINTS,
        other => return Err(AqiError::UnsupportedPollutant(other.key())),
    };

    let band = table
        .iter()
        .find(|bp| concentration >= bp.c_low && concentration <= bp.c_high);

    let Some(bp) = band else {
        // Above every band's upper bound.
        return Ok(500);
    };

    let aqi = (bp.aqi_high - bp.aqi_low) / (bp.c_high - bp.c_low) * (concentration - bp.c_low)
        + bp.aqi_low;

    Ok(aqi.round() as u16)
}

/// Pick the dominant pollutant from a set of concentration readings.
///
/// Computes each available pollutant's AQI through the breakpoint
/// converter (missing readings count as 0) and returns the key of the
/// strictly greatest sub-index. Ties resolve to the first pollutant in
/// canonical order, PM2.5 before PM10.
///
/// This is the concentration path. Providers that report a vendor index
/// instead of comparable concentrations rank by raw magnitude in their
/// own module; the two must not be mixed since they use different units.
pub fn dominant_pollutant(pollutants: &Pollutants) -> &'static str {
    let candidates = [
        (Pollutant::Pm25, pollutants.pm25),
        (Pollutant::Pm10, pollutants.pm10),
    ];

    let mut best = Pollutant::Pm25;
    let mut best_aqi = 0u16;

    for (pollutant, reading) in candidates {
        let aqi = reading
            .map(|c| calculate_aqi(c, pollutant).unwrap_or(0))
            .unwrap_or(0);
        if aqi > best_aqi {
            best = pollutant;
            best_aqi = aqi;
        }
    }

    best.key()
}

/// Whether a value is on the standardized AQI scale.
pub fn is_valid_aqi(aqi: f64) -> bool {
    aqi.is_finite() && (0.0..=500.0).contains(&aqi)
}

/// Format an AQI value for display; out-of-scale values render as "N/A".
pub fn format_aqi(aqi: f64) -> String {
    if is_valid_aqi(aqi) {
        format!("{}", aqi.round() as u16)
    } else {
        "N/A".to_string()
    }
}
