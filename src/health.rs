//! Health interpretation of AQI categories.
//!
//! Static lookup tables keyed by category: impact text, recommendations,
//! sensitive groups, activity guidance, and preventive actions. All
//! lookups are exhaustive matches over [`AqiCategory`] so a new category
//! cannot ship without its table entries. Everything here is pure and
//! recomputed on every read; interpretations are never persisted.

use crate::model::{
    ActivityRecommendations, AqiCategory, HealthInterpretation, IndoorActivity, OutdoorActivity,
};

/// Health impact statement for a category.
pub fn health_impact(category: AqiCategory) -> &'static str {
    match category {
        AqiCategory::Good => {
            "Air quality is considered satisfactory, and air pollution poses little or no risk."
        }
        AqiCategory::Moderate => {
            "Air quality is acceptable for most people. However, sensitive individuals may experience minor respiratory symptoms."
        }
        AqiCategory::UnhealthySensitive => {
            "Sensitive groups (children, elderly, people with respiratory conditions) may experience health effects."
        }
        AqiCategory::Unhealthy => {
            "Everyone may begin to experience health effects. Sensitive groups may experience more serious effects."
        }
        AqiCategory::VeryUnhealthy => {
            "Health alert: Everyone may experience more serious health effects."
        }
        AqiCategory::Hazardous => {
            "Health warnings of emergency conditions. The entire population is likely to be affected."
        }
    }
}

/// Actionable recommendation for a category.
pub fn recommendation(category: AqiCategory) -> &'static str {
    match category {
        AqiCategory::Good => "Perfect day for outdoor activities. Enjoy your time outside!",
        AqiCategory::Moderate => {
            "Most people can enjoy outdoor activities. Unusually sensitive individuals should consider limiting prolonged outdoor exertion."
        }
        AqiCategory::UnhealthySensitive => {
            "Sensitive groups should limit prolonged outdoor exertion. Keep windows closed if possible."
        }
        AqiCategory::Unhealthy => {
            "Everyone should limit prolonged outdoor exertion. Keep windows closed. Consider wearing a mask if you must go outside."
        }
        AqiCategory::VeryUnhealthy => {
            "Avoid all outdoor activities. Stay indoors with windows closed. Use air purifiers if available."
        }
        AqiCategory::Hazardous => {
            "Emergency conditions. Stay indoors and keep activity levels low. Seal windows and doors. Use air purifiers."
        }
    }
}

/// Groups at elevated risk for a category.
pub fn sensitive_groups(category: AqiCategory) -> Vec<String> {
    let groups: &[&str] = match category {
        AqiCategory::Good => &[],
        AqiCategory::Moderate => &["Unusually sensitive individuals"],
        AqiCategory::UnhealthySensitive => &[
            "Children",
            "Elderly",
            "People with asthma",
            "People with heart disease",
        ],
        AqiCategory::Unhealthy => &[
            "Children",
            "Elderly",
            "People with respiratory conditions",
            "People with heart disease",
            "Active individuals",
        ],
        AqiCategory::VeryUnhealthy => &["Everyone", "Especially children and elderly"],
        AqiCategory::Hazardous => &["Entire population"],
    };

    groups.iter().map(|g| g.to_string()).collect()
}

/// Activity-safety guidance for a category.
///
/// Outdoor tightens from safe through limited to avoid; indoor stays
/// normal one tier longer than outdoor; exercise mirrors outdoor.
pub fn activity_recommendations(category: AqiCategory) -> ActivityRecommendations {
    match category {
        AqiCategory::Good | AqiCategory::Moderate => ActivityRecommendations {
            outdoor: OutdoorActivity::Safe,
            indoor: IndoorActivity::Normal,
            exercise: OutdoorActivity::Safe,
        },
        AqiCategory::UnhealthySensitive => ActivityRecommendations {
            outdoor: OutdoorActivity::Limited,
            indoor: IndoorActivity::Normal,
            exercise: OutdoorActivity::Limited,
        },
        AqiCategory::Unhealthy => ActivityRecommendations {
            outdoor: OutdoorActivity::Limited,
            indoor: IndoorActivity::Filtered,
            exercise: OutdoorActivity::Limited,
        },
        AqiCategory::VeryUnhealthy | AqiCategory::Hazardous => ActivityRecommendations {
            outdoor: OutdoorActivity::Avoid,
            indoor: IndoorActivity::Closed,
            exercise: OutdoorActivity::Avoid,
        },
    }
}

/// Complete health interpretation for a category.
pub fn interpret(category: AqiCategory) -> HealthInterpretation {
    HealthInterpretation {
        impact: health_impact(category).to_string(),
        recommendation: recommendation(category).to_string(),
        sensitive_groups: sensitive_groups(category),
        activities: activity_recommendations(category),
    }
}

/// Append a heat or cold clause to a base recommendation.
pub fn temperature_adjusted_recommendation(base: &str, temperature: f64) -> String {
    let adjustment = if temperature > 35.0 {
        " Stay hydrated and avoid heat exposure."
    } else if temperature > 30.0 {
        " Drink plenty of water and seek shade when outdoors."
    } else if temperature < 0.0 {
        " Dress warmly and limit time in cold air."
    } else if temperature < 10.0 {
        " Wear appropriate clothing for cold weather."
    } else {
        ""
    };

    format!("{base}{adjustment}")
}

/// Ordered preventive actions for a category, with temperature-specific
/// appends: above 30 °C adds hydration and heat avoidance, below 5 °C
/// adds warmth and cold-exposure limits.
pub fn preventive_actions(category: AqiCategory, temperature: Option<f64>) -> Vec<String> {
    let base: &[&str] = match category {
        AqiCategory::Good => &["Enjoy outdoor activities", "Keep windows open for fresh air"],
        AqiCategory::Moderate => &[
            "Outdoor activities are generally safe",
            "Sensitive individuals should monitor symptoms",
        ],
        AqiCategory::UnhealthySensitive => &[
            "Sensitive groups should limit outdoor exposure",
            "Close windows during peak pollution hours",
            "Reduce physical exertion outdoors",
        ],
        AqiCategory::Unhealthy => &[
            "Limit time outdoors",
            "Wear a mask when outside",
            "Keep windows and doors closed",
            "Use air purifiers indoors",
            "Avoid strenuous outdoor activities",
        ],
        AqiCategory::VeryUnhealthy => &[
            "Avoid all outdoor activities",
            "Stay indoors with windows closed",
            "Use air purifiers",
            "Wear N95 masks if you must go outside",
            "Check on vulnerable family members",
        ],
        AqiCategory::Hazardous => &[
            "Stay indoors at all times",
            "Seal windows and doors",
            "Use HEPA air purifiers",
            "Do not exercise",
            "Seek medical attention if experiencing symptoms",
            "Follow emergency guidelines",
        ],
    };

    let mut actions: Vec<String> = base.iter().map(|a| a.to_string()).collect();

    if let Some(t) = temperature {
        if t > 30.0 {
            actions.push("Stay hydrated".to_string());
            actions.push("Avoid heat exposure".to_string());
        } else if t < 5.0 {
            actions.push("Dress warmly".to_string());
            actions.push("Limit cold air exposure".to_string());
        }
    }

    actions
}
