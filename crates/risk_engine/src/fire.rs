//! Fire risk scoring.
//!
//! Additive fire-weather heuristic: temperature, humidity, wind and fuel
//! state each contribute a capped number of points, and the total (0-100)
//! is banded into Low/Medium/High/Extreme.

use std::time::Duration;

use common::cache::{point_key, SharedCache};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ladder::{Band, Ladder, RiskLevel};

/// Drought factor assumed when none is supplied (0-10, higher = drier).
pub const DEFAULT_DROUGHT_FACTOR: f64 = 10.0;

// Contribution ladders. Anything below the last rung falls through to a
// linear term in the scoring function.
const TEMPERATURE: Ladder<f64> =
    Ladder::above(&[(40.0, 30.0), (35.0, 25.0), (30.0, 15.0), (25.0, 5.0)]);
const HUMIDITY: Ladder<f64> =
    Ladder::below(&[(20.0, 30.0), (30.0, 25.0), (40.0, 15.0), (50.0, 10.0)]);
const WIND: Ladder<f64> =
    Ladder::above(&[(40.0, 25.0), (30.0, 20.0), (20.0, 15.0), (10.0, 10.0)]);

const LEVELS: Ladder<Band> = Ladder::below(&[
    (25.0, (RiskLevel::Low, "#22c55e")),
    (50.0, (RiskLevel::Medium, "#eab308")),
    (75.0, (RiskLevel::High, "#f97316")),
]);
const EXTREME: Band = (RiskLevel::Extreme, "#dc2626");

/// Weather and fuel inputs, echoed back as the assessment's `factors`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireFactors {
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
    pub ndvi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirePrediction {
    pub current: String,
    pub next24h: String,
    pub next48h: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireRiskAssessment {
    pub risk_level: RiskLevel,
    pub probability: f64,
    pub factors: FireFactors,
    pub prediction: FirePrediction,
    pub color: &'static str,
    pub recommendations: Vec<String>,
}

/// Expected spread of a fire front.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireSpread {
    /// km/h
    pub speed: f64,
    /// Degrees, same as the wind direction.
    pub direction: f64,
    pub description: &'static str,
}

// ── Scoring ───────────────────────────────────────────────────────────

/// Sum of the four capped contributions, clamped to [0, 100].
pub fn fire_probability(f: &FireFactors) -> f64 {
    let temperature = TEMPERATURE.lookup_or_else(f.temperature, |t| t * 0.2);
    let humidity = HUMIDITY.lookup_or_else(f.humidity, |h| (100.0 - h) * 0.1);
    let wind = WIND.lookup_or_else(f.wind_speed, |w| w * 0.5);
    let fuel = fuel_contribution(f.ndvi);

    (temperature + humidity + wind + fuel).clamp(0.0, 100.0)
}

/// Sparse dry cover burns worst; bare ground has nothing to burn and dense
/// canopy tends to be moist.
pub fn fuel_contribution(ndvi: f64) -> f64 {
    if ndvi > 0.2 && ndvi < 0.4 {
        15.0
    } else if (0.4..0.6).contains(&ndvi) {
        10.0
    } else if ndvi >= 0.6 {
        5.0
    } else {
        2.0
    }
}

pub fn fire_band(probability: f64) -> Band {
    LEVELS.lookup_or(probability, EXTREME)
}

pub fn fire_prediction(probability: f64, wind_speed: f64) -> FirePrediction {
    let danger = if probability > 75.0 {
        "Extreme fire danger"
    } else if probability > 50.0 {
        "High fire danger"
    } else if probability > 25.0 {
        "Moderate fire danger"
    } else {
        "Low fire danger"
    };

    let spread = if wind_speed > 30.0 {
        "rapid spread possible"
    } else if wind_speed > 15.0 {
        "moderate spread"
    } else {
        "slow spread"
    };

    let elevated = probability > 60.0;
    FirePrediction {
        current: format!("{danger} - {spread}"),
        next24h: if elevated {
            "Elevated risk continues"
        } else {
            "Risk may decrease"
        }
        .to_string(),
        next48h: if elevated {
            "Monitor conditions closely"
        } else {
            "Conditions improving"
        }
        .to_string(),
    }
}

pub fn fire_recommendations(level: RiskLevel, wind_speed: f64) -> Vec<String> {
    let base: &[&str] = match level {
        RiskLevel::Extreme => &[
            "🚨 EXTREME FIRE DANGER - No outdoor burning",
            "🚒 Firefighting resources on standby",
            "🏃 Prepare evacuation plans for high-risk areas",
            "📱 Monitor emergency alerts continuously",
            "💨 Strong winds increase spread risk",
        ],
        RiskLevel::High => &[
            "⚠️ HIGH FIRE DANGER - Avoid all open flames",
            "🔥 No campfires or outdoor burning",
            "🚗 Avoid parking on dry grass",
            "📞 Report any smoke or fires immediately",
        ],
        RiskLevel::Medium => &[
            "⚡ MODERATE FIRE DANGER - Use caution",
            "🔥 Limit outdoor burning to designated areas",
            "💧 Keep water/extinguisher nearby if burning",
            "🌬️ Monitor wind conditions",
        ],
        RiskLevel::Low => &[
            "✅ LOW FIRE DANGER - Normal precautions",
            "🔍 Still avoid unattended fires",
            "🌧️ Conditions favorable",
        ],
    };

    let mut recommendations: Vec<String> = base.iter().map(|s| s.to_string()).collect();
    if wind_speed > 25.0 {
        recommendations.push(format!(
            "💨 High winds ({} km/h) - Extra caution needed",
            wind_speed.round()
        ));
    }
    recommendations
}

/// Full assessment for one set of inputs. Pure; no caching.
pub fn assess_fire(factors: FireFactors) -> FireRiskAssessment {
    let probability = fire_probability(&factors);
    let (risk_level, color) = fire_band(probability);

    FireRiskAssessment {
        risk_level,
        probability,
        factors,
        prediction: fire_prediction(probability, factors.wind_speed),
        color,
        recommendations: fire_recommendations(risk_level, factors.wind_speed),
    }
}

/// Front speed from wind, sped up on upslope terrain.
pub fn fire_spread(wind_speed: f64, wind_direction: f64, slope: f64) -> FireSpread {
    let mut speed = wind_speed * 0.3;
    if slope > 0.0 {
        speed *= 1.0 + slope * 0.02;
    }

    let description = if speed > 5.0 {
        "Rapid spread possible"
    } else if speed > 2.0 {
        "Moderate spread rate"
    } else {
        "Slow spread expected"
    };

    FireSpread {
        speed,
        direction: wind_direction,
        description,
    }
}

/// Simplified McArthur forest fire danger index, capped at 100.
pub fn fire_danger_index(
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
    drought_factor: f64,
) -> f64 {
    let fdi = drought_factor * ((temperature - humidity / 10.0) * 0.05 + wind_speed * 0.01).exp();
    fdi.min(100.0)
}

// ── Cached scorer ─────────────────────────────────────────────────────

/// Fire scorer with a per-location result cache.
///
/// The cache key is the rounded coordinate only, so within the TTL a
/// location keeps its first assessment even if the inputs move.
#[derive(Debug, Clone)]
pub struct FireRiskScorer {
    cache: SharedCache<FireRiskAssessment>,
    ttl: Duration,
}

impl FireRiskScorer {
    pub fn new(cache: SharedCache<FireRiskAssessment>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn score(&self, lat: f64, lon: f64, factors: FireFactors) -> FireRiskAssessment {
        let key = point_key("fire-risk", lat, lon);
        if let Some(cached) = self.cache.get(&key, self.ttl) {
            debug!("Fire risk cache hit: {}", key);
            return cached;
        }

        let assessment = assess_fire(factors);
        debug!(
            "Fire risk at {}: {:.1} ({})",
            key, assessment.probability, assessment.risk_level
        );
        self.cache.set(key, assessment.clone());
        assessment
    }
}
