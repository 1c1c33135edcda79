//! Flood risk scoring from a 3-day rainfall forecast and proxy terrain.

use std::time::Duration;

use common::cache::{point_key, SharedCache};
use serde::Serialize;
use tracing::debug;

use crate::ladder::{Band, Ladder, RiskLevel};
use crate::proxy::TerrainProxy;

/// Days of forecast rainfall that feed the score.
pub const FORECAST_HORIZON_DAYS: usize = 3;

const RAINFALL: Ladder<f64> = Ladder::above(&[(100.0, 40.0), (50.0, 30.0), (20.0, 15.0)]);
const ELEVATION: Ladder<f64> = Ladder::below(&[(10.0, 30.0), (30.0, 20.0), (100.0, 10.0)]);
const SLOPE: Ladder<f64> = Ladder::below(&[(2.0, 15.0), (5.0, 10.0), (10.0, 5.0)]);

const LEVELS: Ladder<Band> = Ladder::below(&[
    (30.0, (RiskLevel::Low, "#4ade80")),
    (60.0, (RiskLevel::Medium, "#fbbf24")),
]);
const HIGH: Band = (RiskLevel::High, "#ef4444");

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodFactors {
    /// Today's forecast rainfall, mm.
    pub rainfall: f64,
    /// m
    pub elevation: f64,
    /// degrees
    pub slope: f64,
    /// %
    pub soil_saturation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloodPrediction {
    pub next24h: String,
    pub next48h: String,
    pub next72h: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodRiskAssessment {
    pub risk_level: RiskLevel,
    pub probability: f64,
    pub factors: FloodFactors,
    pub prediction: FloodPrediction,
    pub color: &'static str,
    pub recommendations: Vec<String>,
}

fn day(forecast: &[f64], index: usize) -> f64 {
    forecast.get(index).copied().unwrap_or(0.0)
}

fn horizon_total(forecast: &[f64]) -> f64 {
    forecast.iter().take(FORECAST_HORIZON_DAYS).sum()
}

/// Percent saturation: 20% baseline plus 80% per 100 mm of recent and
/// near-term rain (tomorrow counts half), capped at 100.
pub fn soil_saturation(current_rainfall: f64, forecast: &[f64]) -> f64 {
    let total = current_rainfall + day(forecast, 0) + day(forecast, 1) * 0.5;
    (20.0 + total / 100.0 * 80.0).min(100.0)
}

pub fn flood_probability(forecast: &[f64], elevation: f64, slope: f64, saturation: f64) -> f64 {
    let rainfall = RAINFALL.lookup_or_else(horizon_total(forecast), |mm| mm * 0.3);
    let terrain = ELEVATION.lookup_or(elevation, 5.0) + SLOPE.lookup_or(slope, 0.0);

    (rainfall + terrain + saturation * 0.15).clamp(0.0, 100.0)
}

pub fn flood_band(probability: f64) -> Band {
    LEVELS.lookup_or(probability, HIGH)
}

fn day_outlook(rainfall: f64) -> String {
    if rainfall > 50.0 {
        "High risk"
    } else if rainfall > 20.0 {
        "Moderate risk"
    } else {
        "Low risk"
    }
    .to_string()
}

pub fn flood_prediction(forecast: &[f64]) -> FloodPrediction {
    FloodPrediction {
        next24h: day_outlook(day(forecast, 0)),
        next48h: day_outlook(day(forecast, 1)),
        next72h: day_outlook(day(forecast, 2)),
    }
}

pub fn flood_recommendations(level: RiskLevel, forecast: &[f64]) -> Vec<String> {
    let base: &[&str] = match level {
        RiskLevel::High | RiskLevel::Extreme => &[
            "🚨 Evacuate low-lying areas if possible",
            "📦 Prepare emergency supplies and sandbags",
            "🚗 Move vehicles to higher ground",
            "📱 Monitor weather alerts closely",
        ],
        RiskLevel::Medium => &[
            "⚠️ Prepare sandbags for low-lying areas",
            "🔍 Monitor drainage systems and clear blockages",
            "📋 Review evacuation routes",
            "🌧️ Avoid unnecessary travel during heavy rainfall",
        ],
        RiskLevel::Low => &[
            "✅ No immediate flood risk",
            "🔧 Maintain drainage systems",
            "📊 Continue monitoring weather forecasts",
        ],
    };

    let mut recommendations: Vec<String> = base.iter().map(|s| s.to_string()).collect();
    let total = horizon_total(forecast);
    if total > 30.0 {
        recommendations.push(format!(
            "💧 Expected rainfall: {}mm over next 3 days",
            total.round()
        ));
    }
    recommendations
}

/// Assessment for known terrain. Pure; no caching.
pub fn assess_flood(
    forecast: &[f64],
    current_rainfall: f64,
    elevation: f64,
    slope: f64,
) -> FloodRiskAssessment {
    let saturation = soil_saturation(current_rainfall, forecast);
    let probability = flood_probability(forecast, elevation, slope, saturation);
    let (risk_level, color) = flood_band(probability);

    FloodRiskAssessment {
        risk_level,
        probability,
        factors: FloodFactors {
            rainfall: day(forecast, 0),
            elevation,
            slope,
            soil_saturation: saturation,
        },
        prediction: flood_prediction(forecast),
        color,
        recommendations: flood_recommendations(risk_level, forecast),
    }
}

/// Flood scorer: proxy terrain plus a per-location result cache.
#[derive(Debug, Clone)]
pub struct FloodRiskScorer {
    terrain: TerrainProxy,
    cache: SharedCache<FloodRiskAssessment>,
    ttl: Duration,
}

impl FloodRiskScorer {
    pub fn new(
        terrain: TerrainProxy,
        cache: SharedCache<FloodRiskAssessment>,
        ttl: Duration,
    ) -> Self {
        Self {
            terrain,
            cache,
            ttl,
        }
    }

    pub fn score(
        &self,
        lat: f64,
        lon: f64,
        forecast: &[f64],
        current_rainfall: f64,
    ) -> FloodRiskAssessment {
        let key = point_key("flood", lat, lon);
        if let Some(cached) = self.cache.get(&key, self.ttl) {
            debug!("Flood risk cache hit: {}", key);
            return cached;
        }

        let elevation = self.terrain.elevation(lat, lon);
        let slope = self.terrain.slope(lat, lon);
        let assessment = assess_flood(forecast, current_rainfall, elevation, slope);
        debug!(
            "Flood risk at {}: {:.1} ({}), elevation={:.1}m slope={:.1}°",
            key, assessment.probability, assessment.risk_level, elevation, slope
        );

        self.cache.set(key, assessment.clone());
        assessment
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::config::RegionConfig;
    use common::TtlCache;

    use super::*;
    use crate::proxy::FixedJitter;

    #[test]
    fn test_soil_saturation() {
        assert_eq!(soil_saturation(0.0, &[]), 20.0);
        // 10 + 20 + 0.5*20 = 40 mm -> 20 + 32
        assert!((soil_saturation(10.0, &[20.0, 20.0, 99.0]) - 52.0).abs() < 1e-9);
        assert_eq!(soil_saturation(200.0, &[0.0]), 100.0);
    }

    #[test]
    fn test_coastal_downpour_is_high() {
        let a = assess_flood(&[120.0, 0.0, 0.0], 0.0, 5.0, 1.0);
        // 40 rain + 30 elevation + 15 slope + saturation capped at 100
        assert_eq!(a.probability, 100.0);
        assert_eq!(a.risk_level, RiskLevel::High);
        assert_eq!(a.color, "#ef4444");
        assert_eq!(a.factors.rainfall, 120.0);
        assert_eq!(a.prediction.next24h, "High risk");
        assert_eq!(a.prediction.next48h, "Low risk");
        assert_eq!(
            a.recommendations.last().map(String::as_str),
            Some("💧 Expected rainfall: 120mm over next 3 days")
        );
    }

    #[test]
    fn test_coastal_downpour_through_proxy_terrain() {
        let terrain = TerrainProxy::new(&RegionConfig::default(), Arc::new(FixedJitter::new(1.0)));
        let scorer = FloodRiskScorer::new(terrain, Arc::new(TtlCache::new()), Duration::from_secs(600));

        // West of the reference point: elevation floors at 0, slope at most 2.5°.
        let a = scorer.score(30.4278, -9.70, &[120.0, 0.0, 0.0], 0.0);
        assert_eq!(a.factors.elevation, 0.0);
        assert!(a.probability >= 70.0);
        assert_eq!(a.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(flood_band(29.99).0, RiskLevel::Low);
        assert_eq!(flood_band(30.0), (RiskLevel::Medium, "#fbbf24"));
        assert_eq!(flood_band(59.99).0, RiskLevel::Medium);
        assert_eq!(flood_band(60.0).0, RiskLevel::High);
    }

    #[test]
    fn test_dry_inland_is_low() {
        // 0 rain + 5 elevation + 0 slope + 20*0.15
        let p = flood_probability(&[0.0, 0.0, 0.0], 500.0, 15.0, 20.0);
        assert!((p - 8.0).abs() < 1e-9, "p={p}");
        let a = assess_flood(&[0.0, 0.0, 0.0], 0.0, 500.0, 15.0);
        assert_eq!(a.recommendations.len(), 3);
    }

    #[test]
    fn test_only_three_days_count() {
        let p3 = flood_probability(&[10.0, 10.0, 10.0], 500.0, 15.0, 0.0);
        let p7 = flood_probability(&[10.0, 10.0, 10.0, 90.0, 90.0], 500.0, 15.0, 0.0);
        assert_eq!(p3, p7);
    }

    #[test]
    fn test_rainfall_total_rounds_half_up() {
        let recs = flood_recommendations(RiskLevel::Medium, &[10.0, 10.0, 10.5]);
        assert_eq!(
            recs.last().map(String::as_str),
            Some("💧 Expected rainfall: 31mm over next 3 days")
        );
    }

    #[test]
    fn test_prediction_buckets_each_day() {
        let p = flood_prediction(&[51.0, 21.0]);
        assert_eq!(p.next24h, "High risk");
        assert_eq!(p.next48h, "Moderate risk");
        assert_eq!(p.next72h, "Low risk");
    }

    #[test]
    fn test_probability_is_bounded() {
        for rain in [0.0, 30.0, 500.0] {
            for elevation in [0.0, 50.0, 1000.0] {
                let p = flood_probability(&[rain, rain, rain], elevation, 0.0, 100.0);
                assert!((0.0..=100.0).contains(&p), "p={p}");
            }
        }
    }

    #[test]
    fn test_assessment_json_keys() {
        let value = serde_json::to_value(assess_flood(&[5.0], 0.0, 50.0, 3.0)).expect("serializes");
        assert_eq!(value["riskLevel"], "Low");
        assert!(value["factors"].get("soilSaturation").is_some());
        assert!(value["prediction"].get("next72h").is_some());
    }
}
