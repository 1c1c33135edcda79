//! Vegetation index, oxygen estimate and tree-planting priority.

use std::time::Duration;

use common::cache::{point_key, SharedCache};
use serde::Serialize;
use tracing::debug;

use crate::ladder::{Ladder, RiskLevel};
use crate::proxy::TerrainProxy;

const NDVI_CLASSES: Ladder<(&str, &str)> = Ladder::below(&[
    (0.2, ("Barren/Urban", "#d7191c")),
    (0.3, ("Sparse Vegetation", "#fdae61")),
    (0.5, ("Moderate Vegetation", "#ffffbf")),
    (0.7, ("Dense Vegetation", "#a6d96a")),
]);
const VERY_DENSE: (&str, &str) = ("Very Dense Vegetation", "#1a9641");

/// NDVI below which tree planting is recommended.
pub const TREE_RECOMMENDATION_NDVI: f64 = 0.3;

/// Oxygen jitter range in percentage points.
const O2_JITTER: (f64, f64) = (-5.0, 5.0);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VegetationSample {
    pub ndvi: f64,
    pub vegetation_level: &'static str,
    /// Percent of normal oxygen levels.
    pub o2_estimate: f64,
    pub tree_recommendation: bool,
    pub color: &'static str,
}

/// Planting score with each contributing factor named.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantingPriority {
    pub priority: RiskLevel,
    pub score: u32,
    pub reasons: Vec<&'static str>,
    /// `reasons` joined with ", ".
    pub reason: String,
}

/// `(level, color)` for an NDVI value.
pub fn vegetation_class(ndvi: f64) -> (&'static str, &'static str) {
    NDVI_CLASSES.lookup_or(ndvi, VERY_DENSE)
}

/// `70 + 30·ndvi` plus jitter, clamped to [60, 100].
pub fn o2_from_ndvi(ndvi: f64, jitter: f64) -> f64 {
    (70.0 + ndvi * 30.0 + jitter).clamp(60.0, 100.0)
}

pub fn planting_priority(ndvi: f64, temperature: f64, pm25: f64) -> PlantingPriority {
    let mut score = 0;
    let mut reasons = Vec::new();

    if ndvi < 0.3 {
        score += 40;
        reasons.push("low vegetation cover");
    } else if ndvi < 0.5 {
        score += 20;
        reasons.push("moderate vegetation cover");
    }

    if temperature > 35.0 {
        score += 30;
        reasons.push("high temperature");
    } else if temperature > 30.0 {
        score += 15;
        reasons.push("elevated temperature");
    }

    if pm25 > 50.0 {
        score += 30;
        reasons.push("poor air quality");
    } else if pm25 > 35.0 {
        score += 15;
        reasons.push("moderate air quality");
    }

    let priority = if score >= 70 {
        RiskLevel::High
    } else if score >= 40 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let reason = if reasons.is_empty() {
        "good environmental conditions".to_string()
    } else {
        reasons.join(", ")
    };

    PlantingPriority {
        priority,
        score,
        reasons,
        reason,
    }
}

/// Proxy-backed vegetation sampler with an hourly cache.
#[derive(Debug, Clone)]
pub struct VegetationScorer {
    terrain: TerrainProxy,
    cache: SharedCache<VegetationSample>,
    ttl: Duration,
}

impl VegetationScorer {
    pub fn new(terrain: TerrainProxy, cache: SharedCache<VegetationSample>, ttl: Duration) -> Self {
        Self {
            terrain,
            cache,
            ttl,
        }
    }

    pub fn sample(&self, lat: f64, lon: f64) -> VegetationSample {
        let key = point_key("vegetation", lat, lon);
        if let Some(cached) = self.cache.get(&key, self.ttl) {
            debug!("Vegetation cache hit: {}", key);
            return cached;
        }

        let ndvi = self.terrain.ndvi(lat, lon);
        let (vegetation_level, color) = vegetation_class(ndvi);
        let jitter = self.terrain.jitter().uniform(O2_JITTER.0, O2_JITTER.1);

        let sample = VegetationSample {
            ndvi,
            vegetation_level,
            o2_estimate: o2_from_ndvi(ndvi, jitter),
            tree_recommendation: ndvi < TREE_RECOMMENDATION_NDVI,
            color,
        };
        debug!("Vegetation at {}: ndvi={:.3} ({})", key, ndvi, vegetation_level);

        self.cache.set(key, sample.clone());
        sample
    }
}
