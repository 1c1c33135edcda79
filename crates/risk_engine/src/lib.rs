//! Hazard scoring for earthguard.
//!
//! - `ladder` — ordered threshold tables and the shared risk level
//! - `proxy` — placeholder elevation/slope/NDVI models and their jitter source
//! - `fire`, `flood`, `vegetation` — per-hazard scorers
//! - `composite`, `alerts` — point summary and region alerts
//! - `tiles` — GIBS tile URLs
//! - `engine` — `RiskEngine`, which ties adapters, caches and scorers together

pub mod alerts;
pub mod composite;
pub mod engine;
pub mod fire;
pub mod flood;
pub mod ladder;
pub mod proxy;
pub mod tiles;
pub mod vegetation;

pub use alerts::{generate_alerts, Alert, AlertKind, Severity};
pub use composite::{count_fires_near_location, nearest_air_quality_point, RiskSummary};
pub use engine::{
    AlertReport, EngineCaches, FireRiskReport, FloodRiskReport, PlantingReport, RiskEngine,
    RiskReport, StationReport,
};
pub use fire::{fire_danger_index, fire_spread, FireRiskAssessment};
pub use flood::FloodRiskAssessment;
pub use ladder::{Ladder, RiskLevel};
pub use proxy::{FixedJitter, JitterSource, SeededJitter, TerrainProxy, ThreadRngJitter};
pub use tiles::{flood_tile_url, ndvi_tile_url};
pub use vegetation::{planting_priority, PlantingPriority, VegetationSample};
