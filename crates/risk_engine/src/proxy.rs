//! Placeholder terrain and vegetation models.
//!
//! Elevation is a deterministic function of distance east of the reference
//! point (sea to the west, mountains inland). Slope and NDVI add uniform
//! jitter inside fixed bands; the jitter comes from an injectable
//! [`JitterSource`] so tests and replays can pin it.

use std::fmt;
use std::sync::{Arc, Mutex};

use common::config::RegionConfig;
use common::geo::{km_east_of, planar_km};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform noise for the proxy models.
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// A sample from `[low, high)`. Returns `low` for an empty range.
    fn uniform(&self, low: f64, high: f64) -> f64;
}

/// Fresh entropy on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        rand::thread_rng().gen_range(low..high)
    }
}

/// Reproducible sequence from a fixed seed.
#[derive(Debug)]
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(low..high)
    }
}

/// Always lands at the same fraction of the requested range.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter {
    fraction: f64,
}

impl FixedJitter {
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    pub fn midpoint() -> Self {
        Self::new(0.5)
    }
}

impl JitterSource for FixedJitter {
    fn uniform(&self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.fraction
    }
}

// ── Terrain ───────────────────────────────────────────────────────────

/// Coastal slope band, elevation below 20 m.
pub const COASTAL_SLOPE: (f64, f64) = (0.5, 2.5);
/// Hill slope band, elevation below 100 m.
pub const HILL_SLOPE: (f64, f64) = (2.0, 7.0);
pub const MOUNTAIN_SLOPE: (f64, f64) = (5.0, 20.0);

/// NDVI band within 5 km of the reference point.
pub const URBAN_NDVI: (f64, f64) = (0.10, 0.25);
/// NDVI band within 15 km.
pub const SUBURBAN_NDVI: (f64, f64) = (0.25, 0.50);
pub const RURAL_NDVI: (f64, f64) = (0.50, 0.80);

/// Geometric stand-in for a DEM and a satellite NDVI raster.
#[derive(Debug, Clone)]
pub struct TerrainProxy {
    reference_lat: f64,
    reference_lon: f64,
    jitter: Arc<dyn JitterSource>,
}

impl TerrainProxy {
    pub fn new(region: &RegionConfig, jitter: Arc<dyn JitterSource>) -> Self {
        Self {
            reference_lat: region.reference_lat,
            reference_lon: region.reference_lon,
            jitter,
        }
    }

    pub fn jitter(&self) -> &dyn JitterSource {
        self.jitter.as_ref()
    }

    /// Meters. Drops 2 m/km toward the sea (floored at 0), climbs 30 m/km inland.
    pub fn elevation(&self, lat: f64, lon: f64) -> f64 {
        let east_km = km_east_of(lat, lon, self.reference_lon);
        if east_km < 0.0 {
            (10.0 + east_km * 2.0).max(0.0)
        } else {
            10.0 + east_km * 30.0
        }
    }

    /// Degrees, drawn from the band of the point's elevation tier.
    pub fn slope(&self, lat: f64, lon: f64) -> f64 {
        let (low, high) = slope_band(self.elevation(lat, lon));
        self.jitter.uniform(low, high)
    }

    /// NDVI drawn from the urban, suburban or rural band by distance.
    pub fn ndvi(&self, lat: f64, lon: f64) -> f64 {
        let distance = planar_km(lat, lon, self.reference_lat, self.reference_lon);
        let (low, high) = ndvi_band(distance);
        self.jitter.uniform(low, high)
    }
}

pub fn slope_band(elevation: f64) -> (f64, f64) {
    if elevation < 20.0 {
        COASTAL_SLOPE
    } else if elevation < 100.0 {
        HILL_SLOPE
    } else {
        MOUNTAIN_SLOPE
    }
}

pub fn ndvi_band(distance_km: f64) -> (f64, f64) {
    if distance_km < 5.0 {
        URBAN_NDVI
    } else if distance_km < 15.0 {
        SUBURBAN_NDVI
    } else {
        RURAL_NDVI
    }
}
