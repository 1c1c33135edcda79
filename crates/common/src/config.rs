//! Engine configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upstream provider endpoints and credentials.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Freshness windows per data kind.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Reference geography for proxies and neighbourhood lookups.
    #[serde(default)]
    pub region: RegionConfig,

    /// Composite aggregator knobs.
    #[serde(default)]
    pub composite: CompositeConfig,
}

/// Upstream provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Open-Meteo API base URL.
    #[serde(default = "default_open_meteo_url")]
    pub open_meteo_url: String,

    /// OpenAQ API base URL.
    #[serde(default = "default_openaq_url")]
    pub openaq_url: String,

    /// NASA FIRMS base URL.
    #[serde(default = "default_firms_url")]
    pub firms_url: String,

    /// FIRMS MAP_KEY. Without it fire detections come from the fallback set.
    #[serde(default)]
    pub firms_map_key: String,

    /// FIRMS sensor product (e.g., "VIIRS_SNPP_NRT").
    #[serde(default = "default_firms_product")]
    pub firms_product: String,

    /// Days of detections to request (1-10).
    #[serde(default = "default_firms_day_range")]
    pub firms_day_range: u8,

    /// WAQI API base URL.
    #[serde(default = "default_waqi_url")]
    pub waqi_url: String,

    /// WAQI token. Without it station AQI lookups are skipped.
    #[serde(default)]
    pub waqi_token: String,

    /// User-Agent sent to every provider.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout; a timeout counts as an upstream failure.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

/// Cache TTLs (seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ten_minutes")]
    pub weather_ttl_secs: u64,

    #[serde(default = "default_ten_minutes")]
    pub air_quality_ttl_secs: u64,

    #[serde(default = "default_one_hour")]
    pub fires_ttl_secs: u64,

    #[serde(default = "default_one_hour")]
    pub vegetation_ttl_secs: u64,

    /// Fire and flood assessments.
    #[serde(default = "default_ten_minutes")]
    pub risk_ttl_secs: u64,
}

/// Geography used by the proxy models and point neighbourhoods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Origin of the elevation and NDVI proxies (city center).
    #[serde(default = "default_reference_lat")]
    pub reference_lat: f64,

    #[serde(default = "default_reference_lon")]
    pub reference_lon: f64,

    /// Half-width of the box searched around a point for stations and fires.
    #[serde(default = "default_search_radius_deg")]
    pub search_radius_deg: f64,

    /// Radius for counting fires "nearby" a point.
    #[serde(default = "default_fire_radius_km")]
    pub fire_radius_km: f64,
}

/// Composite risk settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeConfig {
    /// Fixed vegetation share feeding the oxygen estimate (0-1).
    #[serde(default = "default_vegetation_proxy")]
    pub vegetation_proxy: f64,
}

impl CacheConfig {
    pub fn weather_ttl(&self) -> Duration {
        Duration::from_secs(self.weather_ttl_secs)
    }

    pub fn air_quality_ttl(&self) -> Duration {
        Duration::from_secs(self.air_quality_ttl_secs)
    }

    pub fn fires_ttl(&self) -> Duration {
        Duration::from_secs(self.fires_ttl_secs)
    }

    pub fn vegetation_ttl(&self) -> Duration {
        Duration::from_secs(self.vegetation_ttl_secs)
    }

    pub fn risk_ttl(&self) -> Duration {
        Duration::from_secs(self.risk_ttl_secs)
    }
}

impl SourcesConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_open_meteo_url() -> String {
    "https://api.open-meteo.com".into()
}
fn default_openaq_url() -> String {
    "https://api.openaq.org".into()
}
fn default_firms_url() -> String {
    "https://firms.modaps.eosdis.nasa.gov".into()
}
fn default_firms_product() -> String {
    "VIIRS_SNPP_NRT".into()
}
fn default_firms_day_range() -> u8 {
    1
}
fn default_waqi_url() -> String {
    "https://api.waqi.info".into()
}
fn default_user_agent() -> String {
    "earthguard/0.1".into()
}
fn default_http_timeout() -> u64 {
    15
}

fn default_ten_minutes() -> u64 {
    600
}
fn default_one_hour() -> u64 {
    3600
}

fn default_reference_lat() -> f64 {
    30.4278
}
fn default_reference_lon() -> f64 {
    -9.5981
}
fn default_search_radius_deg() -> f64 {
    0.5
}
fn default_fire_radius_km() -> f64 {
    10.0
}

fn default_vegetation_proxy() -> f64 {
    0.8
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            open_meteo_url: default_open_meteo_url(),
            openaq_url: default_openaq_url(),
            firms_url: default_firms_url(),
            firms_map_key: String::new(),
            firms_product: default_firms_product(),
            firms_day_range: default_firms_day_range(),
            waqi_url: default_waqi_url(),
            waqi_token: String::new(),
            user_agent: default_user_agent(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            weather_ttl_secs: default_ten_minutes(),
            air_quality_ttl_secs: default_ten_minutes(),
            fires_ttl_secs: default_one_hour(),
            vegetation_ttl_secs: default_one_hour(),
            risk_ttl_secs: default_ten_minutes(),
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            reference_lat: default_reference_lat(),
            reference_lon: default_reference_lon(),
            search_radius_deg: default_search_radius_deg(),
            fire_radius_km: default_fire_radius_km(),
        }
    }
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            vegetation_proxy: default_vegetation_proxy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").expect("empty config parses");
        assert_eq!(cfg.cache.weather_ttl_secs, 600);
        assert_eq!(cfg.cache.fires_ttl_secs, 3600);
        assert_eq!(cfg.region.fire_radius_km, 10.0);
        assert_eq!(cfg.sources.firms_product, "VIIRS_SNPP_NRT");
        assert!(cfg.sources.firms_map_key.is_empty());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"cache": {"weather_ttl_secs": 60}}"#).expect("parses");
        assert_eq!(cfg.cache.weather_ttl(), Duration::from_secs(60));
        assert_eq!(cfg.cache.vegetation_ttl(), Duration::from_secs(3600));
    }
}
