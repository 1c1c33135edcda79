//! Configuration loader — merges env vars, .env file, and config.toml.

use std::path::Path;

use common::config::EngineConfig;
use common::Error;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(Error::Config(format!("{env_name} must be an integer > 0"))),
    }
}

fn parse_f64(raw: &str, env_name: &str) -> Result<f64, Error> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Config(format!("{env_name} must be a number")))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_config(config: &EngineConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    let sources = &config.sources;
    for (name, url) in [
        ("sources.open_meteo_url", &sources.open_meteo_url),
        ("sources.openaq_url", &sources.openaq_url),
        ("sources.firms_url", &sources.firms_url),
        ("sources.waqi_url", &sources.waqi_url),
    ] {
        if url.trim().is_empty() {
            issues.push(format!("{name} must not be empty"));
        }
    }
    if sources.http_timeout_secs == 0 {
        issues.push("sources.http_timeout_secs must be > 0".into());
    }
    if !(1..=10).contains(&sources.firms_day_range) {
        issues.push("sources.firms_day_range must be in [1,10]".into());
    }
    if sources.firms_product.trim().is_empty() {
        issues.push("sources.firms_product must not be empty".into());
    }

    let cache = &config.cache;
    for (name, ttl) in [
        ("cache.weather_ttl_secs", cache.weather_ttl_secs),
        ("cache.air_quality_ttl_secs", cache.air_quality_ttl_secs),
        ("cache.fires_ttl_secs", cache.fires_ttl_secs),
        ("cache.vegetation_ttl_secs", cache.vegetation_ttl_secs),
        ("cache.risk_ttl_secs", cache.risk_ttl_secs),
    ] {
        if ttl == 0 {
            issues.push(format!("{name} must be > 0"));
        }
    }

    let region = &config.region;
    if !(-90.0..=90.0).contains(&region.reference_lat) {
        issues.push("region.reference_lat must be in [-90,90]".into());
    }
    if !(-180.0..=180.0).contains(&region.reference_lon) {
        issues.push("region.reference_lon must be in [-180,180]".into());
    }
    if region.search_radius_deg <= 0.0 {
        issues.push("region.search_radius_deg must be > 0".into());
    }
    if region.fire_radius_km <= 0.0 {
        issues.push("region.fire_radius_km must be > 0".into());
    }

    if !(0.0..=1.0).contains(&config.composite.vegetation_proxy) {
        issues.push("composite.vegetation_proxy must be in [0,1]".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load engine configuration from environment and an optional config file.
///
/// A missing file is fine when `path` is `None`; an explicitly named file
/// must exist.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = EngineConfig::default();

    // 3. Layer the config file over the defaults.
    let (config_path, required) = match path {
        Some(p) => (p, true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
    } else if required {
        return Err(Error::Config(format!(
            "Config file {} does not exist",
            config_path.display()
        )));
    }

    // 4. Override with environment variables (highest priority).
    apply_env_overrides(&mut config)?;

    validate_config(&config)?;

    Ok(config)
}

fn apply_env_overrides(config: &mut EngineConfig) -> Result<(), Error> {
    let sources = &mut config.sources;
    if let Some(key) = env_string("FIRMS_MAP_KEY") {
        sources.firms_map_key = key;
    }
    if let Some(token) = env_string("WAQI_TOKEN") {
        sources.waqi_token = token;
    }
    if let Some(url) = env_string("OPEN_METEO_URL") {
        sources.open_meteo_url = url;
    }
    if let Some(url) = env_string("OPENAQ_URL") {
        sources.openaq_url = url;
    }
    if let Some(url) = env_string("FIRMS_URL") {
        sources.firms_url = url;
    }
    if let Some(url) = env_string("WAQI_URL") {
        sources.waqi_url = url;
    }
    if let Some(raw) = env_string("HTTP_TIMEOUT_SECS") {
        sources.http_timeout_secs = parse_positive_u64(&raw, "HTTP_TIMEOUT_SECS")?;
    }

    if let Some(raw) = env_string("EARTHGUARD_REFERENCE_LAT") {
        config.region.reference_lat = parse_f64(&raw, "EARTHGUARD_REFERENCE_LAT")?;
    }
    if let Some(raw) = env_string("EARTHGUARD_REFERENCE_LON") {
        config.region.reference_lon = parse_f64(&raw, "EARTHGUARD_REFERENCE_LON")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_validation_collects_every_issue() {
        let mut config = EngineConfig::default();
        config.cache.weather_ttl_secs = 0;
        config.region.fire_radius_km = -1.0;
        config.composite.vegetation_proxy = 1.5;
        config.sources.openaq_url = "  ".into();

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("cache.weather_ttl_secs must be > 0"));
        assert!(err.contains("region.fire_radius_km must be > 0"));
        assert!(err.contains("composite.vegetation_proxy must be in [0,1]"));
        assert!(err.contains("sources.openaq_url must not be empty"));
    }

    #[test]
    fn test_toml_sections_parse() {
        let config: EngineConfig = toml::from_str(
            r#"
            [sources]
            firms_product = "MODIS_NRT"
            firms_day_range = 3

            [region]
            fire_radius_km = 25.0
            "#,
        )
        .expect("toml parses");

        assert_eq!(config.sources.firms_product, "MODIS_NRT");
        assert_eq!(config.sources.firms_day_range, 3);
        assert_eq!(config.region.fire_radius_km, 25.0);
        assert_eq!(config.cache.fires_ttl_secs, 3600);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/earthguard.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_numeric_env_parsing() {
        assert_eq!(parse_positive_u64(" 30 ", "X").unwrap(), 30);
        assert!(parse_positive_u64("0", "X").is_err());
        assert!(parse_positive_u64("soon", "X").is_err());
        assert_eq!(parse_f64("-9.5981", "X").unwrap(), -9.5981);
        assert!(parse_f64("inf", "X").is_err());
    }
}
