//! OpenAQ latest-measurements client.

use std::time::Duration;

use chrono::Utc;
use common::cache::SharedCache;
use common::config::SourcesConfig;
use common::{body_excerpt, iso_timestamp, AirQualityPoint, BoundingBox, Error, Sourced};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::build_http_client;

const LATEST_PATH: &str = "/v2/latest";
const PAGE_LIMIT: u32 = 100;

/// OpenAQ client with a shared station-set cache.
#[derive(Debug, Clone)]
pub struct OpenAqClient {
    client: reqwest::Client,
    base_url: String,
    cache: SharedCache<Vec<AirQualityPoint>>,
    ttl: Duration,
}

// ── OpenAQ response types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LatestResponse {
    #[serde(default)]
    pub results: Vec<LatestResult>,
}

#[derive(Debug, Deserialize)]
pub struct LatestResult {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Deserialize)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Measurement {
    pub parameter: String,
    pub value: Option<f64>,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: Option<String>,
}

// ── Implementation ────────────────────────────────────────────────────

impl OpenAqClient {
    pub fn new(
        sources: &SourcesConfig,
        cache: SharedCache<Vec<AirQualityPoint>>,
        ttl: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            client: build_http_client(sources, "OpenAQ")?,
            base_url: sources.openaq_url.trim_end_matches('/').to_string(),
            cache,
            ttl,
        })
    }

    /// Station measurements inside `bbox`: cached, fetched, or the fallback set.
    pub async fn get_air_quality(
        &self,
        bbox: &BoundingBox,
        parameters: &[String],
    ) -> Sourced<Vec<AirQualityPoint>> {
        let key = format!("openaq:{}:{}", bbox, parameters.join(","));
        if let Some(cached) = self.cache.get(&key, self.ttl) {
            debug!("OpenAQ cache hit: {}", key);
            return Sourced::Fresh(cached);
        }

        match self.fetch_latest(bbox, parameters).await {
            Ok(points) => {
                self.cache.set(key, points.clone());
                Sourced::Fresh(points)
            }
            Err(e) => {
                warn!("OpenAQ unavailable, using fallback stations: {}", e);
                Sourced::Fallback(fallback_points())
            }
        }
    }

    /// One uncached request for the latest readings in `bbox`.
    pub async fn fetch_latest(
        &self,
        bbox: &BoundingBox,
        parameters: &[String],
    ) -> Result<Vec<AirQualityPoint>, Error> {
        let url = format!("{}{}", self.base_url, LATEST_PATH);
        let mut query = vec![
            ("limit", PAGE_LIMIT.to_string()),
            ("bbox", bbox.to_string()),
        ];
        query.extend(parameters.iter().map(|p| ("parameter", p.clone())));

        debug!("Fetching OpenAQ latest: {} bbox={}", url, bbox);

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Http(format!("OpenAQ request for {bbox}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "OpenAQ returned {} for {bbox}: {}",
                status.as_u16(),
                body_excerpt(&body, 500)
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("OpenAQ body for {bbox}: {e}")))?;

        let points = parse_latest(&body)?;
        debug!("Got {} OpenAQ stations for {}", points.len(), bbox);
        Ok(points)
    }
}

/// Flatten an OpenAQ `latest` document into one point per station.
///
/// Pollutants a station does not report read as 0.
pub fn parse_latest(body: &str) -> Result<Vec<AirQualityPoint>, Error> {
    let payload: LatestResponse = serde_json::from_str(body)?;
    let now = iso_timestamp(Utc::now());

    let points = payload
        .results
        .into_iter()
        .map(|result| {
            let (lat, lon) = result
                .coordinates
                .as_ref()
                .map(|c| (c.latitude.unwrap_or(0.0), c.longitude.unwrap_or(0.0)))
                .unwrap_or((0.0, 0.0));

            let observed_at = result
                .measurements
                .first()
                .and_then(|m| m.last_updated.clone())
                .unwrap_or_else(|| now.clone());

            let mut point = AirQualityPoint {
                lat,
                lon,
                pm25: 0.0,
                no2: 0.0,
                o3: 0.0,
                location_name: result.location.unwrap_or_else(|| "Unknown".into()),
                observed_at,
            };

            for m in &result.measurements {
                let value = m.value.unwrap_or(0.0);
                match m.parameter.as_str() {
                    "pm25" => point.pm25 = value,
                    "no2" => point.no2 = value,
                    "o3" => point.o3 = value,
                    _ => {}
                }
            }

            point
        })
        .collect();

    Ok(points)
}

/// Single synthetic station used while OpenAQ is unreachable.
pub fn fallback_points() -> Vec<AirQualityPoint> {
    vec![AirQualityPoint {
        lat: 30.4278,
        lon: -9.5981,
        pm25: 43.0,
        no2: 28.0,
        o3: 65.0,
        location_name: "Agadir Center".into(),
        observed_at: iso_timestamp(Utc::now()),
    }]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::TtlCache;

    use super::*;

    fn sample_response() -> &'static str {
        r#"{
            "meta": {"name": "openaq-api", "found": 2},
            "results": [
                {
                    "location": "Agadir Port",
                    "coordinates": {"latitude": 30.42, "longitude": -9.63},
                    "measurements": [
                        {"parameter": "pm25", "value": 38.5, "lastUpdated": "2026-10-17T10:00:00+00:00", "unit": "µg/m³"},
                        {"parameter": "no2", "value": 21.0, "lastUpdated": "2026-10-17T09:00:00+00:00", "unit": "µg/m³"},
                        {"parameter": "pm10", "value": 80.0, "lastUpdated": "2026-10-17T10:00:00+00:00", "unit": "µg/m³"}
                    ]
                },
                {
                    "location": null,
                    "measurements": [
                        {"parameter": "o3", "value": 70.0}
                    ]
                }
            ]
        }"#
    }

    #[test]
    fn test_parse_latest() {
        let points = parse_latest(sample_response()).expect("sample should parse");
        assert_eq!(points.len(), 2);

        let port = &points[0];
        assert_eq!(port.location_name, "Agadir Port");
        assert_eq!(port.lat, 30.42);
        assert_eq!(port.pm25, 38.5);
        assert_eq!(port.no2, 21.0);
        assert_eq!(port.o3, 0.0);
        assert_eq!(port.observed_at, "2026-10-17T10:00:00+00:00");

        let unknown = &points[1];
        assert_eq!(unknown.location_name, "Unknown");
        assert_eq!((unknown.lat, unknown.lon), (0.0, 0.0));
        assert_eq!(unknown.o3, 70.0);
    }

    #[test]
    fn test_parse_latest_without_results() {
        assert!(parse_latest("{}").expect("empty doc parses").is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_falls_back_without_caching() {
        let cache = Arc::new(TtlCache::new());
        let sources = SourcesConfig {
            openaq_url: "http://127.0.0.1:1".into(),
            http_timeout_secs: 2,
            ..Default::default()
        };
        let client =
            OpenAqClient::new(&sources, cache.clone(), Duration::from_secs(600)).expect("builds");
        let bbox = BoundingBox::new(-10.0, 30.0, -9.0, 31.0);

        let result = client.get_air_quality(&bbox, &["pm25".to_string()]).await;

        assert!(result.is_fallback());
        assert_eq!(result.data().len(), 1);
        assert_eq!(result.data()[0].pm25, 43.0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_parameters_are_part_of_cache_key() {
        let cache = Arc::new(TtlCache::new());
        let bbox = BoundingBox::new(-10.0, 30.0, -9.0, 31.0);
        let seeded = parse_latest(sample_response()).expect("sample should parse");
        cache.set(format!("openaq:{}:pm25", bbox), seeded.clone());

        let sources = SourcesConfig {
            openaq_url: "http://127.0.0.1:1".into(),
            http_timeout_secs: 2,
            ..Default::default()
        };
        let client = OpenAqClient::new(&sources, cache, Duration::from_secs(600)).expect("builds");

        let hit = client.get_air_quality(&bbox, &["pm25".to_string()]).await;
        assert_eq!(hit, Sourced::Fresh(seeded));

        let miss = client
            .get_air_quality(&bbox, &["pm25".to_string(), "no2".to_string()])
            .await;
        assert!(miss.is_fallback());
    }
}
