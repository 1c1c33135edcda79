//! NASA FIRMS active-fire client.
//!
//! Pulls satellite hotspot detections for a bbox from the FIRMS area CSV
//! API and converts them to a GeoJSON point collection. A missing MAP_KEY,
//! a failed request, or an unreadable payload all yield the fixed fallback
//! detections clipped to the requested bbox.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use common::cache::SharedCache;
use common::config::SourcesConfig;
use common::{
    body_excerpt, BoundingBox, Error, Feature, FireCollection, FireDetection, FireProperties,
    Sourced,
};
use serde::Deserialize;
use tracing::{debug, warn};

/// FIRMS client with a shared detection cache.
#[derive(Debug, Clone)]
pub struct FirmsClient {
    client: reqwest::Client,
    base_url: String,
    map_key: String,
    product: String,
    day_range: u8,
    cache: SharedCache<FireCollection>,
    ttl: Duration,
}

/// One CSV row. VIIRS products name the brightness column `bright_ti4`,
/// MODIS products call it `brightness`.
#[derive(Debug, Deserialize)]
pub struct FirmsRow {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(alias = "bright_ti4", default)]
    pub brightness: Option<f64>,
    pub acq_date: String,
    pub acq_time: String,
    #[serde(default)]
    pub confidence: String,
}

impl FirmsClient {
    pub fn new(
        sources: &SourcesConfig,
        cache: SharedCache<FireCollection>,
        ttl: Duration,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(sources.user_agent.as_str())
            .pool_max_idle_per_host(4)
            .timeout(sources.http_timeout())
            .build()
            .map_err(|e| Error::Http(format!("failed to build FIRMS HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: sources.firms_url.trim_end_matches('/').to_string(),
            map_key: sources.firms_map_key.trim().to_string(),
            product: sources.firms_product.clone(),
            day_range: sources.firms_day_range.clamp(1, 10),
            cache,
            ttl,
        })
    }

    /// Detections inside `bbox`: cached, fetched, or the fallback set.
    pub async fn get_fires(&self, bbox: &BoundingBox) -> Sourced<FireCollection> {
        let key = format!("firms:{}", bbox);
        if let Some(cached) = self.cache.get(&key, self.ttl) {
            debug!("FIRMS cache hit: {}", key);
            return Sourced::Fresh(cached);
        }

        match self.fetch_area(bbox).await {
            Ok(fires) => {
                self.cache.set(key, fires.clone());
                Sourced::Fresh(fires)
            }
            Err(e) => {
                warn!("FIRMS unavailable, using fallback detections: {}", e);
                Sourced::Fallback(fallback_fires(bbox, Utc::now().date_naive()))
            }
        }
    }

    /// One uncached request to the area endpoint.
    pub async fn fetch_area(&self, bbox: &BoundingBox) -> Result<FireCollection, Error> {
        if self.map_key.is_empty() {
            return Err(Error::Upstream("FIRMS map key not configured".into()));
        }

        let url = format!(
            "{}/api/area/csv/{}/{}/{}/{}",
            self.base_url, self.map_key, self.product, bbox, self.day_range
        );
        debug!(
            "Fetching FIRMS detections: product={} bbox={} days={}",
            self.product, bbox, self.day_range
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("FIRMS request for {bbox}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "FIRMS returned {} for {bbox}: {}",
                status.as_u16(),
                body_excerpt(&body, 500)
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("FIRMS body for {bbox}: {e}")))?;

        let fires = parse_area_csv(&body, bbox)?;
        debug!("Got {} FIRMS detections for {}", fires.len(), bbox);
        Ok(fires)
    }
}

/// Parse a FIRMS area CSV, keeping rows inside `bbox`.
pub fn parse_area_csv(body: &str, bbox: &BoundingBox) -> Result<FireCollection, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    // FIRMS reports bad keys and quota errors as plain text with a 200.
    let headers = reader
        .headers()
        .map_err(|e| Error::Csv(e.to_string()))?
        .clone();
    if !headers.iter().any(|h| h == "latitude") {
        return Err(Error::Upstream(format!(
            "FIRMS payload is not a detection table: {}",
            body_excerpt(body, 200)
        )));
    }

    let mut features = Vec::new();
    for row in reader.deserialize::<FirmsRow>() {
        let row = row.map_err(|e| Error::Csv(e.to_string()))?;
        if !bbox.contains(row.latitude, row.longitude) {
            continue;
        }
        features.push(Feature::point(
            row.longitude,
            row.latitude,
            FireProperties {
                brightness: row.brightness.unwrap_or(0.0),
                confidence: confidence_label(&row.confidence),
                acq_date: row.acq_date,
                acq_time: format!("{:0>4}", row.acq_time),
            },
        ));
    }

    Ok(FireCollection { features })
}

/// Normalise VIIRS letter codes and MODIS percentages to low/nominal/high.
pub fn confidence_label(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        "h" | "high" => "high".into(),
        "n" | "nominal" => "nominal".into(),
        "l" | "low" => "low".into(),
        other => match other.parse::<f64>() {
            Ok(pct) if pct >= 80.0 => "high".into(),
            Ok(pct) if pct >= 30.0 => "nominal".into(),
            Ok(_) => "low".into(),
            Err(_) => other.to_string(),
        },
    }
}

/// Synthetic detections served while FIRMS is unavailable, clipped to `bbox`.
pub fn fallback_fires(bbox: &BoundingBox, today: NaiveDate) -> FireCollection {
    let candidates: [FireDetection; 1] = [Feature::point(
        -9.55,
        30.45,
        FireProperties {
            brightness: 325.5,
            confidence: "high".into(),
            acq_date: today.format("%Y-%m-%d").to_string(),
            acq_time: "1430".into(),
        },
    )];

    FireCollection {
        features: candidates
            .into_iter()
            .filter(|f| bbox.contains(f.lat(), f.lon()))
            .collect(),
    }
}
