//! World Air Quality Index (WAQI) geo-feed client.
//!
//! Unlike the other adapters this one has no fallback dataset: without a
//! token, or on any failure, it simply returns `None`.

use std::time::Duration;

use chrono::Utc;
use common::cache::{point_key, SharedCache};
use common::config::SourcesConfig;
use common::{iso_timestamp, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::build_http_client;

/// Latest station reading nearest to a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaqiReading {
    pub aqi: f64,
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub co: f64,
    pub so2: f64,
    pub location: String,
    pub timestamp: String,
}

/// US EPA style AQI band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AqiLevel {
    pub level: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct WaqiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    cache: SharedCache<WaqiReading>,
    ttl: Duration,
}

// ── WAQI response types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FeedResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct FeedData {
    /// Number, or "-" when the station has no current index.
    #[serde(default)]
    pub aqi: serde_json::Value,
    #[serde(default)]
    pub iaqi: Option<Iaqi>,
    #[serde(default)]
    pub city: Option<City>,
    #[serde(default)]
    pub time: Option<FeedTime>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Iaqi {
    pub pm25: Option<IaqiValue>,
    pub pm10: Option<IaqiValue>,
    pub no2: Option<IaqiValue>,
    pub o3: Option<IaqiValue>,
    pub co: Option<IaqiValue>,
    pub so2: Option<IaqiValue>,
}

#[derive(Debug, Deserialize)]
pub struct IaqiValue {
    pub v: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct City {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedTime {
    pub iso: Option<String>,
}

// ── Implementation ────────────────────────────────────────────────────

impl WaqiClient {
    pub fn new(
        sources: &SourcesConfig,
        cache: SharedCache<WaqiReading>,
        ttl: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            client: build_http_client(sources, "WAQI")?,
            base_url: sources.waqi_url.trim_end_matches('/').to_string(),
            token: sources.waqi_token.trim().to_string(),
            cache,
            ttl,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }

    /// Nearest-station reading, or `None` when unconfigured or unavailable.
    pub async fn get_station(&self, lat: f64, lon: f64) -> Option<WaqiReading> {
        let key = point_key("waqi", lat, lon);
        if let Some(cached) = self.cache.get(&key, self.ttl) {
            debug!("WAQI cache hit: {}", key);
            return Some(cached);
        }

        if !self.is_configured() {
            warn!("WAQI token not configured, skipping WAQI lookup");
            return None;
        }

        match self.fetch_feed(lat, lon).await {
            Ok(reading) => {
                self.cache.set(key, reading.clone());
                Some(reading)
            }
            Err(e) => {
                warn!("WAQI lookup failed: {}", e);
                None
            }
        }
    }

    pub async fn fetch_feed(&self, lat: f64, lon: f64) -> Result<WaqiReading, Error> {
        let url = format!("{}/feed/geo:{};{}/", self.base_url, lat, lon);
        debug!("Fetching WAQI feed: {}", url);

        let resp = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
            .map_err(|e| Error::Http(format!("WAQI request for ({lat},{lon}): {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "WAQI returned {} for ({lat},{lon})",
                status.as_u16()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("WAQI body for ({lat},{lon}): {e}")))?;

        parse_feed(&body)
    }
}

/// Decode a WAQI geo-feed document. Missing pollutants read as 0.
pub fn parse_feed(body: &str) -> Result<WaqiReading, Error> {
    let payload: FeedResponse = serde_json::from_str(body)?;
    let data = match (payload.status.as_str(), payload.data) {
        ("ok", Some(data)) if data.is_object() => data,
        (status, _) => {
            return Err(Error::Upstream(format!(
                "WAQI returned invalid data (status={status})"
            )))
        }
    };
    let data: FeedData = serde_json::from_value(data)?;

    let iaqi = data.iaqi.unwrap_or_default();
    let v = |value: &Option<IaqiValue>| value.as_ref().and_then(|x| x.v).unwrap_or(0.0);

    Ok(WaqiReading {
        aqi: data.aqi.as_f64().unwrap_or(0.0),
        pm25: v(&iaqi.pm25),
        pm10: v(&iaqi.pm10),
        no2: v(&iaqi.no2),
        o3: v(&iaqi.o3),
        co: v(&iaqi.co),
        so2: v(&iaqi.so2),
        location: data
            .city
            .and_then(|c| c.name)
            .unwrap_or_else(|| "Unknown".into()),
        timestamp: data
            .time
            .and_then(|t| t.iso)
            .unwrap_or_else(|| iso_timestamp(Utc::now())),
    })
}

/// Band an AQI value. Upper bounds are inclusive.
pub fn aqi_level(aqi: f64) -> AqiLevel {
    let (level, color, description) = if aqi <= 50.0 {
        ("Good", "#00e400", "Air quality is satisfactory")
    } else if aqi <= 100.0 {
        ("Moderate", "#ffff00", "Acceptable for most people")
    } else if aqi <= 150.0 {
        (
            "Unhealthy for Sensitive Groups",
            "#ff7e00",
            "Sensitive groups may experience health effects",
        )
    } else if aqi <= 200.0 {
        (
            "Unhealthy",
            "#ff0000",
            "Everyone may begin to experience health effects",
        )
    } else if aqi <= 300.0 {
        (
            "Very Unhealthy",
            "#8f3f97",
            "Health alert: everyone may experience serious effects",
        )
    } else {
        (
            "Hazardous",
            "#7e0023",
            "Health warnings of emergency conditions",
        )
    };

    AqiLevel {
        level,
        color,
        description,
    }
}
