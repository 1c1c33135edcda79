//! Open-Meteo weather client.
//!
//! Fetches current conditions and a 7-day daily forecast for a point.
//! Results are cached for the configured window; any upstream failure
//! yields a fixed synthetic forecast instead of an error.

use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use common::cache::{point_key, SharedCache};
use common::config::SourcesConfig;
use common::{
    body_excerpt, CurrentWeather, DailyForecast, Error, Sourced, WeatherObservation,
};
use tracing::{debug, warn};

const FORECAST_PATH: &str = "/v1/forecast";
const CURRENT_VARS: &str = "temperature_2m,relative_humidity_2m,precipitation,wind_speed_10m";
const DAILY_VARS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_sum,precipitation_probability_max";
const FORECAST_DAYS: usize = 7;

/// Open-Meteo API client with a shared observation cache.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
    cache: SharedCache<WeatherObservation>,
    ttl: Duration,
}

impl OpenMeteoClient {
    pub fn new(
        sources: &SourcesConfig,
        cache: SharedCache<WeatherObservation>,
        ttl: Duration,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(sources.user_agent.as_str())
            .pool_max_idle_per_host(4)
            .timeout(sources.http_timeout())
            .build()
            .map_err(|e| Error::Http(format!("failed to build Open-Meteo HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: sources.open_meteo_url.trim_end_matches('/').to_string(),
            cache,
            ttl,
        })
    }

    /// Weather for a point: cached, fetched, or the fallback forecast.
    pub async fn get_weather(&self, lat: f64, lon: f64) -> Sourced<WeatherObservation> {
        let key = point_key("weather", lat, lon);
        if let Some(cached) = self.cache.get(&key, self.ttl) {
            debug!("Weather cache hit: {}", key);
            return Sourced::Fresh(cached);
        }

        match self.fetch_forecast(lat, lon).await {
            Ok(observation) => {
                self.cache.set(key, observation.clone());
                Sourced::Fresh(observation)
            }
            Err(e) => {
                warn!("Open-Meteo unavailable, using fallback forecast: {}", e);
                Sourced::Fallback(fallback_observation(Utc::now().date_naive()))
            }
        }
    }

    /// One uncached request to the forecast endpoint.
    pub async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<WeatherObservation, Error> {
        let url = format!("{}{}", self.base_url, FORECAST_PATH);
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current", CURRENT_VARS.to_string()),
            ("daily", DAILY_VARS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
        ];

        debug!("Fetching Open-Meteo forecast: {} lat={} lon={}", url, lat, lon);

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Open-Meteo request for ({lat},{lon}): {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Open-Meteo returned {} for ({lat},{lon}): {}",
                status.as_u16(),
                body_excerpt(&body, 500)
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("Open-Meteo body for ({lat},{lon}): {e}")))?;

        parse_forecast(&body)
    }
}

/// Decode an Open-Meteo forecast document.
pub fn parse_forecast(body: &str) -> Result<WeatherObservation, Error> {
    let observation: WeatherObservation = serde_json::from_str(body)?;
    if observation.daily.time.is_empty() && observation.current.temperature_2m.is_none() {
        return Err(Error::Upstream(
            "Open-Meteo payload has neither current nor daily data".into(),
        ));
    }
    Ok(observation)
}

/// Synthetic forecast served while Open-Meteo is unreachable.
pub fn fallback_observation(today: NaiveDate) -> WeatherObservation {
    let time = (0..FORECAST_DAYS as u64)
        .map(|offset| {
            today
                .checked_add_days(Days::new(offset))
                .unwrap_or(today)
                .format("%Y-%m-%d")
                .to_string()
        })
        .collect();

    let series = |values: [f64; FORECAST_DAYS]| -> Vec<Option<f64>> {
        values.into_iter().map(Some).collect()
    };

    WeatherObservation {
        current: CurrentWeather {
            temperature_2m: Some(28.0),
            relative_humidity_2m: Some(65.0),
            precipitation: Some(0.0),
            wind_speed_10m: Some(12.0),
        },
        daily: DailyForecast {
            time,
            temperature_2m_max: series([32.0, 33.0, 34.0, 35.0, 34.0, 33.0, 32.0]),
            temperature_2m_min: series([22.0, 23.0, 24.0, 25.0, 24.0, 23.0, 22.0]),
            precipitation_sum: series([0.0, 5.0, 10.0, 20.0, 15.0, 5.0, 0.0]),
            precipitation_probability_max: series([10.0, 20.0, 30.0, 50.0, 40.0, 20.0, 10.0]),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::TtlCache;

    use super::*;

    fn sample_response() -> &'static str {
        r#"{
            "latitude": 30.42,
            "longitude": -9.6,
            "current": {
                "time": "2026-10-17T12:00",
                "temperature_2m": 31.4,
                "relative_humidity_2m": 22,
                "precipitation": 0.2,
                "wind_speed_10m": 18.7
            },
            "daily": {
                "time": ["2026-10-17", "2026-10-18", "2026-10-19"],
                "temperature_2m_max": [36.1, 34.0, null],
                "temperature_2m_min": [21.0, 20.5, 19.8],
                "precipitation_sum": [0.0, 1.5, 12.0],
                "precipitation_probability_max": [5, 15, 80]
            }
        }"#
    }

    fn unreachable_client(cache: SharedCache<WeatherObservation>) -> OpenMeteoClient {
        let sources = SourcesConfig {
            open_meteo_url: "http://127.0.0.1:1".into(),
            http_timeout_secs: 2,
            ..Default::default()
        };
        OpenMeteoClient::new(&sources, cache, Duration::from_secs(600)).expect("client builds")
    }

    #[test]
    fn test_parse_forecast() {
        let obs = parse_forecast(sample_response()).expect("sample should parse");
        assert_eq!(obs.current.temperature_2m, Some(31.4));
        assert_eq!(obs.current.relative_humidity_2m, Some(22.0));
        assert_eq!(obs.daily.max_temperature(0), Some(36.1));
        assert_eq!(obs.daily.max_temperature(2), None);
        assert_eq!(obs.daily.precipitation_probability(2), Some(80.0));
        assert_eq!(obs.daily.rainfall_forecast(3), vec![0.0, 1.5, 12.0]);
    }

    #[test]
    fn test_parse_forecast_rejects_empty_payload() {
        assert!(parse_forecast(r#"{"error": true}"#).is_err());
        assert!(parse_forecast("not json").is_err());
    }

    #[test]
    fn test_fallback_has_seven_days_from_today() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 30).expect("valid date");
        let obs = fallback_observation(today);

        assert_eq!(obs.daily.time.len(), 7);
        assert_eq!(obs.daily.time[0], "2026-12-30");
        assert_eq!(obs.daily.time[2], "2027-01-01");
        assert_eq!(obs.current.temperature_2m, Some(28.0));
        assert_eq!(obs.daily.precipitation_sum(3), Some(20.0));
        assert_eq!(obs.daily.precipitation_probability(0), Some(10.0));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_falls_back_without_caching() {
        let cache = Arc::new(TtlCache::new());
        let client = unreachable_client(cache.clone());

        let result = client.get_weather(30.4278, -9.5981).await;

        assert!(result.is_fallback());
        assert_eq!(result.data().current.wind_speed_10m, Some(12.0));
        assert!(cache.is_empty(), "fallback data must not be cached");
    }

    /// Answers one request with a 503 and the given body.
    async fn serve_unavailable(body: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 503 Service Unavailable\r\ncontent-type: text/plain; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_multibyte_error_body_falls_back() {
        let base = serve_unavailable(format!("{}µ error", "x".repeat(499))).await;
        let sources = SourcesConfig {
            open_meteo_url: base,
            http_timeout_secs: 2,
            ..Default::default()
        };
        let cache = Arc::new(TtlCache::new());
        let client = OpenMeteoClient::new(&sources, cache.clone(), Duration::from_secs(600))
            .expect("client builds");

        let result = client.get_weather(30.4278, -9.5981).await;

        assert!(result.is_fallback());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream() {
        let cache = Arc::new(TtlCache::new());
        let seeded = parse_forecast(sample_response()).expect("sample should parse");
        cache.set(point_key("weather", 30.4278, -9.5981), seeded.clone());
        let client = unreachable_client(cache);

        // Nearby coordinates round into the same slot.
        let result = client.get_weather(30.4301, -9.6049).await;

        assert_eq!(result, Sourced::Fresh(seeded));
    }
}
