//! Air-quality clients.
//!
//! - `openaq` — latest per-station measurements inside a bbox.
//! - `waqi` — single nearest-station AQI feed (token required).

pub mod openaq;
pub mod waqi;

pub use openaq::OpenAqClient;
pub use waqi::{aqi_level, AqiLevel, WaqiClient, WaqiReading};

use common::config::SourcesConfig;
use common::Error;

fn build_http_client(sources: &SourcesConfig, provider: &str) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .user_agent(sources.user_agent.as_str())
        .pool_max_idle_per_host(4)
        .timeout(sources.http_timeout())
        .build()
        .map_err(|e| Error::Http(format!("failed to build {provider} HTTP client: {e}")))
}
