//! Engine wiring: adapters, caches and scorers behind one handle.
//!
//! Every public method corresponds to one query the invocation layer can
//! make and returns the JSON-ready envelope for it. Adapter calls a query
//! needs are issued concurrently and awaited together before scoring.

use std::sync::Arc;

use air_quality_client::{aqi_level, AqiLevel, OpenAqClient, WaqiClient, WaqiReading};
use chrono::Utc;
use common::cache::SharedCache;
use common::config::EngineConfig;
use common::{
    air_quality_features, iso_timestamp, AirQualityPoint, AirQualityProperties, BoundingBox, Clock,
    FeatureCollection, FireCollection, Location, Sourced, SystemClock, TtlCache,
    WeatherObservation,
};
use firms_client::FirmsClient;
use open_meteo_client::OpenMeteoClient;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alerts::{generate_alerts, Alert};
use crate::composite::{
    count_fires_near_location, generate_suggestions, nearest_air_quality_point, summarize,
    CompositeInputs, RiskSummary, DEFAULT_HUMIDITY, DEFAULT_TEMPERATURE,
};
use crate::fire::{
    fire_danger_index, fire_spread, FireFactors, FireRiskAssessment, FireRiskScorer, FireSpread,
    DEFAULT_DROUGHT_FACTOR,
};
use crate::flood::{FloodRiskAssessment, FloodRiskScorer, FORECAST_HORIZON_DAYS};
use crate::proxy::{JitterSource, TerrainProxy, ThreadRngJitter};
use crate::vegetation::{planting_priority, PlantingPriority, VegetationSample, VegetationScorer};

/// Pollutants requested when the caller names none.
pub const DEFAULT_AIR_PARAMETERS: [&str; 1] = ["pm25"];

// ── Envelopes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    #[serde(flatten)]
    pub summary: RiskSummary,
    pub suggestions: Vec<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireRiskReport {
    #[serde(flatten)]
    pub assessment: FireRiskAssessment,
    pub spread: FireSpread,
    pub fire_danger_index: f64,
    pub location: Location,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FloodRiskReport {
    #[serde(flatten)]
    pub assessment: FloodRiskAssessment,
    pub location: Location,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantingReport {
    #[serde(flatten)]
    pub priority: PlantingPriority,
    pub location: Location,
    pub ndvi: f64,
    pub vegetation_level: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReport {
    #[serde(flatten)]
    pub reading: WaqiReading,
    pub aqi_level: AqiLevel,
}

// ── Caches ────────────────────────────────────────────────────────────

/// One cache per data kind, shared by the adapters and scorers that own it.
#[derive(Debug, Clone)]
pub struct EngineCaches {
    pub weather: SharedCache<WeatherObservation>,
    pub air_quality: SharedCache<Vec<AirQualityPoint>>,
    pub stations: SharedCache<WaqiReading>,
    pub fires: SharedCache<FireCollection>,
    pub vegetation: SharedCache<VegetationSample>,
    pub fire_risk: SharedCache<FireRiskAssessment>,
    pub flood_risk: SharedCache<FloodRiskAssessment>,
}

impl EngineCaches {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            weather: Arc::new(TtlCache::with_clock(clock.clone())),
            air_quality: Arc::new(TtlCache::with_clock(clock.clone())),
            stations: Arc::new(TtlCache::with_clock(clock.clone())),
            fires: Arc::new(TtlCache::with_clock(clock.clone())),
            vegetation: Arc::new(TtlCache::with_clock(clock.clone())),
            fire_risk: Arc::new(TtlCache::with_clock(clock.clone())),
            flood_risk: Arc::new(TtlCache::with_clock(clock)),
        }
    }

    pub fn clear(&self) {
        self.weather.clear();
        self.air_quality.clear();
        self.stations.clear();
        self.fires.clear();
        self.vegetation.clear();
        self.fire_risk.clear();
        self.flood_risk.clear();
    }
}

impl Default for EngineCaches {
    fn default() -> Self {
        Self::new()
    }
}

// ── Engine ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: EngineConfig,
    caches: EngineCaches,
    weather: OpenMeteoClient,
    openaq: OpenAqClient,
    waqi: WaqiClient,
    firms: FirmsClient,
    fire: FireRiskScorer,
    flood: FloodRiskScorer,
    vegetation: VegetationScorer,
}

impl RiskEngine {
    /// Engine with fresh caches and unseeded proxy jitter.
    pub fn new(config: EngineConfig) -> common::Result<Self> {
        Self::with_parts(config, EngineCaches::new(), Arc::new(ThreadRngJitter))
    }

    pub fn with_parts(
        config: EngineConfig,
        caches: EngineCaches,
        jitter: Arc<dyn JitterSource>,
    ) -> common::Result<Self> {
        let sources = &config.sources;
        let ttl = &config.cache;
        let terrain = TerrainProxy::new(&config.region, jitter);

        let engine = Self {
            weather: OpenMeteoClient::new(sources, caches.weather.clone(), ttl.weather_ttl())?,
            openaq: OpenAqClient::new(sources, caches.air_quality.clone(), ttl.air_quality_ttl())?,
            waqi: WaqiClient::new(sources, caches.stations.clone(), ttl.air_quality_ttl())?,
            firms: FirmsClient::new(sources, caches.fires.clone(), ttl.fires_ttl())?,
            fire: FireRiskScorer::new(caches.fire_risk.clone(), ttl.risk_ttl()),
            flood: FloodRiskScorer::new(terrain.clone(), caches.flood_risk.clone(), ttl.risk_ttl()),
            vegetation: VegetationScorer::new(
                terrain,
                caches.vegetation.clone(),
                ttl.vegetation_ttl(),
            ),
            caches,
            config,
        };

        info!(
            "Risk engine ready (FIRMS key: {}, WAQI token: {})",
            if engine.config.sources.firms_map_key.is_empty() { "missing" } else { "set" },
            if engine.waqi.is_configured() { "set" } else { "missing" },
        );
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn caches(&self) -> &EngineCaches {
        &self.caches
    }

    /// Search box used for station and fire lookups around a point.
    fn neighbourhood(&self, lat: f64, lon: f64) -> BoundingBox {
        BoundingBox::around(lat, lon, self.config.region.search_radius_deg)
    }

    // ── Raw data ──────────────────────────────────────────────────────

    pub async fn weather(&self, lat: f64, lon: f64) -> Sourced<WeatherObservation> {
        self.weather.get_weather(lat, lon).await
    }

    /// Station readings in `bbox` as GeoJSON. An empty parameter list
    /// means PM2.5 only.
    pub async fn air_points(
        &self,
        bbox: &BoundingBox,
        parameters: &[String],
    ) -> Sourced<FeatureCollection<AirQualityProperties>> {
        let parameters = if parameters.is_empty() {
            DEFAULT_AIR_PARAMETERS.iter().map(|p| p.to_string()).collect()
        } else {
            parameters.to_vec()
        };

        self.openaq
            .get_air_quality(bbox, &parameters)
            .await
            .map(|points| air_quality_features(&points))
    }

    pub async fn fires(&self, bbox: &BoundingBox) -> Sourced<FireCollection> {
        self.firms.get_fires(bbox).await
    }

    /// Nearest WAQI station with its AQI band, if a token is configured.
    pub async fn station_aqi(&self, lat: f64, lon: f64) -> Option<StationReport> {
        let reading = self.waqi.get_station(lat, lon).await?;
        Some(StationReport {
            aqi_level: aqi_level(reading.aqi),
            reading,
        })
    }

    // ── Assessments ───────────────────────────────────────────────────

    /// Composite hazard summary for a point.
    pub async fn risk_summary(&self, lat: f64, lon: f64) -> RiskReport {
        let area = self.neighbourhood(lat, lon);
        let pm25_only = [DEFAULT_AIR_PARAMETERS[0].to_string()];

        let (weather, air, fires) = tokio::join!(
            self.weather.get_weather(lat, lon),
            self.openaq.get_air_quality(&area, &pm25_only),
            self.firms.get_fires(&area),
        );

        if weather.is_fallback() || air.is_fallback() || fires.is_fallback() {
            warn!(
                "Risk summary for ({}, {}) uses fallback data (weather={}, air={}, fires={})",
                lat,
                lon,
                weather.is_fallback(),
                air.is_fallback(),
                fires.is_fallback()
            );
        }

        let fires_nearby =
            count_fires_near_location(lat, lon, fires.data(), self.config.region.fire_radius_km);
        let summary = summarize(CompositeInputs {
            weather: weather.data(),
            air: nearest_air_quality_point(lat, lon, air.data()),
            fires_nearby,
            vegetation_proxy: self.config.composite.vegetation_proxy,
        });
        let suggestions = generate_suggestions(&summary);
        debug!(
            "Risk summary for ({}, {}): {} fires nearby, {} suggestions",
            lat,
            lon,
            fires_nearby,
            suggestions.len()
        );

        RiskReport {
            summary,
            suggestions,
            metadata: Metadata {
                lat,
                lon,
                timestamp: iso_timestamp(Utc::now()),
            },
        }
    }

    pub async fn fire_risk(&self, lat: f64, lon: f64) -> FireRiskReport {
        let weather = self.weather.get_weather(lat, lon).await;
        let current = &weather.data().current;

        let temperature = current.temperature_2m.unwrap_or(DEFAULT_TEMPERATURE);
        let humidity = current.relative_humidity_2m.unwrap_or(DEFAULT_HUMIDITY);
        let wind_speed = current.wind_speed_10m.unwrap_or(0.0);
        let ndvi = self.vegetation.sample(lat, lon).ndvi;

        let assessment = self.fire.score(
            lat,
            lon,
            FireFactors {
                temperature,
                humidity,
                wind_speed,
                ndvi,
            },
        );

        FireRiskReport {
            assessment,
            // No wind direction or terrain slope feeds the spread yet.
            spread: fire_spread(wind_speed, 0.0, 0.0),
            fire_danger_index: fire_danger_index(
                temperature,
                humidity,
                wind_speed,
                DEFAULT_DROUGHT_FACTOR,
            ),
            location: Location { lat, lon },
            timestamp: iso_timestamp(Utc::now()),
        }
    }

    pub async fn flood_risk(&self, lat: f64, lon: f64) -> FloodRiskReport {
        let weather = self.weather.get_weather(lat, lon).await;
        let observation = weather.data();

        let forecast = observation.daily.rainfall_forecast(FORECAST_HORIZON_DAYS);
        let current_rainfall = observation.current.precipitation.unwrap_or(0.0);

        FloodRiskReport {
            assessment: self.flood.score(lat, lon, &forecast, current_rainfall),
            location: Location { lat, lon },
            timestamp: iso_timestamp(Utc::now()),
        }
    }

    pub fn vegetation(&self, lat: f64, lon: f64) -> VegetationSample {
        self.vegetation.sample(lat, lon)
    }

    /// Planting priority at a point. Temperature defaults to 25 °C and
    /// PM2.5 to 0 when not supplied.
    pub fn planting_priority(
        &self,
        lat: f64,
        lon: f64,
        temperature: Option<f64>,
        pm25: Option<f64>,
    ) -> PlantingReport {
        let sample = self.vegetation.sample(lat, lon);
        let priority = planting_priority(
            sample.ndvi,
            temperature.unwrap_or(DEFAULT_TEMPERATURE),
            pm25.unwrap_or(0.0),
        );

        PlantingReport {
            priority,
            location: Location { lat, lon },
            ndvi: sample.ndvi,
            vegetation_level: sample.vegetation_level,
        }
    }

    /// Region alerts: weather at the box center, fires and stations in the box.
    pub async fn alerts(&self, bbox: &BoundingBox) -> AlertReport {
        let (center_lat, center_lon) = bbox.center();
        let pm25_only = [DEFAULT_AIR_PARAMETERS[0].to_string()];

        let (weather, fires, air) = tokio::join!(
            self.weather.get_weather(center_lat, center_lon),
            self.firms.get_fires(bbox),
            self.openaq.get_air_quality(bbox, &pm25_only),
        );

        let alerts = generate_alerts(weather.data(), fires.data(), air.data(), Utc::now());
        info!("{} alert(s) for bbox {}", alerts.len(), bbox);
        AlertReport { alerts }
    }
}
