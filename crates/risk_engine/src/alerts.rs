//! Region-level hazard alerts.

use chrono::{DateTime, Utc};
use common::{iso_timestamp, AirQualityPoint, FireCollection, WeatherObservation};
use serde::Serialize;

/// Label attached to every alert's `location`.
pub const REGION_LABEL: &str = "Region";

const FLOOD_PROBABILITY_TRIGGER: f64 = 70.0;
const HEAT_TRIGGER: f64 = 38.0;
const AIR_PM25_TRIGGER: f64 = 55.0;
/// More detections than this escalate a fire alert to high.
const FIRE_HIGH_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Flood,
    Fire,
    Heat,
    Air,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Flood => "flood",
            AlertKind::Fire => "fire",
            AlertKind::Heat => "heat",
            AlertKind::Air => "air",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub location: String,
    pub timestamp: String,
}

impl Alert {
    fn new(kind: AlertKind, severity: Severity, message: String, at: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}-{}", kind.as_str(), at.timestamp_millis()),
            kind,
            severity,
            message,
            location: REGION_LABEL.to_string(),
            timestamp: iso_timestamp(at),
        }
    }
}

/// Alerts for a region from its center-point weather and in-box detections.
///
/// At most one alert per hazard, in flood, fire, heat, air order.
pub fn generate_alerts(
    weather: &WeatherObservation,
    fires: &FireCollection,
    air: &[AirQualityPoint],
    at: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let rain_probability = weather.daily.precipitation_probability(0).unwrap_or(0.0);
    if rain_probability > FLOOD_PROBABILITY_TRIGGER {
        alerts.push(Alert::new(
            AlertKind::Flood,
            Severity::High,
            format!("Flood Watch — {rain_probability}% rainfall probability next 48h"),
            at,
        ));
    }

    let fire_count = fires.len();
    if fire_count > 0 {
        let severity = if fire_count > FIRE_HIGH_COUNT {
            Severity::High
        } else {
            Severity::Medium
        };
        alerts.push(Alert::new(
            AlertKind::Fire,
            severity,
            format!("{fire_count} active fire(s) detected in region"),
            at,
        ));
    }

    let max_temperature = weather.daily.max_temperature(0).unwrap_or(0.0);
    if max_temperature > HEAT_TRIGGER {
        alerts.push(Alert::new(
            AlertKind::Heat,
            Severity::High,
            format!("Extreme heat warning — {max_temperature}°C expected"),
            at,
        ));
    }

    let average_pm25 = air.iter().map(|p| p.pm25).sum::<f64>() / air.len().max(1) as f64;
    if average_pm25 > AIR_PM25_TRIGGER {
        alerts.push(Alert::new(
            AlertKind::Air,
            Severity::Medium,
            format!(
                "Unhealthy air quality — PM2.5 levels elevated ({} µg/m³)",
                average_pm25.round()
            ),
            at,
        ));
    }

    alerts
}
