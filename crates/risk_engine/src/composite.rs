//! Composite per-point risk summary and mitigation suggestions.
//!
//! Each hazard is reduced to a short human-readable label; suggestions are
//! then derived from the labels themselves, so the wording of the labels is
//! part of the contract.

use common::geo::{degree_distance, haversine_km};
use common::{AirQualityPoint, AirQualityReading, FireCollection, WeatherObservation};
use serde::Serialize;

/// Temperature assumed when the observation has none (°C).
pub const DEFAULT_TEMPERATURE: f64 = 25.0;
/// Humidity assumed when the observation has none (%).
pub const DEFAULT_HUMIDITY: f64 = 50.0;

/// Oxygen percentage below which tree planting is suggested.
const O2_SUGGESTION_THRESHOLD: i64 = 85;

pub const FLOOD_SUGGESTIONS: [&str; 2] = [
    "Prepare sandbags in low-lying areas — possible flooding from rainfall forecast.",
    "Clear drainage systems and gutters to prevent water accumulation.",
];
pub const FIRE_SUGGESTIONS: [&str; 2] = [
    "Avoid open fires near suburban dry areas for the next 72 hours.",
    "Monitor local fire alerts and keep emergency contacts ready.",
];
pub const HEAT_SUGGESTIONS: [&str; 2] = [
    "Install reflective coatings on public roofs nearby to reduce surface temp by 2–3°C.",
    "Increase tree canopy coverage in exposed areas to provide shade.",
];
pub const AIR_SUGGESTIONS: [&str; 2] = [
    "Increase vegetation along main boulevards to improve air quality.",
    "Consider car-free zones during peak pollution hours.",
];
pub const O2_SUGGESTION: &str =
    "Plant more trees and create green spaces to boost oxygen production.";
pub const FAVORABLE_SUGGESTION: &str =
    "Environmental conditions are currently favorable. Continue monitoring.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub flood_risk: String,
    pub fire_risk: String,
    pub heat_risk: String,
    pub air_quality_risk: String,
    /// e.g. "64% of normal"
    pub o2_estimate: String,
    #[serde(skip)]
    pub o2_percent: i64,
}

/// Everything the summary is computed from.
#[derive(Debug, Clone, Copy)]
pub struct CompositeInputs<'a> {
    pub weather: &'a WeatherObservation,
    pub air: AirQualityReading,
    pub fires_nearby: usize,
    pub vegetation_proxy: f64,
}

pub fn summarize(inputs: CompositeInputs<'_>) -> RiskSummary {
    let current = &inputs.weather.current;
    let daily = &inputs.weather.daily;

    let precipitation = daily.precipitation_sum(0).unwrap_or(0.0);
    let temperature = current.temperature_2m.unwrap_or(DEFAULT_TEMPERATURE);
    let humidity = current.relative_humidity_2m.unwrap_or(DEFAULT_HUMIDITY);
    let max_temperature = daily.max_temperature(0).unwrap_or(temperature);
    let pm25 = inputs.air.pm25;

    let o2_percent = o2_percent(inputs.vegetation_proxy, pm25);

    RiskSummary {
        flood_risk: flood_label(precipitation),
        fire_risk: fire_label(inputs.fires_nearby, temperature, humidity),
        heat_risk: heat_label(max_temperature),
        air_quality_risk: air_label(pm25),
        o2_estimate: format!("{o2_percent}% of normal"),
        o2_percent,
    }
}

pub fn flood_label(precipitation: f64) -> String {
    if precipitation > 60.0 {
        "High (>60mm rainfall expected)".to_string()
    } else if precipitation > 30.0 {
        "Medium (30-60mm rainfall expected)".to_string()
    } else {
        format!("Low ({}mm rainfall expected)", precipitation.round())
    }
}

pub fn fire_label(fires_nearby: usize, temperature: f64, humidity: f64) -> String {
    if fires_nearby > 0 && temperature > 32.0 && humidity < 40.0 {
        format!(
            "High ({fires_nearby} active fires nearby, temp {temperature}°C, humidity {humidity}%)"
        )
    } else if temperature > 35.0 || humidity < 30.0 {
        format!("Medium (temp {temperature}°C, humidity {humidity}%)")
    } else {
        format!("Low (humidity {humidity}%)")
    }
}

pub fn heat_label(max_temperature: f64) -> String {
    if max_temperature > 38.0 {
        format!("High ({max_temperature}°C expected)")
    } else if max_temperature > 34.0 {
        format!("Medium ({max_temperature}°C expected)")
    } else {
        format!("{max_temperature}°C, Low risk")
    }
}

pub fn air_label(pm25: f64) -> String {
    // Whole µg/m³ with halves rounded up.
    let shown = pm25.round();
    if pm25 > 55.0 {
        format!("Unhealthy (PM2.5: {shown} µg/m³)")
    } else if pm25 > 35.0 {
        format!("Moderate (PM2.5: {shown} µg/m³)")
    } else if pm25 > 0.0 {
        format!("Good (PM2.5: {shown} µg/m³)")
    } else {
        "No data available".to_string()
    }
}

/// Vegetation share discounted by pollution, as a whole percentage.
pub fn o2_percent(vegetation_proxy: f64, pm25: f64) -> i64 {
    let pollution_factor = (1.0 - pm25 / 100.0).max(0.0);
    (vegetation_proxy * pollution_factor * 100.0).round() as i64
}

pub fn generate_suggestions(summary: &RiskSummary) -> Vec<String> {
    let mut suggestions = Vec::new();
    let flags = |label: &str, words: [&str; 2]| words.iter().any(|w| label.contains(w));

    if flags(&summary.flood_risk, ["High", "Medium"]) {
        suggestions.extend(FLOOD_SUGGESTIONS.iter().map(|s| s.to_string()));
    }
    if flags(&summary.fire_risk, ["High", "Medium"]) {
        suggestions.extend(FIRE_SUGGESTIONS.iter().map(|s| s.to_string()));
    }
    if flags(&summary.heat_risk, ["High", "Medium"]) {
        suggestions.extend(HEAT_SUGGESTIONS.iter().map(|s| s.to_string()));
    }
    if flags(&summary.air_quality_risk, ["Unhealthy", "Moderate"]) {
        suggestions.extend(AIR_SUGGESTIONS.iter().map(|s| s.to_string()));
    }
    if summary.o2_percent < O2_SUGGESTION_THRESHOLD {
        suggestions.push(O2_SUGGESTION.to_string());
    }

    if suggestions.is_empty() {
        suggestions.push(FAVORABLE_SUGGESTION.to_string());
    }
    suggestions
}

/// Detections within `radius_km` great-circle distance, boundary included.
pub fn count_fires_near_location(lat: f64, lon: f64, fires: &FireCollection, radius_km: f64) -> usize {
    fires
        .features
        .iter()
        .filter(|f| haversine_km(lat, lon, f.lat(), f.lon()) <= radius_km)
        .count()
}

/// Readings of the closest station, measured in raw degree space.
///
/// No stations reads as all zeros. Ties go to the earlier station.
pub fn nearest_air_quality_point(lat: f64, lon: f64, points: &[AirQualityPoint]) -> AirQualityReading {
    points
        .iter()
        .min_by(|a, b| {
            degree_distance(lat, lon, a.lat, a.lon).total_cmp(&degree_distance(lat, lon, b.lat, b.lon))
        })
        .map(AirQualityReading::from)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use common::{CurrentWeather, DailyForecast, Feature, FireProperties};

    use super::*;

    fn weather(temp: f64, humidity: f64, max_temp: f64, precip: f64) -> WeatherObservation {
        WeatherObservation {
            current: CurrentWeather {
                temperature_2m: Some(temp),
                relative_humidity_2m: Some(humidity),
                precipitation: Some(0.0),
                wind_speed_10m: Some(10.0),
            },
            daily: DailyForecast {
                temperature_2m_max: vec![Some(max_temp)],
                precipitation_sum: vec![Some(precip)],
                ..Default::default()
            },
        }
    }

    fn fire_at(lat: f64, lon: f64) -> Feature<FireProperties> {
        Feature::point(
            lon,
            lat,
            FireProperties {
                brightness: 330.0,
                confidence: "high".into(),
                acq_date: "2026-10-17".into(),
                acq_time: "1200".into(),
            },
        )
    }

    fn station(lat: f64, lon: f64, pm25: f64) -> AirQualityPoint {
        AirQualityPoint {
            lat,
            lon,
            pm25,
            no2: 1.0,
            o3: 2.0,
            location_name: "S".into(),
            observed_at: "2026-10-17T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_flood_labels() {
        assert_eq!(flood_label(61.0), "High (>60mm rainfall expected)");
        assert_eq!(flood_label(60.0), "Medium (30-60mm rainfall expected)");
        assert_eq!(flood_label(12.4), "Low (12mm rainfall expected)");
    }

    #[test]
    fn test_fire_labels() {
        assert_eq!(
            fire_label(2, 33.0, 35.0),
            "High (2 active fires nearby, temp 33°C, humidity 35%)"
        );
        assert_eq!(fire_label(0, 36.0, 60.0), "Medium (temp 36°C, humidity 60%)");
        assert_eq!(fire_label(0, 28.5, 29.0), "Medium (temp 28.5°C, humidity 29%)");
        assert_eq!(fire_label(3, 30.0, 50.0), "Low (humidity 50%)");
    }

    #[test]
    fn test_heat_labels() {
        assert_eq!(heat_label(39.0), "High (39°C expected)");
        assert_eq!(heat_label(35.0), "Medium (35°C expected)");
        assert_eq!(heat_label(34.0), "34°C, Low risk");
    }

    #[test]
    fn test_air_labels() {
        assert_eq!(air_label(56.0), "Unhealthy (PM2.5: 56 µg/m³)");
        assert_eq!(air_label(43.0), "Moderate (PM2.5: 43 µg/m³)");
        assert_eq!(air_label(5.0), "Good (PM2.5: 5 µg/m³)");
        assert_eq!(air_label(0.0), "No data available");
    }

    #[test]
    fn test_labels_round_halves_up() {
        assert_eq!(flood_label(2.5), "Low (3mm rainfall expected)");
        assert_eq!(flood_label(0.5), "Low (1mm rainfall expected)");
        assert_eq!(air_label(42.5), "Moderate (PM2.5: 43 µg/m³)");
        assert_eq!(air_label(0.5), "Good (PM2.5: 1 µg/m³)");
    }

    #[test]
    fn test_o2_percent() {
        assert_eq!(o2_percent(0.8, 0.0), 80);
        assert_eq!(o2_percent(0.8, 43.0), 46);
        assert_eq!(o2_percent(0.8, 250.0), 0);
    }

    #[test]
    fn test_flood_high_emits_both_flood_suggestions() {
        let summary = summarize(CompositeInputs {
            weather: &weather(25.0, 60.0, 30.0, 80.0),
            air: AirQualityReading::default(),
            fires_nearby: 0,
            vegetation_proxy: 1.0,
        });
        assert!(summary.flood_risk.contains("High"));

        let suggestions = generate_suggestions(&summary);
        assert_eq!(suggestions, FLOOD_SUGGESTIONS.to_vec());
    }

    #[test]
    fn test_favorable_when_nothing_triggers() {
        let summary = summarize(CompositeInputs {
            weather: &weather(22.0, 60.0, 26.0, 0.0),
            air: AirQualityReading {
                pm25: 5.0,
                no2: 0.0,
                o3: 0.0,
            },
            fires_nearby: 0,
            vegetation_proxy: 1.0,
        });
        assert_eq!(summary.o2_estimate, "95% of normal");
        assert_eq!(generate_suggestions(&summary), vec![FAVORABLE_SUGGESTION]);
    }

    #[test]
    fn test_default_proxy_always_suggests_trees() {
        // 0.8 caps the estimate at 80%, below the 85% trigger.
        let summary = summarize(CompositeInputs {
            weather: &weather(22.0, 60.0, 26.0, 0.0),
            air: AirQualityReading::default(),
            fires_nearby: 0,
            vegetation_proxy: 0.8,
        });
        assert_eq!(generate_suggestions(&summary), vec![O2_SUGGESTION]);
    }

    #[test]
    fn test_missing_weather_uses_defaults() {
        let summary = summarize(CompositeInputs {
            weather: &WeatherObservation::default(),
            air: AirQualityReading::default(),
            fires_nearby: 0,
            vegetation_proxy: 0.8,
        });
        assert_eq!(summary.fire_risk, "Low (humidity 50%)");
        assert_eq!(summary.heat_risk, "25°C, Low risk");
        assert_eq!(summary.flood_risk, "Low (0mm rainfall expected)");
    }

    #[test]
    fn test_summary_json_keys() {
        let summary = summarize(CompositeInputs {
            weather: &weather(22.0, 60.0, 26.0, 0.0),
            air: AirQualityReading::default(),
            fires_nearby: 0,
            vegetation_proxy: 0.8,
        });
        let value = serde_json::to_value(&summary).expect("serializes");
        assert_eq!(value["o2Estimate"], "80% of normal");
        assert!(value.get("airQualityRisk").is_some());
        assert!(value.get("o2_percent").is_none());
        assert!(value.get("o2Percent").is_none());
    }

    #[test]
    fn test_fire_radius_boundary_is_inclusive() {
        let (lat, lon) = (30.4278, -9.5981);
        let fire = fire_at(lat + 0.09, lon);
        let exact = haversine_km(lat, lon, fire.lat(), fire.lon());
        let fires = FireCollection {
            features: vec![fire],
        };

        assert_eq!(count_fires_near_location(lat, lon, &fires, exact), 1);
        assert_eq!(count_fires_near_location(lat, lon, &fires, exact - 0.001), 0);
    }

    #[test]
    fn test_fire_ten_km_from_point() {
        let (lat, lon) = (30.4278, -9.5981);
        // 10 km due north.
        let dlat = 10.0 / 6371.0 * 180.0 / std::f64::consts::PI;
        let fires = FireCollection {
            features: vec![fire_at(lat + dlat, lon), fire_at(lat + 1.0, lon)],
        };

        assert_eq!(count_fires_near_location(lat, lon, &fires, 10.001), 1);
        assert_eq!(count_fires_near_location(lat, lon, &fires, 9.999), 0);
        assert_eq!(count_fires_near_location(lat, lon, &FireCollection::empty(), 10.0), 0);
    }

    #[test]
    fn test_nearest_station_in_degree_space() {
        let points = vec![station(30.0, -9.0, 10.0), station(30.4, -9.6, 43.0)];
        let nearest = nearest_air_quality_point(30.4278, -9.5981, &points);
        assert_eq!(nearest.pm25, 43.0);
        assert_eq!(nearest.o3, 2.0);
    }

    #[test]
    fn test_nearest_station_ignores_longitude_scale() {
        // At 60°N, 0.9° east is ~50 km but 0.6° north is ~67 km.
        // Degree space still picks the northern station (0.6 < 0.9).
        let points = vec![station(60.0, 0.9, 1.0), station(60.6, 0.0, 2.0)];
        assert_eq!(nearest_air_quality_point(60.0, 0.0, &points).pm25, 2.0);
    }

    #[test]
    fn test_nearest_station_empty_is_zero() {
        assert_eq!(nearest_air_quality_point(0.0, 0.0, &[]), AirQualityReading::default());
    }
}
