//! Domain types shared across the engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ── Geography ─────────────────────────────────────────────────────────

/// Axis-aligned rectangle in longitude/latitude degrees.
///
/// `min <= max` on both axes is the caller's responsibility; the parser
/// only checks shape and numeric validity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Box of `half_width_deg` degrees on every side of a point.
    pub fn around(lat: f64, lon: f64, half_width_deg: f64) -> Self {
        Self {
            min_lon: lon - half_width_deg,
            min_lat: lat - half_width_deg,
            max_lon: lon + half_width_deg,
            max_lat: lat + half_width_deg,
        }
    }

    /// Decode `minLon,minLat,maxLon,maxLat`.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() != 4 {
            return Err(invalid_bbox(raw));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid_bbox(raw))?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    /// Inclusive containment on both axes.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Center point as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

fn invalid_bbox(raw: &str) -> Error {
    Error::InvalidInput(format!(
        "Invalid bbox format '{raw}'. Expected: minLon,minLat,maxLon,maxLat"
    ))
}

impl FromStr for BoundingBox {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Parse a decimal-degree coordinate supplied by a caller.
pub fn parse_coordinate(raw: &str, name: &str) -> Result<f64, Error> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidInput(format!("{name} must be a valid number, got '{raw}'")))
}

/// A `{lat, lon}` echo used in result envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

// ── Adapter results ───────────────────────────────────────────────────

/// Outcome of an adapter fetch.
///
/// Adapters never fail: an upstream problem yields `Fallback` carrying the
/// adapter's fixed synthetic dataset instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    /// Real upstream data, either just fetched or served from cache.
    Fresh(T),
    /// Synthetic data substituted because the upstream call failed.
    Fallback(T),
}

impl<T> Sourced<T> {
    pub fn data(&self) -> &T {
        match self {
            Sourced::Fresh(data) | Sourced::Fallback(data) => data,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Fresh(data) | Sourced::Fallback(data) => data,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback(_))
    }

    /// Transform the payload, keeping the provenance tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        match self {
            Sourced::Fresh(data) => Sourced::Fresh(f(data)),
            Sourced::Fallback(data) => Sourced::Fallback(f(data)),
        }
    }
}

// ── Weather ───────────────────────────────────────────────────────────

/// Current conditions plus a daily forecast, keyed the way Open-Meteo
/// names its variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    #[serde(default)]
    pub current: CurrentWeather,
    #[serde(default)]
    pub daily: DailyForecast,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// °C
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    /// %
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    /// mm
    #[serde(default)]
    pub precipitation: Option<f64>,
    /// km/h
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
}

/// Daily arrays indexed by day offset (0 = today).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
}

fn day_value(values: &[Option<f64>], day: usize) -> Option<f64> {
    values.get(day).copied().flatten()
}

impl DailyForecast {
    pub fn max_temperature(&self, day: usize) -> Option<f64> {
        day_value(&self.temperature_2m_max, day)
    }

    pub fn min_temperature(&self, day: usize) -> Option<f64> {
        day_value(&self.temperature_2m_min, day)
    }

    pub fn precipitation_sum(&self, day: usize) -> Option<f64> {
        day_value(&self.precipitation_sum, day)
    }

    pub fn precipitation_probability(&self, day: usize) -> Option<f64> {
        day_value(&self.precipitation_probability_max, day)
    }

    /// Rainfall totals for the first `days` days, missing days as 0 mm.
    pub fn rainfall_forecast(&self, days: usize) -> Vec<f64> {
        (0..days)
            .map(|day| self.precipitation_sum(day).unwrap_or(0.0))
            .collect()
    }
}

// ── Air quality ───────────────────────────────────────────────────────

/// Latest pollutant readings at one monitoring station (µg/m³).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityPoint {
    pub lat: f64,
    pub lon: f64,
    pub pm25: f64,
    pub no2: f64,
    pub o3: f64,
    #[serde(rename = "location")]
    pub location_name: String,
    #[serde(rename = "timestamp")]
    pub observed_at: String,
}

/// Pollutant readings attributed to a query point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    pub pm25: f64,
    pub no2: f64,
    pub o3: f64,
}

impl From<&AirQualityPoint> for AirQualityReading {
    fn from(point: &AirQualityPoint) -> Self {
        Self {
            pm25: point.pm25,
            no2: point.no2,
            o3: point.o3,
        }
    }
}

/// Properties carried by each air-quality GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityProperties {
    pub location: String,
    pub pm25: f64,
    pub no2: f64,
    pub o3: f64,
    pub timestamp: String,
}

/// Render station points as a GeoJSON collection.
pub fn air_quality_features(points: &[AirQualityPoint]) -> FeatureCollection<AirQualityProperties> {
    FeatureCollection {
        features: points
            .iter()
            .map(|p| {
                Feature::point(
                    p.lon,
                    p.lat,
                    AirQualityProperties {
                        location: p.location_name.clone(),
                        pm25: p.pm25,
                        no2: p.no2,
                        o3: p.o3,
                        timestamp: p.observed_at.clone(),
                    },
                )
            })
            .collect(),
    }
}

// ── Fire detections ───────────────────────────────────────────────────

/// Satellite hotspot attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireProperties {
    pub brightness: f64,
    pub confidence: String,
    pub acq_date: String,
    pub acq_time: String,
}

/// One active-fire detection: a point feature with hotspot properties.
pub type FireDetection = Feature<FireProperties>;

/// All detections inside a queried bbox.
pub type FireCollection = FeatureCollection<FireProperties>;

// ── GeoJSON ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Point")]
pub struct PointGeometry {
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature<P> {
    pub geometry: PointGeometry,
    pub properties: P,
}

impl<P> Feature<P> {
    pub fn point(lon: f64, lat: f64, properties: P) -> Self {
        Self {
            geometry: PointGeometry {
                coordinates: [lon, lat],
            },
            properties,
        }
    }

    pub fn lon(&self) -> f64 {
        self.geometry.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.geometry.coordinates[1]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection<P> {
    pub features: Vec<Feature<P>>,
}

impl<P> FeatureCollection<P> {
    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self::empty()
    }
}

/// ISO-8601 timestamp with millisecond precision, as used in envelopes.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox: BoundingBox = "10,20,30,40".parse().expect("valid bbox");
        assert_eq!(bbox, BoundingBox::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_parse_bbox_negative_and_spaced() {
        let bbox = BoundingBox::parse("-9.7, 30.3, -9.5, 30.5").expect("valid bbox");
        assert_eq!(bbox.min_lon, -9.7);
        assert_eq!(bbox.max_lat, 30.5);
    }

    #[test]
    fn test_parse_bbox_wrong_count() {
        let err = BoundingBox::parse("1,2,3").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(BoundingBox::parse("1,2,3,4,5").is_err());
    }

    #[test]
    fn test_parse_bbox_non_numeric() {
        let err = BoundingBox::parse("a,b,c,d").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(BoundingBox::parse("1,2,NaN,4").is_err());
    }

    #[test]
    fn test_parse_bbox_accepts_out_of_range() {
        // No range validation is performed.
        let bbox = BoundingBox::parse("-500,95,500,-95").expect("shape is valid");
        assert_eq!(bbox.min_lon, -500.0);
    }

    #[test]
    fn test_bbox_contains_is_inclusive() {
        let bbox = BoundingBox::new(-10.0, 30.0, -9.0, 31.0);
        assert!(bbox.contains(30.0, -10.0));
        assert!(bbox.contains(31.0, -9.0));
        assert!(!bbox.contains(31.01, -9.5));
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("30.4278", "lat").unwrap(), 30.4278);
        assert!(parse_coordinate("north", "lat").unwrap_err().is_invalid_input());
        assert!(parse_coordinate("", "lon").is_err());
    }

    #[test]
    fn test_rainfall_forecast_fills_missing_days() {
        let daily = DailyForecast {
            precipitation_sum: vec![Some(12.0), None],
            ..Default::default()
        };
        assert_eq!(daily.rainfall_forecast(3), vec![12.0, 0.0, 0.0]);
    }

    #[test]
    fn test_feature_collection_geojson_shape() {
        let fires: FireCollection = FeatureCollection {
            features: vec![Feature::point(
                -9.55,
                30.45,
                FireProperties {
                    brightness: 325.5,
                    confidence: "high".into(),
                    acq_date: "2026-10-17".into(),
                    acq_time: "1430".into(),
                },
            )],
        };

        let value = serde_json::to_value(&fires).expect("serializes");
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["geometry"]["type"], "Point");
        assert_eq!(value["features"][0]["geometry"]["coordinates"][0], -9.55);
        assert_eq!(value["features"][0]["properties"]["acq_time"], "1430");

        let back: FireCollection = serde_json::from_value(value).expect("deserializes");
        assert_eq!(back.features[0].lat(), 30.45);
    }

    #[test]
    fn test_sourced_accessors() {
        let fresh = Sourced::Fresh(3);
        let fallback = Sourced::Fallback(4);
        assert!(!fresh.is_fallback());
        assert!(fallback.is_fallback());
        assert_eq!(*fresh.data(), 3);
        assert_eq!(fallback.into_inner(), 4);
        assert_eq!(Sourced::Fallback(2).map(|v| v * 10), Sourced::Fallback(20));
    }
}
