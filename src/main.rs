//! earthguard: environmental hazard risk engine.
//!
//! Single-binary Tokio CLI that:
//! 1. Parses a point (`--lat/--lon`) or a bounding box (`--bbox`)
//! 2. Fetches weather, air quality and fire detections (with fallbacks)
//! 3. Scores flood, fire, heat, air and vegetation risk
//! 4. Prints the result as one JSON document on stdout

mod config;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use common::{parse_coordinate, BoundingBox, Error};
use risk_engine::{flood_tile_url, ndvi_tile_url, RiskEngine};

const DEFAULT_LOG_FILTER: &str = "earthguard=info,risk_engine=info,open_meteo_client=info,\
air_quality_client=info,firms_client=info";

/// Environmental hazard risk engine
#[derive(Parser)]
#[command(name = "earthguard", about = "Flood, fire, heat and air-quality risk scoring")]
struct Cli {
    /// TOML config file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct PointArgs {
    /// Latitude in decimal degrees.
    #[arg(long, allow_hyphen_values = true)]
    lat: String,

    /// Longitude in decimal degrees.
    #[arg(long, allow_hyphen_values = true)]
    lon: String,
}

impl PointArgs {
    fn parse(&self) -> Result<(f64, f64), Error> {
        Ok((
            parse_coordinate(&self.lat, "lat")?,
            parse_coordinate(&self.lon, "lon")?,
        ))
    }
}

#[derive(Args)]
struct BboxArgs {
    /// minLon,minLat,maxLon,maxLat
    #[arg(long, allow_hyphen_values = true)]
    bbox: String,
}

impl BboxArgs {
    fn parse(&self) -> Result<BoundingBox, Error> {
        BoundingBox::parse(&self.bbox)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Current conditions and 7-day forecast at a point.
    Weather(PointArgs),
    /// Air-quality stations inside a bbox, as GeoJSON.
    Air {
        #[command(flatten)]
        area: BboxArgs,
        /// Pollutants to request (default: pm25).
        #[arg(long, value_delimiter = ',')]
        parameters: Vec<String>,
    },
    /// Active fire detections inside a bbox, as GeoJSON.
    Fires(BboxArgs),
    /// Composite hazard summary with suggestions.
    Risk(PointArgs),
    /// Fire risk assessment, spread estimate and danger index.
    FireRisk(PointArgs),
    /// Flood risk assessment.
    Flood(PointArgs),
    /// NDVI, oxygen estimate and tree recommendation.
    Vegetation(PointArgs),
    /// Tree-planting priority at a point.
    PlantingPriority {
        #[command(flatten)]
        point: PointArgs,
        /// Air temperature in °C (default 25).
        #[arg(long, allow_hyphen_values = true)]
        temp: Option<String>,
        /// PM2.5 in µg/m³ (default 0).
        #[arg(long)]
        pm25: Option<String>,
    },
    /// Hazard alerts for a region.
    Alerts(BboxArgs),
    /// Nearest WAQI station reading (requires WAQI_TOKEN).
    Aqi(PointArgs),
    /// NASA GIBS tile URL for a map layer.
    TileUrl {
        #[arg(long, value_enum)]
        layer: TileLayer,
        #[arg(long)]
        z: u32,
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
        /// YYYY-MM-DD (default: today, UTC).
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TileLayer {
    /// GPM IMERG precipitation rate.
    Flood,
    /// MODIS Terra 8-day NDVI.
    Ndvi,
}

fn parse_optional_number(raw: Option<&str>, name: &str) -> Result<Option<f64>, Error> {
    raw.map(|r| parse_coordinate(r, name)).transpose()
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, Error> {
    raw.map(|r| {
        NaiveDate::parse_from_str(r.trim(), "%Y-%m-%d")
            .map_err(|_| Error::InvalidInput(format!("date must be YYYY-MM-DD, got '{r}'")))
    })
    .transpose()
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only the JSON document.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(if e.is_invalid_input() { 2 } else { 1 });
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    // Tile URLs need neither config nor the engine.
    if let Command::TileUrl {
        layer,
        z,
        x,
        y,
        date,
    } = &cli.command
    {
        let date = parse_date(date.as_deref())?;
        let url = match layer {
            TileLayer::Flood => flood_tile_url(*z, *x, *y, date),
            TileLayer::Ndvi => ndvi_tile_url(*z, *x, *y, date),
        };
        return print_json(&json!({ "url": url }), cli.pretty);
    }

    let cfg = config::load_config(cli.config.as_deref())?;
    info!(
        "Reference point: ({}, {}), search radius {}°, fire radius {} km",
        cfg.region.reference_lat,
        cfg.region.reference_lon,
        cfg.region.search_radius_deg,
        cfg.region.fire_radius_km
    );
    let engine = RiskEngine::new(cfg)?;

    let output: Value = match &cli.command {
        Command::Weather(point) => {
            let (lat, lon) = point.parse()?;
            serde_json::to_value(engine.weather(lat, lon).await.into_inner())?
        }
        Command::Air { area, parameters } => {
            let bbox = area.parse()?;
            let parameters: Vec<String> = parameters
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            serde_json::to_value(engine.air_points(&bbox, &parameters).await.into_inner())?
        }
        Command::Fires(area) => {
            let bbox = area.parse()?;
            serde_json::to_value(engine.fires(&bbox).await.into_inner())?
        }
        Command::Risk(point) => {
            let (lat, lon) = point.parse()?;
            serde_json::to_value(engine.risk_summary(lat, lon).await)?
        }
        Command::FireRisk(point) => {
            let (lat, lon) = point.parse()?;
            serde_json::to_value(engine.fire_risk(lat, lon).await)?
        }
        Command::Flood(point) => {
            let (lat, lon) = point.parse()?;
            serde_json::to_value(engine.flood_risk(lat, lon).await)?
        }
        Command::Vegetation(point) => {
            let (lat, lon) = point.parse()?;
            serde_json::to_value(engine.vegetation(lat, lon))?
        }
        Command::PlantingPriority { point, temp, pm25 } => {
            let (lat, lon) = point.parse()?;
            let temp = parse_optional_number(temp.as_deref(), "temp")?;
            let pm25 = parse_optional_number(pm25.as_deref(), "pm25")?;
            serde_json::to_value(engine.planting_priority(lat, lon, temp, pm25))?
        }
        Command::Alerts(area) => {
            let bbox = area.parse()?;
            serde_json::to_value(engine.alerts(&bbox).await)?
        }
        Command::Aqi(point) => {
            let (lat, lon) = point.parse()?;
            match engine.station_aqi(lat, lon).await {
                Some(report) => serde_json::to_value(report)?,
                None => {
                    warn!("No WAQI reading for ({}, {})", lat, lon);
                    Value::Null
                }
            }
        }
        Command::TileUrl { .. } => unreachable!("handled before engine construction"),
    };

    print_json(&output, cli.pretty)
}

fn print_json(value: &Value, pretty: bool) -> Result<(), Error> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
