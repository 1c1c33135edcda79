//! NASA GIBS map tile URLs for the flood and vegetation layers.

use chrono::{NaiveDate, Utc};

const GIBS_BASE: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best";
const TILE_MATRIX: &str = "GoogleMapsCompatible_Level6";

fn date_or_today(date: Option<NaiveDate>) -> String {
    date.unwrap_or_else(|| Utc::now().date_naive())
        .format("%Y-%m-%d")
        .to_string()
}

/// GPM IMERG precipitation-rate tile.
pub fn flood_tile_url(z: u32, x: u32, y: u32, date: Option<NaiveDate>) -> String {
    format!(
        "{GIBS_BASE}/GPM_Precipitation_Rate_IMERG/default/{}T00:00:00Z/{TILE_MATRIX}/{z}/{y}/{x}.png",
        date_or_today(date)
    )
}

/// MODIS Terra 8-day NDVI tile.
pub fn ndvi_tile_url(z: u32, x: u32, y: u32, date: Option<NaiveDate>) -> String {
    format!(
        "{GIBS_BASE}/MODIS_Terra_NDVI_8Day/default/{}/{TILE_MATRIX}/{z}/{y}/{x}.png",
        date_or_today(date)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2026, 10, 17)
    }

    #[test]
    fn test_flood_tile_url() {
        assert_eq!(
            flood_tile_url(5, 15, 12, day()),
            "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/GPM_Precipitation_Rate_IMERG/default/2026-10-17T00:00:00Z/GoogleMapsCompatible_Level6/5/12/15.png"
        );
    }

    #[test]
    fn test_ndvi_tile_url() {
        assert_eq!(
            ndvi_tile_url(5, 15, 12, day()),
            "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best/MODIS_Terra_NDVI_8Day/default/2026-10-17/GoogleMapsCompatible_Level6/5/12/15.png"
        );
    }

    #[test]
    fn test_default_date_is_today() {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert!(ndvi_tile_url(1, 0, 0, None).contains(&today));
    }
}
