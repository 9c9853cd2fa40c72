// Slippy map tile math (Web Mercator, EPSG:3857 tiling over WGS84 degrees).
// https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

use crate::cache_keys::{make_tile_key, parse_tile_key};
use crate::error::{Result, TilePickError};

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Highest zoom level accepted for a `TileAddress`
pub const MAX_ZOOM: u32 = 30;

#[inline]
fn tiles_per_edge(zoom: u32) -> f64 {
    2.0_f64.powi(zoom as i32)
}

// Convert longitude to fractional tile X coordinate
pub fn lon_to_tile_x_frac(lon: f64, zoom: u32) -> f64 {
    (lon + 180.0) / 360.0 * tiles_per_edge(zoom)
}

// Convert latitude to fractional tile Y coordinate
pub fn lat_to_tile_y_frac(lat: f64, zoom: u32) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * tiles_per_edge(zoom)
}

/// Tile column containing `lon`. Negative results saturate to 0.
pub fn lon_to_tile_x(lon: f64, zoom: u32) -> u32 {
    lon_to_tile_x_frac(lon, zoom).floor() as u32
}

/// Tile row containing `lat`. Negative results saturate to 0.
pub fn lat_to_tile_y(lat: f64, zoom: u32) -> u32 {
    lat_to_tile_y_frac(lat, zoom).floor() as u32
}

/// Longitude of the western edge of (possibly fractional) tile column `x`.
pub fn tile_x_to_lon(x: f64, zoom: u32) -> f64 {
    x / tiles_per_edge(zoom) * 360.0 - 180.0
}

/// Latitude of the northern edge of (possibly fractional) tile row `y`.
pub fn tile_y_to_lat(y: f64, zoom: u32) -> f64 {
    let n = PI - 2.0 * PI * y / tiles_per_edge(zoom);
    // sinh(n) = (e^n - e^-n) / 2
    let sinh_n = (n.exp() - (-n).exp()) / 2.0;
    sinh_n.atan().to_degrees()
}

/// A tile in the standard slippy scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileAddress {
    pub zoom: u32,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    /// Builds an address, rejecting coordinates outside `[0, 2^zoom)`.
    pub fn new(zoom: u32, x: u32, y: u32) -> Result<Self> {
        let limit = 1u64 << zoom.min(MAX_ZOOM + 1);
        if zoom > MAX_ZOOM || u64::from(x) >= limit || u64::from(y) >= limit {
            return Err(TilePickError::InvalidTile { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// Geographic footprint of the tile.
    pub fn bounds(&self) -> Rect<f64> {
        let (x, y) = (f64::from(self.x), f64::from(self.y));
        Rect::new(
            coord! { x: tile_x_to_lon(x, self.zoom), y: tile_y_to_lat(y + 1.0, self.zoom) },
            coord! { x: tile_x_to_lon(x + 1.0, self.zoom), y: tile_y_to_lat(y, self.zoom) },
        )
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&make_tile_key(self.zoom, self.x, self.y))
    }
}

impl FromStr for TileAddress {
    type Err = TilePickError;

    fn from_str(s: &str) -> Result<Self> {
        let (zoom, x, y) = parse_tile_key(s)?;
        Self::new(zoom, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_lon_roundtrip() {
        for zoom in [0, 1, 5, 12, 18, 24] {
            for lon in [-180.0, -122.4194, -0.1278, 0.0, 13.4050, 139.6917, 179.999] {
                let x = lon_to_tile_x_frac(lon, zoom);
                let back = tile_x_to_lon(x, zoom);
                assert!(
                    (back - lon).abs() < TOLERANCE,
                    "zoom {}: lon {} came back as {}",
                    zoom,
                    lon,
                    back
                );
            }
        }
    }

    #[test]
    fn test_lat_roundtrip() {
        for zoom in [0, 1, 5, 12, 18, 24] {
            for lat in [-85.0, -33.8688, 0.0, 35.6762, 51.5074, 85.0] {
                let y = lat_to_tile_y_frac(lat, zoom);
                let back = tile_y_to_lat(y, zoom);
                assert!(
                    (back - lat).abs() < TOLERANCE,
                    "zoom {}: lat {} came back as {}",
                    zoom,
                    lat,
                    back
                );
            }
        }
    }

    #[test]
    fn test_integer_tiles_new_york() {
        // New York City: 40.7128N, 74.0060W
        assert_eq!(lon_to_tile_x(-74.0060, 16), 19295);
        assert_eq!(lat_to_tile_y(40.7128, 16), 24640);
        assert_eq!(lon_to_tile_x(0.0, 1), 1);
        assert_eq!(lat_to_tile_y(0.0, 1), 1);
    }

    #[test]
    fn test_tile_edges() {
        assert!((tile_x_to_lon(0.0, 3) + 180.0).abs() < TOLERANCE);
        assert!((tile_x_to_lon(8.0, 3) - 180.0).abs() < TOLERANCE);
        assert!((tile_y_to_lat(0.0, 0) - MAX_LAT).abs() < 1e-6);
        assert!((tile_y_to_lat(1.0, 0) - MIN_LAT).abs() < 1e-6);
        assert!(tile_y_to_lat(0.5, 0).abs() < TOLERANCE);
    }

    #[test]
    fn test_tile_address_validation() {
        assert!(TileAddress::new(0, 0, 0).is_ok());
        assert!(TileAddress::new(3, 7, 7).is_ok());
        assert!(matches!(
            TileAddress::new(3, 8, 0),
            Err(TilePickError::InvalidTile { zoom: 3, x: 8, y: 0 })
        ));
        assert!(TileAddress::new(MAX_ZOOM + 1, 0, 0).is_err());
    }

    #[test]
    fn test_tile_address_key_roundtrip() {
        let tile: TileAddress = "14-14552-6451".parse().unwrap();
        assert_eq!(tile, TileAddress { zoom: 14, x: 14552, y: 6451 });
        assert_eq!(tile.to_string(), "14-14552-6451");
        assert!("2-4-0".parse::<TileAddress>().is_err());
    }

    #[test]
    fn test_bounds_contain_position() {
        let (lon, lat) = (139.7671, 35.6812);
        let tile = TileAddress::new(16, lon_to_tile_x(lon, 16), lat_to_tile_y(lat, 16)).unwrap();
        let bounds = tile.bounds();
        assert!(bounds.min().x <= lon && lon < bounds.max().x);
        assert!(bounds.min().y < lat && lat <= bounds.max().y);
    }
}
