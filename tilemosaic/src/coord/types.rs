//! Coordinate type definitions

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels supported by the tile server.
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 18;

/// Width and height of a single server tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// A geographic point in degrees, longitude first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lon, self.lat)
    }
}

impl FromStr for GeoPoint {
    type Err = CoordError;

    /// Parses `"lon,lat"`, tolerating whitespace around either value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lon, lat) = s
            .split_once(',')
            .ok_or_else(|| CoordError::InvalidPoint(s.to_string()))?;
        let lon = lon
            .trim()
            .parse::<f64>()
            .map_err(|_| CoordError::InvalidPoint(s.to_string()))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| CoordError::InvalidPoint(s.to_string()))?;
        Ok(Self { lon, lat })
    }
}

/// A tile in the slippy-map scheme plus the pixel offset of the
/// coordinate that produced it.
///
/// Identity is the `(x, y)` index pair only: two coordinates landing in the
/// same tile at different pixel offsets compare equal.
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    /// Column (west to east)
    pub x: u32,
    /// Row (north to south)
    pub y: u32,
    /// Pixel column of the source coordinate inside the tile
    pub x_offset: u32,
    /// Pixel row of the source coordinate inside the tile
    pub y_offset: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, x_offset: u32, y_offset: u32) -> Self {
        Self {
            x,
            y,
            x_offset,
            y_offset,
        }
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for Tile {}

impl Hash for Tile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
    }
}

/// De-duplicates tiles by index, keeping the first occurrence of each.
pub fn unique_tiles<I: IntoIterator<Item = Tile>>(tiles: I) -> Vec<Tile> {
    let mut seen = HashSet::new();
    tiles.into_iter().filter(|t| seen.insert(*t)).collect()
}

/// Errors that can occur during coordinate conversion
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 18)
    InvalidZoom(u8),
    /// Projected tile index does not exist at this zoom level
    TileOutOfRange { index: i64, zoom: u8 },
    /// Text could not be parsed as `lon,lat`
    InvalidPoint(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::TileOutOfRange { index, zoom } => {
                write!(
                    f,
                    "Tile index {} out of range at zoom {} (max {})",
                    index,
                    zoom,
                    (1u64 << zoom) - 1
                )
            }
            CoordError::InvalidPoint(text) => {
                write!(f, "Invalid point '{}' (expected lon,lat)", text)
            }
        }
    }
}

impl std::error::Error for CoordError {}
