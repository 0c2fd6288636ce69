//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator tile indices, plus east-west and north-south stepping
//! between neighbouring tiles.
//!
//! Stepping east or west wraps around the antimeridian. Stepping north or
//! south never wraps: the poles are hard edges and return `None`.

mod types;

pub use types::{
    unique_tiles, CoordError, GeoPoint, Tile, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Number of tiles spanning the world on each axis at `zoom`.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Converts geographic coordinates to a tile and the in-tile pixel offset.
///
/// # Arguments
///
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `zoom` - Zoom level (0 to 18)
///
/// # Errors
///
/// Fails on out-of-range input, or when the projected index falls outside
/// `[0, 2^zoom - 1]` (e.g. longitude exactly 180).
#[inline]
pub fn to_tile(lon: f64, lat: f64, zoom: u8) -> Result<Tile, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }

    let n = tiles_per_axis(zoom) as f64;

    let x_float = (lon + 180.0) / 360.0 * n;

    // ln(tan + sec) == asinh(tan)
    let lat_rad = lat.to_radians();
    let y_float = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;

    let (x, x_offset) = split_index(x_float, zoom)?;
    let (y, y_offset) = split_index(y_float, zoom)?;

    Ok(Tile {
        x,
        y,
        x_offset,
        y_offset,
    })
}

/// Converts a [`GeoPoint`] to a tile.
#[inline]
pub fn point_to_tile(point: &GeoPoint, zoom: u8) -> Result<Tile, CoordError> {
    to_tile(point.lon, point.lat, zoom)
}

/// Splits a fractional tile position into its index and pixel offset.
fn split_index(value: f64, zoom: u8) -> Result<(u32, u32), CoordError> {
    let floor = value.floor();
    let index = floor as i64;
    if index < 0 || index >= tiles_per_axis(zoom) as i64 {
        return Err(CoordError::TileOutOfRange { index, zoom });
    }
    let offset = (TILE_SIZE as f64 * (value - floor)).floor() as u32;
    Ok((index as u32, offset.min(TILE_SIZE - 1)))
}

/// Converts tile indices back to geographic coordinates.
///
/// Returns `(lat, lon)` of the tile's north-west corner.
#[inline]
pub fn tile_to_lat_lon(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = tiles_per_axis(zoom) as f64;

    let lon = x as f64 / n * 360.0 - 180.0;

    let lat_rad = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan();
    (lat_rad.to_degrees(), lon)
}

/// Next tile to the east, wrapping to 0 past the antimeridian.
#[inline]
pub fn inc_x(x: u32, zoom: u8) -> u32 {
    if x >= tiles_per_axis(zoom) - 1 {
        0
    } else {
        x + 1
    }
}

/// Next tile to the west, wrapping to `2^zoom - 1` past the antimeridian.
#[inline]
pub fn dec_x(x: u32, zoom: u8) -> u32 {
    if x == 0 {
        tiles_per_axis(zoom) - 1
    } else {
        x - 1
    }
}

/// Next tile to the south, or `None` at the south pole.
#[inline]
pub fn inc_y(y: u32, zoom: u8) -> Option<u32> {
    if y >= tiles_per_axis(zoom) - 1 {
        None
    } else {
        Some(y + 1)
    }
}

/// Next tile to the north, or `None` at the north pole.
#[inline]
pub fn dec_y(y: u32) -> Option<u32> {
    y.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_at_zoom_5() {
        let tile = to_tile(0.0, 0.0, 5).unwrap();
        assert_eq!(tile.x, 16);
        assert_eq!(tile.y, 16);
        assert_eq!(tile.x_offset, 0);
        assert_eq!(tile.y_offset, 0);
    }

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = to_tile(-74.0060, 40.7128, 16).unwrap();
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.x, 19295);
        assert!(tile.x_offset < TILE_SIZE);
        assert!(tile.y_offset < TILE_SIZE);
    }

    #[test]
    fn test_offset_reflects_position_in_tile() {
        // Three quarters of the way across tile 0 at zoom 0
        let tile = to_tile(90.0, 0.0, 0).unwrap();
        assert_eq!(tile.x, 0);
        assert_eq!(tile.x_offset, 192);
        assert_eq!(tile.y_offset, 128);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile(0.0, 90.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = to_tile(-181.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = to_tile(0.0, 0.0, MAX_ZOOM + 1);
        assert!(matches!(result, Err(CoordError::InvalidZoom(19))));
    }

    #[test]
    fn test_antimeridian_east_edge_is_out_of_range() {
        // lon = 180 projects to index 2^zoom, one past the last column
        let result = to_tile(180.0, 0.0, 4);
        assert!(matches!(
            result,
            Err(CoordError::TileOutOfRange { index: 16, zoom: 4 })
        ));
    }

    #[test]
    fn test_tile_to_lat_lon_northwest_corner() {
        let (lat, lon) = tile_to_lat_lon(19295, 24640, 16);

        assert!((lat - 40.713).abs() < 0.01, "Latitude should be close");
        assert!((lon - (-74.007)).abs() < 0.01, "Longitude should be close");
    }

    #[test]
    fn test_tile_to_lat_lon_world_corner() {
        let (lat, lon) = tile_to_lat_lon(0, 0, 0);
        assert!((lat - MAX_LAT).abs() < 1e-6);
        assert_eq!(lon, -180.0);
    }

    #[test]
    fn test_inc_dec_x_wraparound() {
        assert_eq!(inc_x(15, 4), 0);
        assert_eq!(dec_x(0, 4), 15);
        assert_eq!(inc_x(5, 4), 6);
        assert_eq!(dec_x(inc_x(5, 4), 4), 5);
    }

    #[test]
    fn test_zoom_zero_single_column_wraps_to_itself() {
        assert_eq!(inc_x(0, 0), 0);
        assert_eq!(dec_x(0, 0), 0);
    }

    #[test]
    fn test_inc_dec_y_stop_at_poles() {
        assert_eq!(dec_y(0), None);
        assert_eq!(inc_y(15, 4), None);
        assert_eq!(inc_y(14, 4), Some(15));
        assert_eq!(dec_y(1), Some(0));
    }

    #[test]
    fn test_tile_identity_ignores_offsets() {
        let a = Tile::new(3, 4, 10, 20);
        let b = Tile::new(3, 4, 200, 100);
        assert_eq!(a, b);

        let unique = unique_tiles(vec![a, b, Tile::new(3, 5, 0, 0)]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].x_offset, 10, "first occurrence is kept");
    }

    #[test]
    fn test_geo_point_parsing() {
        let point: GeoPoint = "151.177, -33.946".parse().unwrap();
        assert_eq!(point, GeoPoint::new(151.177, -33.946));

        assert!("151.177".parse::<GeoPoint>().is_err());
        assert!("abc,1".parse::<GeoPoint>().is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_roundtrip_within_one_tile(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile(lon, lat, zoom)?;
                let (converted_lat, converted_lon) = tile_to_lat_lon(tile.x, tile.y, zoom);

                let tile_size = 360.0 / (tiles_per_axis(zoom) as f64);

                prop_assert!(
                    (converted_lat - lat).abs() < tile_size,
                    "Latitude roundtrip failed: {} -> {} at zoom {}",
                    lat, converted_lat, zoom
                );
                prop_assert!(
                    (converted_lon - lon).abs() < tile_size,
                    "Longitude roundtrip failed: {} -> {} at zoom {}",
                    lon, converted_lon, zoom
                );
            }

            #[test]
            fn test_tile_indices_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile(lon, lat, zoom)?;
                let max_tile = tiles_per_axis(zoom);
                prop_assert!(tile.x < max_tile);
                prop_assert!(tile.y < max_tile);
                prop_assert!(tile.x_offset < TILE_SIZE);
                prop_assert!(tile.y_offset < TILE_SIZE);
            }

            #[test]
            fn test_inc_dec_x_are_inverses(x_raw in 0u32..262_144, zoom in 0u8..=18) {
                let x = x_raw % tiles_per_axis(zoom);
                prop_assert_eq!(dec_x(inc_x(x, zoom), zoom), x);
                prop_assert_eq!(inc_x(dec_x(x, zoom), zoom), x);
            }

            #[test]
            fn test_reject_invalid_latitude(
                lat in 85.06..90.0_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                prop_assert!(matches!(
                    to_tile(lon, lat, zoom),
                    Err(CoordError::InvalidLatitude(_))
                ));
            }
        }
    }
}
