//! Zoom level selection.
//!
//! Finds the most detailed zoom level at which the bounding box of a set of
//! coordinates still fits a tile budget.

use thiserror::Error;
use tracing::{debug, warn};

use crate::bbox::{compute_bounding_box, BoundingBox, BoundingBoxError};
use crate::coord::{point_to_tile, unique_tiles, CoordError, GeoPoint, Tile, MAX_ZOOM};

/// First zoom level tried by [`select_optimal_zoom`].
pub const MIN_SEARCH_ZOOM: u8 = 2;

/// Errors from zoom level selection.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ZoomError {
    /// No coordinates were supplied.
    #[error("No coordinates supplied")]
    NoCoordinates,

    /// A coordinate could not be converted to a tile.
    #[error("Coordinate {point} cannot be tiled at zoom {zoom}: {source}")]
    Coordinate {
        point: GeoPoint,
        zoom: u8,
        #[source]
        source: CoordError,
    },

    /// Coordinates were tiled but produced no tiles.
    #[error("Coordinates produced no tiles at zoom {0}")]
    NoTiles(u8),

    /// Bounding box computation failed.
    #[error(transparent)]
    BoundingBox(#[from] BoundingBoxError),

    /// Even the least detailed zoom level exceeds the budget.
    #[error("No zoom level between {min} and {max} fits {width}x{height} tiles")]
    NoZoomFits {
        min: u8,
        max: u8,
        width: usize,
        height: usize,
    },
}

/// Tile budget and zoom cap for a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomConstraints {
    pub max_tiles_width: usize,
    pub max_tiles_height: usize,
    pub max_zoom: u8,
    pub trim_margin: u32,
}

/// Converts every point to a tile at `zoom` and de-duplicates the result.
///
/// Fails on the first point that cannot be tiled.
pub fn tiles_for_points(points: &[GeoPoint], zoom: u8) -> Result<Vec<Tile>, ZoomError> {
    let tiles = points
        .iter()
        .map(|point| {
            point_to_tile(point, zoom).map_err(|source| ZoomError::Coordinate {
                point: *point,
                zoom,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let tiles = unique_tiles(tiles);
    if tiles.is_empty() {
        warn!(zoom, points = points.len(), "Coordinates produced no tiles");
        return Err(ZoomError::NoTiles(zoom));
    }
    Ok(tiles)
}

/// Bounding box of `points` at `zoom`.
pub fn bounding_box_for_points(
    points: &[GeoPoint],
    zoom: u8,
    trim_margin: u32,
) -> Result<BoundingBox, ZoomError> {
    if points.is_empty() {
        return Err(ZoomError::NoCoordinates);
    }
    let tiles = tiles_for_points(points, zoom)?;
    Ok(compute_bounding_box(&tiles, zoom, trim_margin)?)
}

/// Returns the highest zoom level whose bounding box fits the budget.
///
/// Searches from [`MIN_SEARCH_ZOOM`] upward and stops at the first level that
/// exceeds the budget, or once `max_zoom` (capped at [`MAX_ZOOM`]) has
/// been tried. A `max_zoom` below [`MIN_SEARCH_ZOOM`] is the only level
/// tried.
pub fn select_optimal_zoom(
    points: &[GeoPoint],
    constraints: &ZoomConstraints,
) -> Result<u8, ZoomError> {
    if points.is_empty() {
        return Err(ZoomError::NoCoordinates);
    }

    let max_zoom = constraints.max_zoom.min(MAX_ZOOM);
    // A cap below the usual starting level is tried on its own
    let min_zoom = MIN_SEARCH_ZOOM.min(max_zoom);
    let mut last_valid: Option<u8> = None;

    for zoom in min_zoom..=max_zoom {
        let bbox = bounding_box_for_points(points, zoom, constraints.trim_margin)?;
        let fits = bbox.width() <= constraints.max_tiles_width
            && bbox.height() <= constraints.max_tiles_height;

        debug!(
            zoom,
            width = bbox.width(),
            height = bbox.height(),
            fits,
            "Tried zoom level"
        );

        if !fits {
            break;
        }
        last_valid = Some(zoom);
    }

    last_valid.ok_or(ZoomError::NoZoomFits {
        min: min_zoom,
        max: max_zoom,
        width: constraints.max_tiles_width,
        height: constraints.max_tiles_height,
    })
}
