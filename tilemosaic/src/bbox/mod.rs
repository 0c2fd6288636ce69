//! Tile bounding boxes.
//!
//! A [`BoundingBox`] is the smallest rectangular set of tile indices that
//! covers a set of tiles. The X axis may wrap across the antimeridian, in
//! which case it rises to `2^zoom - 1` and continues from `0`. The Y axis
//! never wraps and is always contiguous.
//!
//! After covering every tile, [`compute_bounding_box`] runs an edge-trim pass
//! that grows the box by one tile on any edge where a source coordinate sits
//! within the trim margin of the boundary, so no plotted point ends up flush
//! against the edge of the assembled image.

use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::coord::{dec_x, dec_y, inc_x, inc_y, tiles_per_axis, Tile, MAX_ZOOM, TILE_SIZE};

/// Default distance in pixels a coordinate must keep from the box edge.
pub const DEFAULT_TRIM_MARGIN_PIXELS: u32 = 20;

/// Errors raised while computing a bounding box.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoundingBoxError {
    /// No tiles were supplied.
    #[error("Cannot compute a bounding box from an empty tile set")]
    EmptyTiles,

    /// Zoom level beyond the supported range.
    #[error("Invalid zoom level: {0}")]
    InvalidZoom(u8),
}

/// Ordered tile indices on each axis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x_axis: Vec<u32>,
    pub y_axis: Vec<u32>,
}

impl BoundingBox {
    pub fn new(x_axis: Vec<u32>, y_axis: Vec<u32>) -> Self {
        Self { x_axis, y_axis }
    }

    /// A box covering exactly one tile.
    pub fn single(x: u32, y: u32) -> Self {
        Self {
            x_axis: vec![x],
            y_axis: vec![y],
        }
    }

    /// Width in tiles.
    pub fn width(&self) -> usize {
        self.x_axis.len()
    }

    /// Height in tiles.
    pub fn height(&self) -> usize {
        self.y_axis.len()
    }

    /// Total number of tiles covered.
    pub fn tile_count(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_square(&self) -> bool {
        self.width() == self.height()
    }

    /// True when the X axis crosses the antimeridian.
    pub fn wraps_antimeridian(&self) -> bool {
        self.x_axis.windows(2).any(|pair| pair[1] < pair[0])
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.x_axis.contains(&x) && self.y_axis.contains(&y)
    }

    fn first_x(&self) -> u32 {
        self.x_axis[0]
    }

    fn last_x(&self) -> u32 {
        self.x_axis[self.x_axis.len() - 1]
    }

    fn first_y(&self) -> u32 {
        self.y_axis[0]
    }

    fn last_y(&self) -> u32 {
        self.y_axis[self.y_axis.len() - 1]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{X:{:?}, Y:{:?}}}", self.x_axis, self.y_axis)
    }
}

/// Computes the bounding box of `tiles` at `zoom`, including the edge-trim pass.
///
/// # Errors
///
/// Returns [`BoundingBoxError::EmptyTiles`] when `tiles` is empty.
pub fn compute_bounding_box(
    tiles: &[Tile],
    zoom: u8,
    trim_margin: u32,
) -> Result<BoundingBox, BoundingBoxError> {
    if zoom > MAX_ZOOM {
        return Err(BoundingBoxError::InvalidZoom(zoom));
    }
    let (first, rest) = tiles.split_first().ok_or(BoundingBoxError::EmptyTiles)?;

    let mut x_axis: VecDeque<u32> = VecDeque::from([first.x]);
    let mut y_axis: VecDeque<u32> = VecDeque::from([first.y]);

    for tile in rest {
        extend_y(&mut y_axis, tile.y);
        extend_x(&mut x_axis, tile.x, zoom);
    }

    let mut bbox = BoundingBox {
        x_axis: x_axis.into(),
        y_axis: y_axis.into(),
    };
    trim_edges(&mut bbox, tiles, zoom, trim_margin);

    trace!(zoom, bbox = %bbox, tiles = tiles.len(), "Computed bounding box");
    Ok(bbox)
}

/// Grows the Y axis north or south until it includes `y`.
fn extend_y(y_axis: &mut VecDeque<u32>, y: u32) {
    let north = y_axis[0];
    let south = y_axis[y_axis.len() - 1];

    if y < north {
        for row in (y..north).rev() {
            y_axis.push_front(row);
        }
    } else if y > south {
        for row in south + 1..=y {
            y_axis.push_back(row);
        }
    }
}

/// Grows the X axis east or west, whichever is shorter, until it includes `x`.
///
/// Ties extend east. Distances are measured around the globe so an axis can
/// cross the antimeridian.
fn extend_x(x_axis: &mut VecDeque<u32>, x: u32, zoom: u8) {
    if x_axis.contains(&x) {
        return;
    }

    let n = tiles_per_axis(zoom);
    let west = x_axis[0];
    let east = x_axis[x_axis.len() - 1];

    let distance_east = (x + n - east) % n;
    let distance_west = (west + n - x) % n;

    if distance_east <= distance_west {
        let mut column = east;
        while column != x {
            column = inc_x(column, zoom);
            x_axis.push_back(column);
        }
    } else {
        let mut column = west;
        while column != x {
            column = dec_x(column, zoom);
            x_axis.push_front(column);
        }
    }
}

/// Extends each edge by one tile when a coordinate on that edge sits within
/// `margin` pixels of it.
///
/// Each edge grows at most once: after it moves, the tiles that triggered
/// it are no longer on the edge.
fn trim_edges(bbox: &mut BoundingBox, tiles: &[Tile], zoom: u8, margin: u32) {
    let far_limit = TILE_SIZE.saturating_sub(margin);
    let world_width = tiles_per_axis(zoom) as usize;

    for tile in tiles {
        if tile.y == bbox.first_y() && tile.y_offset < margin {
            if let Some(north) = dec_y(bbox.first_y()) {
                bbox.y_axis.insert(0, north);
            }
        }

        if tile.y == bbox.last_y() && tile.y_offset >= far_limit {
            if let Some(south) = inc_y(bbox.last_y(), zoom) {
                bbox.y_axis.push(south);
            }
        }

        if bbox.width() < world_width && tile.x == bbox.first_x() && tile.x_offset < margin {
            let west = dec_x(bbox.first_x(), zoom);
            bbox.x_axis.insert(0, west);
        }

        if bbox.width() < world_width && tile.x == bbox.last_x() && tile.x_offset >= far_limit {
            let east = inc_x(bbox.last_x(), zoom);
            bbox.x_axis.push(east);
        }
    }
}
