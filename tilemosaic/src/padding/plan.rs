//! Padding geometry.
//!
//! Works out, without touching disk or network, which neighbouring tiles a
//! non-square mosaic needs, where the existing image sits among them, and
//! which part of the padded composite to keep.

use crate::bbox::BoundingBox;
use crate::coord::{dec_x, dec_y, inc_x, inc_y};

use super::{PaddingError, PaddingMethod};

/// How the strips of a padded composite are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Strips are columns placed left to right.
    Columns,
    /// Strips are rows stacked top to bottom.
    Rows,
}

/// One tile position inside a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Download tile `(x, y)`.
    Fetch { x: u32, y: u32 },
    /// Reuse the existing single-tile image.
    Source,
}

/// One column or row of the padded composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strip {
    /// The existing image already forms this whole strip.
    Source,
    /// The strip is assembled from individual tiles.
    Cells(Vec<Cell>),
}

/// Part of the composite kept after assembly, in half-tile steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crop {
    /// The composite is already 2x2 tiles.
    None,
    /// Trim half a tile from the west and east edges.
    Horizontal,
    /// Trim half a tile from the north and south edges.
    Vertical,
    /// Trim half a tile from every edge.
    Both,
}

impl Crop {
    /// Pixel origin of the kept region.
    pub fn origin(self, tile_size: u32) -> (u32, u32) {
        let half = tile_size / 2;
        match self {
            Crop::None => (0, 0),
            Crop::Horizontal => (half, 0),
            Crop::Vertical => (0, half),
            Crop::Both => (half, half),
        }
    }
}

/// Complete recipe for squaring one mosaic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadPlan {
    pub method: PaddingMethod,
    pub layout: Layout,
    pub strips: Vec<Strip>,
    pub crop: Crop,
    /// 2x2 box whose top-left tile holds the top-left corner of the result.
    pub square: BoundingBox,
}

impl PadPlan {
    /// Tiles along each strip.
    pub fn strip_length(&self) -> usize {
        self.strips
            .iter()
            .find_map(|s| match s {
                Strip::Cells(cells) => Some(cells.len()),
                Strip::Source => None,
            })
            .unwrap_or(0)
    }

    /// Tiles that must be downloaded.
    pub fn fetch_count(&self) -> usize {
        self.strips
            .iter()
            .map(|s| match s {
                Strip::Cells(cells) => cells
                    .iter()
                    .filter(|c| matches!(c, Cell::Fetch { .. }))
                    .count(),
                Strip::Source => 0,
            })
            .sum()
    }
}

fn fetch_all(xs: &[u32], ys: &[u32]) -> Vec<Cell> {
    xs.iter()
        .flat_map(|&x| ys.iter().map(move |&y| Cell::Fetch { x, y }))
        .collect()
}

/// Plans how to square `bbox` at `zoom`.
///
/// # Errors
///
/// [`PaddingError::PolarSingleTile`] for a single tile touching a pole, and
/// [`PaddingError::UnsupportedShape`] for anything other than 1x1, 1x2, 2x1
/// or an already square box.
pub fn plan(bbox: &BoundingBox, zoom: u8) -> Result<PadPlan, PaddingError> {
    match (bbox.width(), bbox.height()) {
        (1, 1) => plan_all_sides(bbox.x_axis[0], bbox.y_axis[0], zoom),
        (1, 2) => Ok(plan_west_east(bbox, zoom)),
        (2, 1) => plan_north_south(bbox, zoom),
        (w, h) if w == h && w > 0 => Ok(PadPlan {
            method: PaddingMethod::None,
            layout: Layout::Columns,
            strips: Vec::new(),
            crop: Crop::None,
            square: bbox.clone(),
        }),
        (width, height) => Err(PaddingError::UnsupportedShape { width, height }),
    }
}

/// 3x3 grid around a single tile, cropped to its centre.
fn plan_all_sides(x: u32, y: u32, zoom: u8) -> Result<PadPlan, PaddingError> {
    let (Some(north), Some(south)) = (dec_y(y), inc_y(y, zoom)) else {
        return Err(PaddingError::PolarSingleTile { x, y, zoom });
    };
    let west = dec_x(x, zoom);
    let east = inc_x(x, zoom);

    let column = |cx: u32, centre: Cell| {
        Strip::Cells(vec![
            Cell::Fetch { x: cx, y: north },
            centre,
            Cell::Fetch { x: cx, y: south },
        ])
    };

    Ok(PadPlan {
        method: PaddingMethod::NorthSouthWestEast,
        layout: Layout::Columns,
        strips: vec![
            column(west, Cell::Fetch { x: west, y }),
            column(x, Cell::Source),
            column(east, Cell::Fetch { x: east, y }),
        ],
        crop: Crop::Both,
        square: BoundingBox::new(vec![west, x], vec![north, y]),
    })
}

/// New columns on both sides of a one-column box.
fn plan_west_east(bbox: &BoundingBox, zoom: u8) -> PadPlan {
    let x = bbox.x_axis[0];
    let west = dec_x(x, zoom);
    let east = inc_x(x, zoom);

    PadPlan {
        method: PaddingMethod::WestEast,
        layout: Layout::Columns,
        strips: vec![
            Strip::Cells(fetch_all(&[west], &bbox.y_axis)),
            Strip::Source,
            Strip::Cells(fetch_all(&[east], &bbox.y_axis)),
        ],
        crop: Crop::Horizontal,
        square: BoundingBox::new(vec![west, x], bbox.y_axis.clone()),
    }
}

/// New rows for a one-row box, one-sided when a pole blocks an edge.
fn plan_north_south(bbox: &BoundingBox, zoom: u8) -> Result<PadPlan, PaddingError> {
    let y = bbox.y_axis[0];
    let row = |ry: u32| Strip::Cells(fetch_all(&bbox.x_axis, &[ry]));

    let plan = match (dec_y(y), inc_y(y, zoom)) {
        (Some(north), Some(south)) => PadPlan {
            method: PaddingMethod::NorthSouth,
            layout: Layout::Rows,
            strips: vec![row(north), Strip::Source, row(south)],
            crop: Crop::Vertical,
            square: BoundingBox::new(bbox.x_axis.clone(), vec![north, y]),
        },
        // Against the south pole the existing row becomes the bottom one
        (Some(north), None) => PadPlan {
            method: PaddingMethod::North,
            layout: Layout::Rows,
            strips: vec![row(north), Strip::Source],
            crop: Crop::None,
            square: BoundingBox::new(bbox.x_axis.clone(), vec![north, y]),
        },
        (None, Some(south)) => PadPlan {
            method: PaddingMethod::South,
            layout: Layout::Rows,
            strips: vec![Strip::Source, row(south)],
            crop: Crop::None,
            square: BoundingBox::new(bbox.x_axis.clone(), vec![y, south]),
        },
        (None, None) => {
            return Err(PaddingError::UnsupportedShape {
                width: bbox.width(),
                height: bbox.height(),
            })
        }
    };
    Ok(plan)
}
