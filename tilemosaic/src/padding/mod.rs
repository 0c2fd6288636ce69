//! Squaring non-square mosaics.
//!
//! A mosaic one tile wide or one tile tall is padded with neighbouring tiles
//! and cropped so the result is exactly 2x2 tiles:
//!
//! | Shape | Method | Composite | Kept |
//! |-------|--------|-----------|------|
//! | 1x1 | [`PaddingMethod::NorthSouthWestEast`] | 3x3 | centre |
//! | 1x2 | [`PaddingMethod::WestEast`] | 3 columns | centre 2 columns |
//! | 2x1 | [`PaddingMethod::NorthSouth`] | 3 rows | centre 2 rows |
//! | 2x1 on the south pole row | [`PaddingMethod::North`] | 2 rows | all |
//! | 2x1 on the north pole row | [`PaddingMethod::South`] | 2 rows | all |
//!
//! Square mosaics are left alone ([`PaddingMethod::None`]).

mod plan;

pub use plan::{plan, Cell, Crop, Layout, PadPlan, Strip};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bbox::BoundingBox;
use crate::download::{DownloadError, FragmentRequest};
use crate::files;
use crate::mosaic::{FragmentPaths, MosaicAssembler, MosaicError};
use crate::provider::AsyncHttpClient;

/// Which edges of a mosaic were padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaddingMethod {
    NorthSouthWestEast,
    WestEast,
    NorthSouth,
    North,
    South,
    None,
}

impl PaddingMethod {
    pub fn name(&self) -> &'static str {
        match self {
            PaddingMethod::NorthSouthWestEast => "north-south-west-east",
            PaddingMethod::WestEast => "west-east",
            PaddingMethod::NorthSouth => "north-south",
            PaddingMethod::North => "north",
            PaddingMethod::South => "south",
            PaddingMethod::None => "none",
        }
    }
}

impl fmt::Display for PaddingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while squaring a mosaic.
#[derive(Debug, Error)]
pub enum PaddingError {
    #[error("Tile ({x}, {y}) at zoom {zoom} touches a pole and cannot be padded on all sides")]
    PolarSingleTile { x: u32, y: u32, zoom: u8 },

    #[error("Cannot square a {width}x{height} tile mosaic")]
    UnsupportedShape { width: usize, height: usize },

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Mosaic(#[from] MosaicError),

    #[error("Failed to move {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pads mosaics to 2x2 tiles using the assembler's downloader.
pub struct Padder<C: AsyncHttpClient> {
    assembler: Arc<MosaicAssembler<C>>,
}

impl<C: AsyncHttpClient> Padder<C> {
    pub fn new(assembler: Arc<MosaicAssembler<C>>) -> Self {
        Self { assembler }
    }

    /// Squares the mosaic `{base}.png` of `bbox` at `zoom` in place.
    ///
    /// Returns the box of the squared image and the method applied. The
    /// original image is consumed even when padding fails.
    pub async fn make_square(
        &self,
        bbox: &BoundingBox,
        zoom: u8,
        paths: &FragmentPaths,
    ) -> Result<(BoundingBox, PaddingMethod), PaddingError> {
        let plan = plan(bbox, zoom)?;
        if plan.method == PaddingMethod::None {
            debug!(zoom, bbox = %bbox, "Mosaic already square");
            return Ok((plan.square, plan.method));
        }

        self.assembler.reporter().report(&format!(
            "Padding {}x{} mosaic ({})",
            bbox.width(),
            bbox.height(),
            plan.method
        ));

        let work = paths.nested("pad");
        let result = self.apply(&plan, zoom, paths, &work).await;

        self.assembler.remove_fragments(&work).await;
        if let Err(e) = files::remove_with_retry(&work.image()).await {
            warn!(path = %work.image().display(), error = %e, "Failed to remove padded composite");
        }

        result?;
        info!(zoom, method = %plan.method, square = %plan.square, "Mosaic squared");
        Ok((plan.square, plan.method))
    }

    async fn apply(
        &self,
        plan: &PadPlan,
        zoom: u8,
        paths: &FragmentPaths,
        work: &FragmentPaths,
    ) -> Result<(), PaddingError> {
        let source = paths.image();
        self.place_source(plan, &source, work).await?;

        match plan.layout {
            // Columns are independent and fetch concurrently
            Layout::Columns => {
                let results = join_all(
                    plan.strips
                        .iter()
                        .enumerate()
                        .map(|(index, strip)| self.build_strip(plan.layout, zoom, work, index, strip)),
                )
                .await;
                results.into_iter().collect::<Result<Vec<_>, _>>()?;
            }
            Layout::Rows => {
                for (index, strip) in plan.strips.iter().enumerate() {
                    self.build_strip(plan.layout, zoom, work, index, strip)
                        .await?;
                }
            }
        }

        let strips = plan.strips.len();
        let length = plan.strip_length();
        let composite = match plan.layout {
            Layout::Columns => {
                self.assembler
                    .assemble_columns_into_grid(work, strips, length)
                    .await?
            }
            Layout::Rows => {
                self.assembler
                    .assemble_rows_into_grid(work, strips, length)
                    .await?
            }
        };

        let tile_size = self.assembler.tile_size();
        match plan.crop {
            Crop::None => move_file(&composite, &source).await,
            crop => {
                let size = (2 * tile_size, 2 * tile_size);
                self.assembler
                    .crop(&composite, crop.origin(tile_size), size, &source)
                    .await?;
                Ok(())
            }
        }
    }

    /// Moves the existing image to where the plan expects it.
    async fn place_source(
        &self,
        plan: &PadPlan,
        source: &Path,
        work: &FragmentPaths,
    ) -> Result<(), PaddingError> {
        for (index, strip) in plan.strips.iter().enumerate() {
            match strip {
                Strip::Source => return move_file(source, &work.strip(index)).await,
                Strip::Cells(cells) => {
                    if let Some(inner) = cells.iter().position(|c| *c == Cell::Source) {
                        return move_file(source, &work.tile(index, inner)).await;
                    }
                }
            }
        }
        Ok(())
    }

    /// Fetches and assembles one strip; whole-source strips are already in place.
    async fn build_strip(
        &self,
        layout: Layout,
        zoom: u8,
        work: &FragmentPaths,
        index: usize,
        strip: &Strip,
    ) -> Result<(), PaddingError> {
        let Strip::Cells(cells) = strip else {
            return Ok(());
        };

        let requests: Vec<FragmentRequest> = cells
            .iter()
            .enumerate()
            .filter_map(|(inner, cell)| match *cell {
                Cell::Fetch { x, y } => Some(FragmentRequest::new(x, y, work.tile(index, inner))),
                Cell::Source => None,
            })
            .collect();

        let downloader = self.assembler.downloader();
        match layout {
            Layout::Columns => {
                downloader.fetch_column(zoom, &requests).await?;
                self.assembler
                    .assemble_column(work, index, cells.len())
                    .await?;
            }
            Layout::Rows => {
                downloader.fetch_row(zoom, &requests).await?;
                self.assembler.assemble_row(work, index, cells.len()).await?;
            }
        }
        Ok(())
    }
}

async fn move_file(from: &Path, to: &Path) -> Result<(), PaddingError> {
    files::rename_with_retry(from, to)
        .await
        .map_err(|source| PaddingError::Io {
            path: from.to_path_buf(),
            source,
        })
}
