//! Mosaic assembly.
//!
//! The [`MosaicAssembler`] downloads the tiles of a [`BoundingBox`] and
//! composites them into one PNG. Each column is fetched and stacked
//! independently and all columns run concurrently; the final grid is only
//! assembled once every column has finished. Intermediate fragments are
//! deleted afterwards whether or not assembly succeeded.

mod compose;
mod fragments;

pub use compose::Axis;
pub use fragments::FragmentPaths;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bbox::BoundingBox;
use crate::coord::TILE_SIZE;
use crate::download::{DownloadError, FragmentRequest, TileDownloader};
use crate::files;
use crate::provider::AsyncHttpClient;
use crate::report::{NoOpReporter, SharedReporter};

/// Errors raised while assembling images.
#[derive(Debug, Error)]
pub enum MosaicError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Missing fragment {}", .0.display())]
    MissingFragment(PathBuf),

    #[error("Image error for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "{} is {}x{} pixels, expected {}x{}",
        path.display(), actual.0, actual.1, expected.0, expected.1
    )]
    Dimensions {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Nothing to assemble")]
    NoFragments,

    #[error("File operation failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compositing task failed: {0}")]
    Task(String),
}

/// Downloads tiles and composites them into strips, grids and crops.
pub struct MosaicAssembler<C: AsyncHttpClient> {
    downloader: Arc<TileDownloader<C>>,
    tile_size: u32,
    reporter: SharedReporter,
}

impl<C: AsyncHttpClient> MosaicAssembler<C> {
    /// Creates an assembler for standard 256 pixel tiles.
    pub fn new(downloader: Arc<TileDownloader<C>>) -> Self {
        Self {
            downloader,
            tile_size: TILE_SIZE,
            reporter: Arc::new(NoOpReporter),
        }
    }

    /// Overrides the tile edge length in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn downloader(&self) -> &TileDownloader<C> {
        &self.downloader
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn reporter(&self) -> &SharedReporter {
        &self.reporter
    }

    /// Stacks `tile_count` tiles of column `column` into `{base}_{column}.png`.
    pub async fn assemble_column(
        &self,
        paths: &FragmentPaths,
        column: usize,
        tile_count: usize,
    ) -> Result<PathBuf, MosaicError> {
        let pieces = (0..tile_count).map(|i| paths.tile(column, i)).collect();
        let output = paths.strip(column);
        let size = self.tile_size;
        self.stack(pieces, Axis::Vertical, size, size, output).await
    }

    /// Places `tile_count` tiles of row `row` side by side into `{base}_{row}.png`.
    pub async fn assemble_row(
        &self,
        paths: &FragmentPaths,
        row: usize,
        tile_count: usize,
    ) -> Result<PathBuf, MosaicError> {
        let pieces = (0..tile_count).map(|i| paths.tile(row, i)).collect();
        let output = paths.strip(row);
        let size = self.tile_size;
        self.stack(pieces, Axis::Horizontal, size, size, output).await
    }

    /// Places `column_count` assembled columns side by side into `{base}.png`.
    pub async fn assemble_columns_into_grid(
        &self,
        paths: &FragmentPaths,
        column_count: usize,
        rows_per_column: usize,
    ) -> Result<PathBuf, MosaicError> {
        let pieces = (0..column_count).map(|c| paths.strip(c)).collect();
        let height = self.tile_size * rows_per_column as u32;
        self.stack(pieces, Axis::Horizontal, self.tile_size, height, paths.image())
            .await
    }

    /// Stacks `row_count` assembled rows top to bottom into `{base}.png`.
    pub async fn assemble_rows_into_grid(
        &self,
        paths: &FragmentPaths,
        row_count: usize,
        columns_per_row: usize,
    ) -> Result<PathBuf, MosaicError> {
        let pieces = (0..row_count).map(|r| paths.strip(r)).collect();
        let width = self.tile_size * columns_per_row as u32;
        self.stack(pieces, Axis::Vertical, width, self.tile_size, paths.image())
            .await
    }

    /// Crops a region of `source` into `output`.
    pub async fn crop(
        &self,
        source: &Path,
        origin: (u32, u32),
        size: (u32, u32),
        output: &Path,
    ) -> Result<(), MosaicError> {
        let source = source.to_path_buf();
        let output = output.to_path_buf();
        tokio::task::spawn_blocking(move || {
            compose::crop(&source, origin.0, origin.1, size.0, size.1, &output)
        })
        .await
        .map_err(|e| MosaicError::Task(e.to_string()))?
    }

    async fn stack(
        &self,
        pieces: Vec<PathBuf>,
        axis: Axis,
        piece_width: u32,
        piece_height: u32,
        output: PathBuf,
    ) -> Result<PathBuf, MosaicError> {
        let target = output.clone();
        tokio::task::spawn_blocking(move || {
            compose::stack(&pieces, axis, piece_width, piece_height, &target)
        })
        .await
        .map_err(|e| MosaicError::Task(e.to_string()))??;

        debug!(path = %output.display(), ?axis, "Assembled fragment");
        Ok(output)
    }

    /// Downloads and stacks one column of the box.
    async fn build_column(
        &self,
        bbox: &BoundingBox,
        zoom: u8,
        paths: &FragmentPaths,
        column: usize,
        x: u32,
    ) -> Result<PathBuf, MosaicError> {
        let requests: Vec<FragmentRequest> = bbox
            .y_axis
            .iter()
            .enumerate()
            .map(|(row, &y)| FragmentRequest::new(x, y, paths.tile(column, row)))
            .collect();

        self.downloader.fetch_column(zoom, &requests).await?;
        self.assemble_column(paths, column, requests.len()).await
    }

    /// Builds the full image of `bbox` at `zoom` as `{base}.png`.
    ///
    /// Columns download and assemble concurrently, then the grid is
    /// composited. Fragments are removed afterwards either way.
    pub async fn assemble_mosaic(
        &self,
        bbox: &BoundingBox,
        zoom: u8,
        paths: &FragmentPaths,
    ) -> Result<PathBuf, MosaicError> {
        if bbox.tile_count() == 0 {
            return Err(MosaicError::NoFragments);
        }
        if let Some(dir) = paths.directory() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| MosaicError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        self.reporter.report(&format!(
            "Assembling {}x{} tiles at zoom {}",
            bbox.width(),
            bbox.height(),
            zoom
        ));

        // Every column settles before the grid step or cleanup runs
        let columns = join_all(
            bbox.x_axis
                .iter()
                .enumerate()
                .map(|(column, &x)| self.build_column(bbox, zoom, paths, column, x)),
        )
        .await;

        let result = match columns.into_iter().collect::<Result<Vec<_>, _>>() {
            Ok(_) => {
                self.assemble_columns_into_grid(paths, bbox.width(), bbox.height())
                    .await
            }
            Err(e) => Err(e),
        };

        self.remove_fragments(paths).await;

        let image = result?;
        info!(zoom, bbox = %bbox, path = %image.display(), "Mosaic assembled");
        Ok(image)
    }

    /// Deletes every tile and strip fragment of `paths`.
    pub async fn remove_fragments(&self, paths: &FragmentPaths) {
        let pattern = paths.cleanup_pattern();
        match files::remove_matching(&pattern).await {
            Ok(removed) => debug!(removed, pattern = %pattern, "Removed fragments"),
            Err(e) => warn!(pattern = %pattern, error = %e, "Failed to remove fragments"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TileCache;
    use crate::download::DownloadConfig;
    use crate::provider::{MockAsyncHttpClient, TileServer};
    use std::time::Duration;

    const SIZE: u32 = 8;

    fn assembler(client: MockAsyncHttpClient, cache_root: &Path) -> MosaicAssembler<MockAsyncHttpClient> {
        let config = DownloadConfig {
            request_delay: Duration::from_millis(1),
            ..DownloadConfig::default()
        };
        let downloader = TileDownloader::new(
            client,
            TileServer::new("https://tiles.test", None),
            TileCache::new(cache_root),
            &config,
        );
        MosaicAssembler::new(Arc::new(downloader)).with_tile_size(SIZE)
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_assemble_mosaic_dimensions_and_cleanup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out_dir = temp_dir.path().join("out");
        let asm = assembler(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );

        let bbox = BoundingBox::new(vec![15, 0, 1], vec![3, 4]);
        let paths = FragmentPaths::new(out_dir.join("map.png"));
        let image = asm.assemble_mosaic(&bbox, 4, &paths).await.unwrap();

        assert_eq!(image, out_dir.join("map.png"));
        let decoded = image::open(&image).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3 * SIZE, 2 * SIZE));
        assert_eq!(leftovers(&out_dir), vec!["map.png"]);
        assert_eq!(asm.downloader().client().request_count(), 6);
    }

    #[tokio::test]
    async fn test_assemble_mosaic_fails_and_cleans_up() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out_dir = temp_dir.path().join("out");
        let asm = assembler(
            MockAsyncHttpClient::serving_tiles(SIZE).failing_on("/4/1/4.png"),
            &temp_dir.path().join("cache"),
        );

        let bbox = BoundingBox::new(vec![0, 1], vec![3, 4]);
        let paths = FragmentPaths::new(out_dir.join("map.png"));
        let result = asm.assemble_mosaic(&bbox, 4, &paths).await;

        assert!(matches!(result, Err(MosaicError::Download(_))));
        assert!(leftovers(&out_dir).is_empty());
    }

    #[tokio::test]
    async fn test_assemble_row_and_rows_into_grid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let asm = assembler(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );
        let paths = FragmentPaths::new(temp_dir.path().join("rows"));

        for row in 0..2 {
            let requests: Vec<_> = (0..3)
                .map(|i| FragmentRequest::new(i, row as u32, paths.tile(row, i as usize)))
                .collect();
            asm.downloader().fetch_row(3, &requests).await.unwrap();
            asm.assemble_row(&paths, row, 3).await.unwrap();
        }
        let grid = asm.assemble_rows_into_grid(&paths, 2, 3).await.unwrap();

        let decoded = image::open(&grid).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3 * SIZE, 2 * SIZE));
    }

    #[tokio::test]
    async fn test_grid_rejects_mismatched_strip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let asm = assembler(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );
        let paths = FragmentPaths::new(temp_dir.path().join("g"));

        image::RgbaImage::new(SIZE, 2 * SIZE).save(paths.strip(0)).unwrap();
        image::RgbaImage::new(SIZE, 3 * SIZE).save(paths.strip(1)).unwrap();

        let result = asm.assemble_columns_into_grid(&paths, 2, 2).await;
        assert!(matches!(result, Err(MosaicError::Dimensions { .. })));
    }

    #[tokio::test]
    async fn test_empty_box_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let asm = assembler(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );
        let result = asm
            .assemble_mosaic(
                &BoundingBox::default(),
                3,
                &FragmentPaths::new(temp_dir.path().join("x")),
            )
            .await;
        assert!(matches!(result, Err(MosaicError::NoFragments)));
    }
}
