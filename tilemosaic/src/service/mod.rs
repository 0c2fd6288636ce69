//! End-to-end mosaic building.
//!
//! [`MosaicService`] runs the whole pipeline for a set of coordinates:
//!
//! 1. pick a zoom level (or use the requested one)
//! 2. compute the bounding box
//! 3. download and assemble the mosaic
//! 4. optionally pad it to a 2x2 tile square
//!
//! [`MosaicService::build_zoom_series`] then keeps zooming into the same
//! footprint, one level at a time, using the next-zoom transform instead of
//! recomputing from the coordinates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bbox::BoundingBox;
use crate::coord::{GeoPoint, MAX_ZOOM};
use crate::mosaic::{FragmentPaths, MosaicAssembler, MosaicError};
use crate::padding::{Padder, PaddingError, PaddingMethod};
use crate::provider::AsyncHttpClient;
use crate::report::SharedReporter;
use crate::transform::next_zoom_bounding_box;
use crate::zoom::{bounding_box_for_points, select_optimal_zoom, ZoomConstraints, ZoomError};

/// Errors from building a mosaic.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Zoom(#[from] ZoomError),

    #[error(transparent)]
    Mosaic(#[from] MosaicError),

    #[error(transparent)]
    Padding(#[from] PaddingError),

    #[error("Zoom level {0} is above the maximum of {max}", max = MAX_ZOOM)]
    InvalidZoom(u8),
}

/// What to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicRequest {
    /// Output image path; `.png` is appended if missing.
    pub output: PathBuf,
    pub constraints: ZoomConstraints,
    /// Fixed zoom level. Searched with `constraints` when `None`.
    pub zoom: Option<u8>,
    /// Pad one-tile-wide or one-tile-tall mosaics to 2x2 tiles.
    pub square: bool,
}

/// A finished image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicOutcome {
    pub zoom: u8,
    /// Box the mosaic was assembled from, before padding.
    pub source_box: BoundingBox,
    /// Box covered by the final image.
    pub bounding_box: BoundingBox,
    pub padding: PaddingMethod,
    pub path: PathBuf,
}

/// Path of the image one series step at `zoom`: `{stem}-z{zoom}.png`.
pub fn series_path(output: &Path, zoom: u8) -> PathBuf {
    let base = FragmentPaths::new(output);
    let stem = base
        .base()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.base()
        .with_file_name(format!("{}-z{}.png", stem, zoom))
}

/// Builds mosaics from coordinates.
pub struct MosaicService<C: AsyncHttpClient> {
    assembler: Arc<MosaicAssembler<C>>,
    padder: Padder<C>,
}

impl<C: AsyncHttpClient> MosaicService<C> {
    pub fn new(assembler: MosaicAssembler<C>) -> Self {
        let assembler = Arc::new(assembler);
        Self {
            padder: Padder::new(Arc::clone(&assembler)),
            assembler,
        }
    }

    pub fn assembler(&self) -> &MosaicAssembler<C> {
        &self.assembler
    }

    fn reporter(&self) -> &SharedReporter {
        self.assembler.reporter()
    }

    /// Resolves the zoom level for `points`.
    pub fn choose_zoom(&self, points: &[GeoPoint], request: &MosaicRequest) -> Result<u8, ServiceError> {
        match request.zoom {
            Some(zoom) if zoom > MAX_ZOOM => Err(ServiceError::InvalidZoom(zoom)),
            Some(zoom) => Ok(zoom),
            None => Ok(select_optimal_zoom(points, &request.constraints)?),
        }
    }

    /// Builds the mosaic covering `points`.
    pub async fn build(
        &self,
        points: &[GeoPoint],
        request: &MosaicRequest,
    ) -> Result<MosaicOutcome, ServiceError> {
        if points.is_empty() {
            return Err(ZoomError::NoCoordinates.into());
        }

        let zoom = self.choose_zoom(points, request)?;
        let bbox = bounding_box_for_points(points, zoom, request.constraints.trim_margin)?;
        self.reporter().report(&format!("Zoom {} covers {}", zoom, bbox));

        let paths = FragmentPaths::new(&request.output);
        let path = self.assembler.assemble_mosaic(&bbox, zoom, &paths).await?;

        let (bounding_box, padding) = if request.square {
            self.padder.make_square(&bbox, zoom, &paths).await?
        } else {
            (bbox.clone(), PaddingMethod::None)
        };

        info!(
            zoom,
            bbox = %bounding_box,
            method = %padding,
            path = %path.display(),
            "Mosaic built"
        );
        Ok(MosaicOutcome {
            zoom,
            source_box: bbox,
            bounding_box,
            padding,
            path,
        })
    }

    /// Builds the image one zoom level deeper than `previous`, at `output`.
    pub async fn deepen(
        &self,
        previous: &MosaicOutcome,
        output: &Path,
    ) -> Result<MosaicOutcome, ServiceError> {
        if previous.zoom >= MAX_ZOOM {
            return Err(ServiceError::InvalidZoom(previous.zoom + 1));
        }
        let zoom = previous.zoom + 1;
        let bbox = next_zoom_bounding_box(previous.padding, &previous.source_box, previous.zoom);
        self.reporter()
            .report(&format!("Zooming in to level {} ({} tiles)", zoom, bbox.tile_count()));

        let path = self
            .assembler
            .assemble_mosaic(&bbox, zoom, &FragmentPaths::new(output))
            .await?;

        Ok(MosaicOutcome {
            zoom,
            source_box: bbox.clone(),
            bounding_box: bbox,
            padding: PaddingMethod::None,
            path,
        })
    }

    /// Builds the mosaic for `points`, then up to `depth` progressively deeper
    /// images of the same footprint.
    ///
    /// Cancellation is checked between levels; images already written are
    /// returned. The series also stops at the maximum zoom level.
    pub async fn build_zoom_series(
        &self,
        points: &[GeoPoint],
        request: &MosaicRequest,
        depth: u8,
        cancel: &CancellationToken,
    ) -> Result<Vec<MosaicOutcome>, ServiceError> {
        let mut outcomes = vec![self.build(points, request).await?];

        for _ in 0..depth {
            let Some(previous) = outcomes.last() else {
                break;
            };
            if cancel.is_cancelled() {
                warn!(zoom = previous.zoom, "Zoom series cancelled");
                break;
            }
            if previous.zoom >= MAX_ZOOM {
                warn!(zoom = previous.zoom, "Zoom series reached the maximum zoom level");
                break;
            }

            let output = series_path(&request.output, previous.zoom + 1);
            let next = self.deepen(previous, &output).await?;
            outcomes.push(next);
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TileCache;
    use crate::download::{DownloadConfig, TileDownloader};
    use crate::provider::{MockAsyncHttpClient, TileServer};
    use crate::report::tests::RecordingReporter;
    use std::time::Duration;

    const SIZE: u32 = 8;

    fn service(client: MockAsyncHttpClient, cache_root: &Path) -> MosaicService<MockAsyncHttpClient> {
        let config = DownloadConfig {
            request_delay: Duration::from_millis(1),
            ..DownloadConfig::default()
        };
        let downloader = TileDownloader::new(
            client,
            TileServer::new("https://tiles.test", Some("k".into())),
            TileCache::new(cache_root),
            &config,
        );
        MosaicService::new(MosaicAssembler::new(Arc::new(downloader)).with_tile_size(SIZE))
    }

    fn request(output: PathBuf, zoom: Option<u8>, trim_margin: u32) -> MosaicRequest {
        MosaicRequest {
            output,
            constraints: ZoomConstraints {
                max_tiles_width: 2,
                max_tiles_height: 2,
                max_zoom: MAX_ZOOM,
                trim_margin,
            },
            zoom,
            square: true,
        }
    }

    fn dimensions(path: &Path) -> (u32, u32) {
        let image = image::open(path).unwrap();
        (image.width(), image.height())
    }

    #[test]
    fn test_series_path() {
        assert_eq!(
            series_path(Path::new("/out/map.png"), 7),
            PathBuf::from("/out/map-z7.png")
        );
        assert_eq!(series_path(Path::new("map"), 3), PathBuf::from("map-z3.png"));
    }

    #[tokio::test]
    async fn test_origin_at_zoom_five_is_padded_on_all_sides() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );
        let req = request(temp_dir.path().join("origin.png"), Some(5), 0);

        let outcome = svc.build(&[GeoPoint::new(0.0, 0.0)], &req).await.unwrap();

        assert_eq!(outcome.zoom, 5);
        assert_eq!(outcome.source_box, BoundingBox::single(16, 16));
        assert_eq!(outcome.padding, PaddingMethod::NorthSouthWestEast);
        assert_eq!(
            outcome.bounding_box,
            BoundingBox::new(vec![15, 16], vec![15, 16])
        );
        assert_eq!(dimensions(&outcome.path), (2 * SIZE, 2 * SIZE));
        // One source tile plus eight neighbours
        assert_eq!(svc.assembler().downloader().client().request_count(), 9);
    }

    #[tokio::test]
    async fn test_searched_zoom_respects_budget() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );
        let req = request(temp_dir.path().join("pair.png"), None, 20);
        let points = [GeoPoint::new(151.177, -33.946), GeoPoint::new(115.967, -31.940)];

        let outcome = svc.build(&points, &req).await.unwrap();

        assert!(outcome.source_box.width() <= 2);
        assert!(outcome.source_box.height() <= 2);
        assert_eq!(outcome.bounding_box.width(), 2);
        assert_eq!(outcome.bounding_box.height(), 2);
        assert_eq!(dimensions(&outcome.path), (2 * SIZE, 2 * SIZE));
    }

    #[tokio::test]
    async fn test_unsquared_request_keeps_shape() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );
        let mut req = request(temp_dir.path().join("raw.png"), Some(5), 0);
        req.square = false;

        let outcome = svc.build(&[GeoPoint::new(0.0, 0.0)], &req).await.unwrap();
        assert_eq!(outcome.padding, PaddingMethod::None);
        assert_eq!(dimensions(&outcome.path), (SIZE, SIZE));
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );

        let req = request(temp_dir.path().join("x.png"), Some(19), 0);
        let result = svc.build(&[GeoPoint::new(0.0, 0.0)], &req).await;
        assert!(matches!(result, Err(ServiceError::InvalidZoom(19))));

        let req = request(temp_dir.path().join("x.png"), None, 0);
        let result = svc.build(&[], &req).await;
        assert!(matches!(result, Err(ServiceError::Zoom(ZoomError::NoCoordinates))));
    }

    #[tokio::test]
    async fn test_download_failure_surfaces() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockAsyncHttpClient::serving_tiles(SIZE).failing_on("/5/16/16.png"),
            &temp_dir.path().join("cache"),
        );
        let req = request(temp_dir.path().join("fail.png"), Some(5), 0);

        let result = svc.build(&[GeoPoint::new(0.0, 0.0)], &req).await;
        assert!(matches!(result, Err(ServiceError::Mosaic(MosaicError::Download(_)))));
    }

    #[tokio::test]
    async fn test_zoom_series() {
        let temp_dir = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let config = DownloadConfig {
            request_delay: Duration::from_millis(1),
            ..DownloadConfig::default()
        };
        let downloader = TileDownloader::new(
            MockAsyncHttpClient::serving_tiles(SIZE),
            TileServer::new("https://tiles.test", None),
            TileCache::new(temp_dir.path().join("cache")),
            &config,
        );
        let svc = MosaicService::new(
            MosaicAssembler::new(Arc::new(downloader))
                .with_tile_size(SIZE)
                .with_reporter(reporter.clone()),
        );
        let req = request(temp_dir.path().join("series.png"), Some(5), 0);

        let outcomes = svc
            .build_zoom_series(&[GeoPoint::new(0.0, 0.0)], &req, 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[1].zoom, 6);
        assert_eq!(outcomes[1].bounding_box.x_axis, vec![31, 32, 33, 34]);
        assert_eq!(outcomes[1].path, temp_dir.path().join("series-z6.png"));
        assert_eq!(dimensions(&outcomes[1].path), (4 * SIZE, 4 * SIZE));
        assert_eq!(outcomes[2].zoom, 7);
        assert_eq!(outcomes[2].bounding_box.x_axis, (62..70).collect::<Vec<_>>());
        assert_eq!(dimensions(&outcomes[2].path), (8 * SIZE, 8 * SIZE));
        assert!(!reporter.messages().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_series_stops_after_first_image() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );
        let req = request(temp_dir.path().join("c.png"), Some(5), 0);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcomes = svc
            .build_zoom_series(&[GeoPoint::new(0.0, 0.0)], &req, 3, &cancel)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
    }

    #[tokio::test]
    async fn test_series_stops_at_max_zoom() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(
            MockAsyncHttpClient::serving_tiles(SIZE),
            &temp_dir.path().join("cache"),
        );
        let mut req = request(temp_dir.path().join("deep.png"), Some(MAX_ZOOM), 0);
        req.square = false;

        let outcomes = svc
            .build_zoom_series(&[GeoPoint::new(10.0, 10.0)], &req, 2, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
    }
}
