//! Tile acquisition.
//!
//! [`TileDownloader`] fetches single tiles into destination files, preferring
//! the local [`TileCache`] over the network. Every fetch passes through a
//! shared concurrency gate and waits a short fixed delay first so bursts of
//! column downloads never hammer the tile server.
//!
//! Batch fetches are fail-fast: the first tile that cannot be fetched fails
//! the whole column or row. Fetches of a column still queued at the gate are
//! skipped once one has failed, while those already in flight are allowed to
//! finish so no file write outlives the batch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::cache::{CacheError, DownloadCounter, TileCache};
use crate::provider::{AsyncHttpClient, ProviderError, TileServer};

/// Default number of tile fetches allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default pause before each fetch.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(50);

/// Errors that can occur while fetching tiles.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The tile server request failed.
    #[error("Failed to download tile {zoom}/{x}/{y}: {source}")]
    Provider {
        zoom: u8,
        x: u32,
        y: u32,
        #[source]
        source: ProviderError,
    },

    /// The server returned something that is not an image.
    #[error("Tile {zoom}/{x}/{y} is not a recognizable image")]
    InvalidImage { zoom: u8, x: u32, y: u32 },

    /// Writing the destination file failed.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tile cache or download counter failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The concurrency gate was closed.
    #[error("Download gate closed")]
    GateClosed,

    /// Skipped because another tile in the same batch failed.
    #[error("Batch aborted after an earlier failure")]
    Aborted,
}

/// Where a fetched tile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSource {
    Cache,
    Network,
}

/// One tile to fetch into one destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRequest {
    pub x: u32,
    pub y: u32,
    pub destination: PathBuf,
}

impl FragmentRequest {
    pub fn new(x: u32, y: u32, destination: impl Into<PathBuf>) -> Self {
        Self {
            x,
            y,
            destination: destination.into(),
        }
    }
}

/// Download throttling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Fetches allowed in flight at once (minimum 1).
    pub max_concurrent: usize,
    /// Pause inserted before each fetch.
    pub request_delay: Duration,
    /// Soft daily download limit; 0 disables the warning.
    pub daily_limit: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            request_delay: DEFAULT_REQUEST_DELAY,
            daily_limit: 0,
        }
    }
}

/// Cache-first tile fetcher with a bounded concurrency gate.
pub struct TileDownloader<C: AsyncHttpClient> {
    client: C,
    server: TileServer,
    cache: TileCache,
    counter: DownloadCounter,
    gate: Arc<Semaphore>,
    request_delay: Duration,
}

impl<C: AsyncHttpClient> TileDownloader<C> {
    /// Creates a downloader for `server`, caching tiles in `cache`.
    pub fn new(client: C, server: TileServer, cache: TileCache, config: &DownloadConfig) -> Self {
        let counter = DownloadCounter::new(cache.root()).with_daily_limit(config.daily_limit);
        Self {
            client,
            server,
            cache,
            counter,
            gate: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            request_delay: config.request_delay,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn server(&self) -> &TileServer {
        &self.server
    }

    pub fn counter(&self) -> &DownloadCounter {
        &self.counter
    }

    /// Fetches tile `(x, y)` at `zoom` into `destination`.
    ///
    /// A cached copy is used when present. Otherwise the tile is downloaded,
    /// counted, and then copied into the cache.
    pub async fn fetch_tile(
        &self,
        zoom: u8,
        x: u32,
        y: u32,
        destination: &Path,
    ) -> Result<TileSource, DownloadError> {
        if self.cache.copy_to(zoom, x, y, destination).await? {
            debug!(zoom, x, y, "Tile served from cache");
            return Ok(TileSource::Cache);
        }

        let url = self.server.tile_url(zoom, x, y);
        let bytes = self
            .client
            .get(&url)
            .await
            .map_err(|source| DownloadError::Provider { zoom, x, y, source })?;

        if image::guess_format(&bytes).is_err() {
            return Err(DownloadError::InvalidImage { zoom, x, y });
        }

        tokio::fs::write(destination, &bytes)
            .await
            .map_err(|source| DownloadError::Io {
                path: destination.to_path_buf(),
                source,
            })?;

        let today = self.counter.increment().await?;
        self.cache.store(zoom, x, y, destination).await?;

        debug!(zoom, x, y, bytes = bytes.len(), today, "Tile downloaded");
        Ok(TileSource::Network)
    }

    /// Fetches one tile inside the concurrency gate, after the request delay.
    async fn gated_fetch(
        &self,
        zoom: u8,
        request: &FragmentRequest,
        aborted: &AtomicBool,
    ) -> Result<TileSource, DownloadError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| DownloadError::GateClosed)?;

        if aborted.load(Ordering::Acquire) {
            return Err(DownloadError::Aborted);
        }
        tokio::time::sleep(self.request_delay).await;

        self.fetch_tile(zoom, request.x, request.y, &request.destination)
            .await
            .inspect_err(|e| {
                aborted.store(true, Ordering::Release);
                error!(
                    zoom,
                    x = request.x,
                    y = request.y,
                    error = %e,
                    "Tile fetch failed"
                )
            })
    }

    /// Fetches every tile of a column concurrently.
    ///
    /// Returns the first real failure; tiles skipped because of it are not
    /// reported separately.
    pub async fn fetch_column(
        &self,
        zoom: u8,
        requests: &[FragmentRequest],
    ) -> Result<(), DownloadError> {
        let aborted = AtomicBool::new(false);
        let results =
            join_all(requests.iter().map(|r| self.gated_fetch(zoom, r, &aborted))).await;

        match results
            .into_iter()
            .filter_map(Result::err)
            .find(|e| !matches!(e, DownloadError::Aborted))
        {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fetches every tile of a row one after another.
    ///
    /// Stops at the first tile that fails.
    pub async fn fetch_row(
        &self,
        zoom: u8,
        requests: &[FragmentRequest],
    ) -> Result<(), DownloadError> {
        let aborted = AtomicBool::new(false);
        for request in requests {
            self.gated_fetch(zoom, request, &aborted).await?;
        }
        Ok(())
    }
}
