//! On-disk tile cache.
//!
//! Tiles are stored one file per tile, grouped by zoom level:
//!
//! ```text
//! {root}/{zoom}/{zoom}-{x}-{y}.png
//! ```
//!
//! Concurrent writers to the same key are harmless because a tile's content
//! is expected to be identical on every download; a write simply replaces
//! the file.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::CacheError;

/// Disk cache for server tiles.
#[derive(Debug, Clone)]
pub struct TileCache {
    root: PathBuf,
}

impl TileCache {
    /// Creates a cache rooted at `root`. Nothing is created on disk until a
    /// tile is stored.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache key for a tile: `"{zoom}-{x}-{y}.png"`.
    pub fn key(zoom: u8, x: u32, y: u32) -> String {
        format!("{}-{}-{}.png", zoom, x, y)
    }

    /// Directory holding every cached tile of `zoom`.
    pub fn zoom_dir(&self, zoom: u8) -> PathBuf {
        self.root.join(zoom.to_string())
    }

    /// Full path of a cached tile.
    pub fn tile_path(&self, zoom: u8, x: u32, y: u32) -> PathBuf {
        self.zoom_dir(zoom).join(Self::key(zoom, x, y))
    }

    /// Creates the per-zoom directory if it does not exist yet.
    pub async fn ensure_zoom_dir(&self, zoom: u8) -> Result<PathBuf, CacheError> {
        let dir = self.zoom_dir(zoom);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| CacheError::Io {
                path: dir.clone(),
                source,
            })?;
        Ok(dir)
    }

    /// Returns the cached file for a tile when present and non-empty.
    pub async fn lookup(&self, zoom: u8, x: u32, y: u32) -> Option<PathBuf> {
        let path = self.tile_path(zoom, x, y);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                trace!(zoom, x, y, "Tile cache hit");
                Some(path)
            }
            _ => {
                trace!(zoom, x, y, "Tile cache miss");
                None
            }
        }
    }

    /// Copies a cached tile to `destination`.
    ///
    /// Returns `Ok(false)` on a cache miss.
    pub async fn copy_to(
        &self,
        zoom: u8,
        x: u32,
        y: u32,
        destination: &Path,
    ) -> Result<bool, CacheError> {
        let Some(cached) = self.lookup(zoom, x, y).await else {
            return Ok(false);
        };

        tokio::fs::copy(&cached, destination)
            .await
            .map_err(|source| CacheError::Io {
                path: destination.to_path_buf(),
                source,
            })?;
        Ok(true)
    }

    /// Stores a copy of `source` as the cached tile.
    pub async fn store(&self, zoom: u8, x: u32, y: u32, source: &Path) -> Result<(), CacheError> {
        self.ensure_zoom_dir(zoom).await?;
        let path = self.tile_path(zoom, x, y);

        tokio::fs::copy(source, &path)
            .await
            .map_err(|e| CacheError::Io {
                path: path.clone(),
                source: e,
            })?;

        debug!(zoom, x, y, path = %path.display(), "Stored tile in cache");
        Ok(())
    }
}
