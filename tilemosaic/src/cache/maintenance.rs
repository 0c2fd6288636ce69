//! Disk cache statistics and clearing.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Outcome of clearing the disk cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearResult {
    pub files_deleted: u64,
    pub bytes_freed: u64,
}

/// Lists every cached tile file (`{root}/{zoom}/*.png`).
fn cached_tiles(cache_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*/*.png",
        glob::Pattern::escape(&cache_dir.to_string_lossy())
    );
    let paths = glob::glob(&pattern)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    Ok(paths.filter_map(Result::ok).filter(|p| p.is_file()).collect())
}

/// Returns `(file_count, total_bytes)` of cached tiles.
///
/// A missing cache directory counts as empty.
pub fn disk_cache_stats(cache_dir: &Path) -> io::Result<(u64, u64)> {
    if !cache_dir.exists() {
        return Ok((0, 0));
    }

    let mut files = 0;
    let mut bytes = 0;
    for path in cached_tiles(cache_dir)? {
        files += 1;
        bytes += path.metadata()?.len();
    }
    Ok((files, bytes))
}

/// Deletes every cached tile and the emptied zoom directories.
pub fn clear_disk_cache(cache_dir: &Path) -> io::Result<ClearResult> {
    let mut result = ClearResult::default();
    if !cache_dir.exists() {
        return Ok(result);
    }

    for path in cached_tiles(cache_dir)? {
        let size = path.metadata().map(|m| m.len()).unwrap_or(0);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                result.files_deleted += 1;
                result.bytes_freed += size;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete cached tile"),
        }
    }

    for entry in std::fs::read_dir(cache_dir)?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            // Only succeeds for directories we just emptied
            if std::fs::remove_dir(&path).is_ok() {
                debug!(path = %path.display(), "Removed empty zoom directory");
            }
        }
    }

    Ok(result)
}
