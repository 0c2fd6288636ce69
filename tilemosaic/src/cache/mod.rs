//! Local tile storage.
//!
//! - [`TileCache`] keeps downloaded tiles on disk so repeated mosaics of the
//!   same area never hit the network twice.
//! - [`DownloadCounter`] tracks how many tiles were downloaded today.
//! - [`disk_cache_stats`] and [`clear_disk_cache`] back the CLI `cache`
//!   command.

mod counter;
mod disk;
mod maintenance;

pub use counter::{DownloadCounter, COUNTER_FILE};
pub use disk::TileCache;
pub use maintenance::{clear_disk_cache, disk_cache_stats, ClearResult};

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error on a cache path.
    #[error("Cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The download counter could not be serialized.
    #[error("Download counter error: {0}")]
    Counter(String),
}
