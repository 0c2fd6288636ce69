//! File operations that retry on transient failures.
//!
//! Deleting or moving a freshly written image occasionally fails while
//! another process (an indexer, an antivirus scanner, an image viewer) still
//! holds the file. These helpers retry a bounded number of times with a fixed
//! delay before giving up.

use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

/// Attempts made before a delete or move is reported as failed.
pub const FILE_RETRY_ATTEMPTS: u32 = 5;

/// Pause between attempts.
pub const FILE_RETRY_DELAY: Duration = Duration::from_millis(100);

fn is_permanent(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput
    )
}

async fn with_retry<F, Fut>(operation: &str, path: &Path, mut attempt: F) -> io::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Ok(()) => return Ok(()),
            Err(e) if is_permanent(&e) || tries >= FILE_RETRY_ATTEMPTS => {
                warn!(
                    operation,
                    path = %path.display(),
                    tries,
                    error = %e,
                    "File operation failed"
                );
                return Err(e);
            }
            Err(e) => {
                debug!(operation, path = %path.display(), tries, error = %e, "Retrying file operation");
                tokio::time::sleep(FILE_RETRY_DELAY).await;
            }
        }
    }
}

/// Deletes `path`, retrying on transient errors. A missing file is not an error.
pub async fn remove_with_retry(path: &Path) -> io::Result<()> {
    let result = with_retry("delete", path, || tokio::fs::remove_file(path)).await;
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Moves `from` to `to`, replacing any existing file at `to`.
pub async fn rename_with_retry(from: &Path, to: &Path) -> io::Result<()> {
    with_retry("move", from, || tokio::fs::rename(from, to)).await
}

/// Deletes every file matching a glob `pattern`.
///
/// Returns the number of files removed. Stops at the first file that cannot
/// be deleted.
pub async fn remove_matching(pattern: &str) -> io::Result<usize> {
    let paths = glob::glob(pattern)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let mut removed = 0;
    for path in paths.filter_map(Result::ok) {
        remove_with_retry(&path).await?;
        removed += 1;
    }
    Ok(removed)
}
