//! Daily download counter.
//!
//! Counts tiles fetched from the network per local calendar day so users can
//! keep an eye on API quota. The count is persisted as a small JSON document
//! under the cache root and resets when the date changes.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use super::CacheError;

/// File name of the persisted counter inside the cache root.
pub const COUNTER_FILE: &str = "download_counter.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CounterState {
    date: NaiveDate,
    count: u64,
}

/// Persistent per-day download counter.
#[derive(Debug)]
pub struct DownloadCounter {
    path: PathBuf,
    /// Soft limit: exceeding it logs a warning, nothing is blocked.
    daily_limit: Option<u64>,
    // Serializes read-modify-write cycles between concurrent downloads.
    lock: Mutex<()>,
}

impl DownloadCounter {
    /// Creates a counter stored in `cache_root`.
    pub fn new(cache_root: &Path) -> Self {
        Self {
            path: cache_root.join(COUNTER_FILE),
            daily_limit: None,
            lock: Mutex::new(()),
        }
    }

    /// Sets a soft daily limit. Zero disables it.
    pub fn with_daily_limit(mut self, limit: u64) -> Self {
        self.daily_limit = (limit > 0).then_some(limit);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records one download for today and returns today's total.
    pub async fn increment(&self) -> Result<u64, CacheError> {
        self.increment_on(Local::now().date_naive()).await
    }

    /// Number of downloads recorded today.
    pub async fn today(&self) -> Result<u64, CacheError> {
        self.count_on(Local::now().date_naive()).await
    }

    async fn increment_on(&self, date: NaiveDate) -> Result<u64, CacheError> {
        let _guard = self.lock.lock().await;

        let mut state = match self.read_state().await? {
            Some(state) if state.date == date => state,
            _ => CounterState { date, count: 0 },
        };
        state.count += 1;

        self.write_state(&state).await?;

        if let Some(limit) = self.daily_limit {
            if state.count == limit + 1 {
                warn!(
                    count = state.count,
                    limit, "Daily tile download limit exceeded"
                );
            }
        }
        Ok(state.count)
    }

    async fn count_on(&self, date: NaiveDate) -> Result<u64, CacheError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_state()
            .await?
            .filter(|s| s.date == date)
            .map_or(0, |s| s.count))
    }

    async fn read_state(&self) -> Result<Option<CounterState>, CacheError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str(&text) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                // A corrupt counter only costs today's tally
                warn!(path = %self.path.display(), error = %e, "Resetting unreadable download counter");
                Ok(None)
            }
        }
    }

    async fn write_state(&self, state: &CounterState) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let json = serde_json::to_string(state).map_err(|e| CacheError::Counter(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| CacheError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
