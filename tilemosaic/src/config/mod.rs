//! INI configuration file.
//!
//! Settings live in `~/.config/tilemosaic/config.ini` (platform config
//! directory) and are grouped into four sections:
//!
//! ```ini
//! [provider]
//! url = https://tiles.example.com
//! api_key =
//!
//! [cache]
//! directory = ~/.cache/tilemosaic
//!
//! [download]
//! max_concurrent = 4
//! request_delay_ms = 50
//! timeout_secs = 30
//! daily_limit = 0
//!
//! [mosaic]
//! max_zoom = 18
//! max_tiles_width = 2
//! max_tiles_height = 2
//! trim_margin_pixels = 20
//! ```
//!
//! A missing file yields the defaults. Unknown keys are ignored.

mod keys;

pub use keys::ConfigKey;

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::bbox::DEFAULT_TRIM_MARGIN_PIXELS;
use crate::coord::MAX_ZOOM;
use crate::download::{DownloadConfig, DEFAULT_MAX_CONCURRENT};
use crate::provider::{TileServer, DEFAULT_TIMEOUT_SECS};
use crate::zoom::ZoomConstraints;

/// Application directory name under the platform config and cache dirs.
pub const APP_DIR: &str = "tilemosaic";

/// Configuration file name.
pub const CONFIG_FILE: &str = "config.ini";

/// Errors from loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderSettings {
    /// Tile server prefix, e.g. `https://tiles.example.com`.
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub max_concurrent: usize,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    /// Soft daily limit, 0 for none.
    pub daily_limit: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            request_delay_ms: 50,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            daily_limit: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicSettings {
    pub max_zoom: u8,
    pub max_tiles_width: usize,
    pub max_tiles_height: usize,
    pub trim_margin_pixels: u32,
}

impl Default for MosaicSettings {
    fn default() -> Self {
        Self {
            max_zoom: MAX_ZOOM,
            max_tiles_width: 2,
            max_tiles_height: 2,
            trim_margin_pixels: DEFAULT_TRIM_MARGIN_PIXELS,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub download: DownloadSettings,
    pub mosaic: MosaicSettings,
}

impl ConfigFile {
    /// Loads the configuration from [`config_file_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads the configuration from `path`, or the defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(config);
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Writes the configuration to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Writes every setting to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }

        ini.write_to_file(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Tile server from the provider section, if a URL is configured.
    pub fn tile_server(&self) -> Option<TileServer> {
        self.provider
            .url
            .as_deref()
            .map(|url| TileServer::new(url, self.provider.api_key.clone()))
    }

    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            max_concurrent: self.download.max_concurrent,
            request_delay: Duration::from_millis(self.download.request_delay_ms),
            daily_limit: self.download.daily_limit,
        }
    }

    pub fn zoom_constraints(&self) -> ZoomConstraints {
        ZoomConstraints {
            max_tiles_width: self.mosaic.max_tiles_width,
            max_tiles_height: self.mosaic.max_tiles_height,
            max_zoom: self.mosaic.max_zoom,
            trim_margin: self.mosaic.trim_margin_pixels,
        }
    }
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Default tile cache directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Formats a byte count for humans, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
