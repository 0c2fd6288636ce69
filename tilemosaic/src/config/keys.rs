//! Addressable configuration keys.
//!
//! Every setting is reachable as `section.key`, which lets the file loader,
//! the writer and the `config get/set` commands share one parser per value.

use std::path::PathBuf;
use std::str::FromStr;

use crate::coord::{MAX_ZOOM, TILE_SIZE};

use super::{ConfigError, ConfigFile};

/// A single `section.key` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ProviderUrl,
    ProviderApiKey,
    CacheDirectory,
    DownloadMaxConcurrent,
    DownloadRequestDelayMs,
    DownloadTimeoutSecs,
    DownloadDailyLimit,
    MosaicMaxZoom,
    MosaicMaxTilesWidth,
    MosaicMaxTilesHeight,
    MosaicTrimMarginPixels,
}

const ALL_KEYS: [ConfigKey; 11] = [
    ConfigKey::ProviderUrl,
    ConfigKey::ProviderApiKey,
    ConfigKey::CacheDirectory,
    ConfigKey::DownloadMaxConcurrent,
    ConfigKey::DownloadRequestDelayMs,
    ConfigKey::DownloadTimeoutSecs,
    ConfigKey::DownloadDailyLimit,
    ConfigKey::MosaicMaxZoom,
    ConfigKey::MosaicMaxTilesWidth,
    ConfigKey::MosaicMaxTilesHeight,
    ConfigKey::MosaicTrimMarginPixels,
];

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ProviderUrl | ConfigKey::ProviderApiKey => "provider",
            ConfigKey::CacheDirectory => "cache",
            ConfigKey::DownloadMaxConcurrent
            | ConfigKey::DownloadRequestDelayMs
            | ConfigKey::DownloadTimeoutSecs
            | ConfigKey::DownloadDailyLimit => "download",
            ConfigKey::MosaicMaxZoom
            | ConfigKey::MosaicMaxTilesWidth
            | ConfigKey::MosaicMaxTilesHeight
            | ConfigKey::MosaicTrimMarginPixels => "mosaic",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::ProviderUrl => "url",
            ConfigKey::ProviderApiKey => "api_key",
            ConfigKey::CacheDirectory => "directory",
            ConfigKey::DownloadMaxConcurrent => "max_concurrent",
            ConfigKey::DownloadRequestDelayMs => "request_delay_ms",
            ConfigKey::DownloadTimeoutSecs => "timeout_secs",
            ConfigKey::DownloadDailyLimit => "daily_limit",
            ConfigKey::MosaicMaxZoom => "max_zoom",
            ConfigKey::MosaicMaxTilesWidth => "max_tiles_width",
            ConfigKey::MosaicMaxTilesHeight => "max_tiles_height",
            ConfigKey::MosaicTrimMarginPixels => "trim_margin_pixels",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ProviderUrl => config.provider.url.clone().unwrap_or_default(),
            ConfigKey::ProviderApiKey => config.provider.api_key.clone().unwrap_or_default(),
            ConfigKey::CacheDirectory => config.cache.directory.display().to_string(),
            ConfigKey::DownloadMaxConcurrent => config.download.max_concurrent.to_string(),
            ConfigKey::DownloadRequestDelayMs => config.download.request_delay_ms.to_string(),
            ConfigKey::DownloadTimeoutSecs => config.download.timeout_secs.to_string(),
            ConfigKey::DownloadDailyLimit => config.download.daily_limit.to_string(),
            ConfigKey::MosaicMaxZoom => config.mosaic.max_zoom.to_string(),
            ConfigKey::MosaicMaxTilesWidth => config.mosaic.max_tiles_width.to_string(),
            ConfigKey::MosaicMaxTilesHeight => config.mosaic.max_tiles_height.to_string(),
            ConfigKey::MosaicTrimMarginPixels => config.mosaic.trim_margin_pixels.to_string(),
        }
    }

    /// Parses and stores `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::ProviderUrl => config.provider.url = non_empty(value),
            ConfigKey::ProviderApiKey => config.provider.api_key = non_empty(value),
            ConfigKey::CacheDirectory => {
                if value.is_empty() {
                    return Err(self.invalid(value));
                }
                config.cache.directory = expand_tilde(value);
            }
            ConfigKey::DownloadMaxConcurrent => {
                config.download.max_concurrent = self.parse_at_least(value, 1)?
            }
            ConfigKey::DownloadRequestDelayMs => config.download.request_delay_ms = self.parse(value)?,
            ConfigKey::DownloadTimeoutSecs => {
                config.download.timeout_secs = self.parse_at_least(value, 1)?
            }
            ConfigKey::DownloadDailyLimit => config.download.daily_limit = self.parse(value)?,
            ConfigKey::MosaicMaxZoom => {
                let zoom: u8 = self.parse(value)?;
                if zoom > MAX_ZOOM {
                    return Err(self.invalid(value));
                }
                config.mosaic.max_zoom = zoom;
            }
            ConfigKey::MosaicMaxTilesWidth => {
                config.mosaic.max_tiles_width = self.parse_at_least(value, 1)?
            }
            ConfigKey::MosaicMaxTilesHeight => {
                config.mosaic.max_tiles_height = self.parse_at_least(value, 1)?
            }
            ConfigKey::MosaicTrimMarginPixels => {
                let margin: u32 = self.parse(value)?;
                if margin >= TILE_SIZE {
                    return Err(self.invalid(value));
                }
                config.mosaic.trim_margin_pixels = margin;
            }
        }
        Ok(())
    }

    fn invalid(&self, value: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.section().to_string(),
            key: self.key_name().to_string(),
            value: value.to_string(),
        }
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigError> {
        value.parse().map_err(|_| self.invalid(value))
    }

    fn parse_at_least<T: FromStr + PartialOrd>(&self, value: &str, min: T) -> Result<T, ConfigError> {
        let parsed: T = self.parse(value)?;
        if parsed < min {
            return Err(self.invalid(value));
        }
        Ok(parsed)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or(ConfigError::UnknownKey(s))
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if value == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(value)),
        _ => PathBuf::from(value),
    }
}
