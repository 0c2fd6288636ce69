//! Argument groups and helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::Args;
use tilemosaic::config::ConfigFile;
use tilemosaic::coord::GeoPoint;
use tilemosaic::provider::TileServer;
use tilemosaic::zoom::ZoomConstraints;

use crate::error::CliError;

/// Coordinates given on the command line and/or in a file.
#[derive(Debug, Args)]
pub struct PointArgs {
    /// Coordinate as lon,lat (repeatable)
    #[arg(
        short,
        long = "point",
        value_name = "LON,LAT",
        allow_hyphen_values = true
    )]
    pub points: Vec<GeoPoint>,

    /// File with one lon,lat per line; blank lines and # comments are skipped
    #[arg(long, value_name = "FILE")]
    pub points_file: Option<PathBuf>,
}

impl PointArgs {
    /// Collects command line points followed by file points.
    pub fn collect(&self) -> Result<Vec<GeoPoint>, CliError> {
        let mut points = self.points.clone();
        if let Some(path) = &self.points_file {
            points.extend(read_points_file(path)?);
        }
        if points.is_empty() {
            return Err(CliError::InvalidInput(
                "No coordinates given. Use --point LON,LAT or --points-file FILE".to_string(),
            ));
        }
        Ok(points)
    }
}

/// Tile budget overrides; unset values fall back to the `[mosaic]` section.
#[derive(Debug, Args)]
pub struct BudgetArgs {
    /// Maximum mosaic width in tiles
    #[arg(long, value_name = "TILES")]
    pub max_width: Option<usize>,

    /// Maximum mosaic height in tiles
    #[arg(long, value_name = "TILES")]
    pub max_height: Option<usize>,

    /// Highest zoom level considered by the search
    #[arg(long, value_name = "ZOOM")]
    pub max_zoom: Option<u8>,

    /// Edge tiles are dropped when every point lies within this many pixels of the edge
    #[arg(long, value_name = "PIXELS")]
    pub trim_margin: Option<u32>,
}

impl BudgetArgs {
    /// Merges the overrides into the configured constraints.
    pub fn constraints(&self, config: &ConfigFile) -> Result<ZoomConstraints, CliError> {
        let mut constraints = config.zoom_constraints();
        if let Some(width) = self.max_width {
            constraints.max_tiles_width = width;
        }
        if let Some(height) = self.max_height {
            constraints.max_tiles_height = height;
        }
        if let Some(zoom) = self.max_zoom {
            constraints.max_zoom = zoom;
        }
        if let Some(margin) = self.trim_margin {
            constraints.trim_margin = margin;
        }

        if constraints.max_tiles_width == 0 || constraints.max_tiles_height == 0 {
            return Err(CliError::InvalidInput(
                "Tile budget must be at least 1x1".to_string(),
            ));
        }
        Ok(constraints)
    }
}

/// Tile server and cache overrides.
#[derive(Debug, Args)]
pub struct ProviderArgs {
    /// Tile server URL prefix (overrides provider.url)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// API key appended to tile requests (overrides provider.api_key)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Tile cache directory (overrides cache.directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

impl ProviderArgs {
    /// Resolves the tile server; the command line takes precedence over config.
    pub fn tile_server(&self, config: &ConfigFile) -> Result<TileServer, CliError> {
        let url = self
            .url
            .clone()
            .or_else(|| config.provider.url.clone())
            .ok_or_else(|| {
                CliError::Config(
                    "No tile server configured. \
                     Set provider.url with 'tilemosaic config set provider.url URL' or use --url"
                        .to_string(),
                )
            })?;
        let api_key = self
            .api_key
            .clone()
            .or_else(|| config.provider.api_key.clone());
        Ok(TileServer::new(url, api_key))
    }

    pub fn cache_dir(&self, config: &ConfigFile) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| config.cache.directory.clone())
    }
}

/// Parses a points file: one `lon,lat` per line.
pub fn read_points_file(path: &Path) -> Result<Vec<GeoPoint>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadInput {
        path: path.display().to_string(),
        source,
    })?;
    parse_points(&content)
}

fn parse_points(content: &str) -> Result<Vec<GeoPoint>, CliError> {
    content
        .lines()
        .enumerate()
        .map(|(number, line)| (number + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            line.parse::<GeoPoint>()
                .map_err(|e| CliError::InvalidInput(format!("Line {}: {}", number, e)))
        })
        .collect()
}
