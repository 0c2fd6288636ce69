//! TileMosaic - square map images from slippy-map tiles
//!
//! Given a set of geographic coordinates, this library finds the most
//! detailed zoom level at which they fit a small tile budget, downloads the
//! covering tiles (preferring a local disk cache), composites them into one
//! PNG and, when needed, pads the result to an exact 2x2 tile square.
//!
//! # Modules
//!
//! - [`coord`] - Web Mercator tile math
//! - [`bbox`] - tile bounding boxes with antimeridian wrap and edge trimming
//! - [`zoom`] - zoom level selection
//! - [`provider`] - HTTP access and tile URL templates
//! - [`cache`] - disk tile cache and daily download counter
//! - [`download`] - cache-first, rate-limited tile fetching
//! - [`mosaic`] - compositing tiles into strips and grids
//! - [`padding`] - squaring one-tile-wide or one-tile-tall mosaics
//! - [`transform`] - bounding boxes one zoom level deeper
//! - [`service`] - the end-to-end pipeline
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilemosaic::prelude::*;
//!
//! let config = ConfigFile::load()?;
//! let downloader = TileDownloader::new(
//!     AsyncReqwestClient::new()?,
//!     TileServer::new("https://tiles.example.com", None),
//!     TileCache::new(&config.cache.directory),
//!     &config.download_config(),
//! );
//! let service = MosaicService::new(MosaicAssembler::new(Arc::new(downloader)));
//!
//! let request = MosaicRequest {
//!     output: "airfield.png".into(),
//!     constraints: config.zoom_constraints(),
//!     zoom: None,
//!     square: true,
//! };
//! let outcome = service.build(&[GeoPoint::new(151.177, -33.946)], &request).await?;
//! println!("zoom {} -> {}", outcome.zoom, outcome.path.display());
//! ```

pub mod bbox;
pub mod cache;
pub mod config;
pub mod coord;
pub mod download;
pub mod files;
pub mod logging;
pub mod mosaic;
pub mod padding;
pub mod provider;
pub mod report;
pub mod service;
pub mod transform;
pub mod zoom;

/// Commonly used types.
pub mod prelude {
    pub use crate::bbox::BoundingBox;
    pub use crate::cache::TileCache;
    pub use crate::config::ConfigFile;
    pub use crate::coord::{GeoPoint, Tile};
    pub use crate::download::{DownloadConfig, TileDownloader};
    pub use crate::mosaic::MosaicAssembler;
    pub use crate::padding::PaddingMethod;
    pub use crate::provider::{AsyncHttpClient, AsyncReqwestClient, TileServer};
    pub use crate::service::{MosaicOutcome, MosaicRequest, MosaicService};
    pub use crate::zoom::ZoomConstraints;
}
