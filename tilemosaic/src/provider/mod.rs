//! Tile server access.
//!
//! This module provides the HTTP capability used to download tiles and the
//! URL template of the slippy-map server they come from.
//!
//! ```ignore
//! use tilemosaic::provider::{AsyncReqwestClient, TileServer};
//!
//! let client = AsyncReqwestClient::new()?;
//! let server = TileServer::new("https://tiles.example.com", Some(api_key));
//! let bytes = client.get(&server.tile_url(5, 16, 16)).await?;
//! ```

mod http;
mod tile_server;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use tile_server::TileServer;
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::{png_tile, MockAsyncHttpClient};
