//! Tile URL construction.
//!
//! Tiles are requested from a standard XYZ slippy-map endpoint:
//!
//! ```text
//! {prefix}/{zoom}/{x}/{y}.png?apikey={key}
//! ```
//!
//! The API key is an opaque credential passed through unchanged.

/// A slippy-map tile server endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileServer {
    prefix: String,
    api_key: Option<String>,
}

impl TileServer {
    /// Creates a tile server from its URL prefix and optional API key.
    ///
    /// Trailing slashes on the prefix are ignored. An empty key is treated
    /// as no key.
    pub fn new(prefix: impl Into<String>, api_key: Option<String>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        let api_key = api_key.filter(|k| !k.is_empty());
        Self { prefix, api_key }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Builds the URL of tile `(x, y)` at `zoom`.
    pub fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        match &self.api_key {
            Some(key) => format!("{}/{}/{}/{}.png?apikey={}", self.prefix, zoom, x, y, key),
            None => format!("{}/{}/{}/{}.png", self.prefix, zoom, x, y),
        }
    }
}
