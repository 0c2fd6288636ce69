//! Fragment file naming.
//!
//! Every file produced while building one image derives from a single base
//! path without extension:
//!
//! ```text
//! {base}_{strip}_{inner}.png   single tile
//! {base}_{strip}.png           assembled column or row
//! {base}.png                   final image
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Naming scheme for the fragments of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentPaths {
    base: PathBuf,
}

impl FragmentPaths {
    /// Creates the scheme for `output`. A trailing `.png` is stripped.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        let mut base: PathBuf = output.into();
        if base
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        {
            base.set_extension("");
        }
        Self { base }
    }

    /// Base path without extension.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory the fragments are written to.
    pub fn directory(&self) -> Option<&Path> {
        self.base.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Tile `inner` of column or row `strip`.
    pub fn tile(&self, strip: usize, inner: usize) -> PathBuf {
        self.with_tail(&format!("_{}_{}.png", strip, inner))
    }

    /// Assembled column or row `id`.
    pub fn strip(&self, id: usize) -> PathBuf {
        self.with_tail(&format!("_{}.png", id))
    }

    /// Final composited image.
    pub fn image(&self) -> PathBuf {
        self.with_tail(".png")
    }

    /// Scheme nested under this one, e.g. `{base}_pad`.
    pub fn nested(&self, name: &str) -> Self {
        Self {
            base: self.with_tail(&format!("_{}", name)),
        }
    }

    /// Glob matching every tile and strip fragment, but not the final image.
    pub fn cleanup_pattern(&self) -> String {
        format!(
            "{}_*.png",
            glob::Pattern::escape(&self.base.to_string_lossy())
        )
    }

    fn with_tail(&self, tail: &str) -> PathBuf {
        let mut name: OsString = self.base.clone().into_os_string();
        name.push(tail);
        PathBuf::from(name)
    }
}
