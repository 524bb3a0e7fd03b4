//! Export configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::lod::MAX_ATTEMPTS;
use crate::util::Result;

/// Switches for what an export writes besides the datasets themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    // Textures
    pub write_textures: bool,
    pub write_texture_lods: bool,
    pub texture_lod_base_size: usize, // bytes; the series stops at or below this
    pub texture_lods_base_url: String,

    // Polygon LODs
    pub write_poly_lods: bool,
    pub poly_lod_base_size: usize, // bytes of in-memory footprint
    pub poly_lods_base_url: String,
    pub poly_lod_max_attempts: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            write_textures: true,
            write_texture_lods: false,
            texture_lod_base_size: 100_000,
            texture_lods_base_url: String::new(),
            write_poly_lods: false,
            poly_lod_base_size: 100_000,
            poly_lods_base_url: String::new(),
            poly_lod_max_attempts: MAX_ATTEMPTS,
        }
    }
}

impl ExportOptions {
    /// Parse options from JSON; missing keys keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_textures(mut self, on: bool) -> Self {
        self.write_textures = on;
        self
    }

    pub fn with_texture_lods(mut self, on: bool, base_size: usize) -> Self {
        self.write_texture_lods = on;
        self.texture_lod_base_size = base_size;
        self
    }

    pub fn with_texture_lods_base_url(mut self, url: impl Into<String>) -> Self {
        self.texture_lods_base_url = url.into();
        self
    }

    pub fn with_poly_lods(mut self, on: bool, base_size: usize) -> Self {
        self.write_poly_lods = on;
        self.poly_lod_base_size = base_size;
        self
    }

    pub fn with_poly_lods_base_url(mut self, url: impl Into<String>) -> Self {
        self.poly_lods_base_url = url.into();
        self
    }

    pub fn with_poly_lod_max_attempts(mut self, n: usize) -> Self {
        self.poly_lod_max_attempts = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() -> Result<()> {
        let opts = ExportOptions::from_json_str(r#"{"write_poly_lods": true, "poly_lod_base_size": 5000}"#)?;
        assert!(opts.write_poly_lods);
        assert_eq!(opts.poly_lod_base_size, 5000);
        assert!(opts.write_textures);
        assert_eq!(opts.poly_lod_max_attempts, MAX_ATTEMPTS);
        Ok(())
    }

    #[test]
    fn test_json_file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("export.json");
        let opts = ExportOptions::default()
            .with_texture_lods(true, 2048)
            .with_texture_lods_base_url("http://host/tex/");
        std::fs::write(&path, opts.to_json()?)?;
        assert_eq!(ExportOptions::from_json_file(&path)?, opts);
        Ok(())
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(ExportOptions::from_json_str("{ nope").is_err());
    }
}
