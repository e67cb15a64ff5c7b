//! Configuration for the catalog module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the calibredb-backed catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the Calibre library (`--with-library`).
    #[serde(default)]
    pub library: Option<PathBuf>,

    /// Path to the calibredb binary.
    #[serde(default = "default_calibredb_path")]
    pub calibredb_path: PathBuf,
}

fn default_calibredb_path() -> PathBuf {
    PathBuf::from("calibredb")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            library: None,
            calibredb_path: default_calibredb_path(),
        }
    }
}

impl CatalogConfig {
    /// Creates a config pointing at the given library.
    pub fn for_library(library: impl Into<PathBuf>) -> Self {
        Self {
            library: Some(library.into()),
            ..Self::default()
        }
    }

    /// Sets the calibredb binary path.
    pub fn with_calibredb_path(mut self, path: PathBuf) -> Self {
        self.calibredb_path = path;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_library() {
        let config = CatalogConfig::for_library("/books");
        assert_eq!(config.library, Some(PathBuf::from("/books")));
        assert_eq!(config.calibredb_path, PathBuf::from("calibredb"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: CatalogConfig = toml::from_str(r#"library = "/books""#).unwrap();
        assert_eq!(config.library, Some(PathBuf::from("/books")));
        assert_eq!(config.calibredb_path, PathBuf::from("calibredb"));
    }
}
