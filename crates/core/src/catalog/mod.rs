//! Ebook catalog - the Calibre library books are read from and imported into.
//!
//! The catalog lists every book with the paths of its stored formats, and
//! imports freshly converted files back into the library.

mod calibredb;
mod config;
mod types;

pub use calibredb::CalibreDb;
pub use config::CatalogConfig;
pub use types::*;

use async_trait::async_trait;
use std::path::PathBuf;

/// Trait for ebook library access.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the name of this catalog implementation.
    fn name(&self) -> &str;

    /// List every book in the library.
    async fn list(&self) -> Result<Vec<BookRecord>, CatalogError>;

    /// Import the given files into the library.
    ///
    /// Files are attached to existing books or added as new ones, as the
    /// backend decides. An empty slice is a no-op.
    async fn add(&self, paths: &[PathBuf]) -> Result<(), CatalogError>;
}
