//! Error types for bulk operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::processor::PoolError;

/// Errors that abort a bulk run. Individual conversion failures are not
/// errors; they are listed in the run's report.
#[derive(Debug, Error)]
pub enum BulkError {
    /// Listing or importing failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The conversion pool failed.
    #[error("Conversion pool error: {0}")]
    Pool(#[from] PoolError),

    /// The output directory could not be created or cleaned up.
    #[error("Output directory error ({path}): {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl BulkError {
    pub(crate) fn output_dir(path: Option<&PathBuf>, source: std::io::Error) -> Self {
        Self::OutputDir {
            path: path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "temporary".to_string()),
            source,
        }
    }
}
