//! Convert every library book that lacks a format, then import the results.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::catalog::{books_missing_format, sort_by_title, Catalog};
use crate::converter::Converter;
use crate::processor::{separate_colliding_outputs, ConversionPool};

use super::error::BulkError;
use super::types::{BulkRequest, BulkSummary};

/// Prefix of temporary output directories.
const TEMP_DIR_PREFIX: &str = "ebook_convert";

/// Where converted files go for one run.
enum OutputDir {
    Configured(PathBuf),
    Temporary(TempDir),
}

impl OutputDir {
    fn prepare(request: &BulkRequest) -> Result<Self, BulkError> {
        match &request.output_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .map_err(|e| BulkError::output_dir(Some(dir), e))?;
                Ok(Self::Configured(dir.clone()))
            }
            None => tempfile::Builder::new()
                .prefix(TEMP_DIR_PREFIX)
                .tempdir()
                .map(Self::Temporary)
                .map_err(|e| BulkError::output_dir(None, e)),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Configured(dir) => dir,
            Self::Temporary(dir) => dir.path(),
        }
    }

    /// Returns the directory if it stays on disk.
    fn finish(self, keep: bool) -> Result<Option<PathBuf>, BulkError> {
        match self {
            Self::Configured(dir) => Ok(Some(dir)),
            Self::Temporary(dir) if keep => Ok(Some(dir.keep())),
            Self::Temporary(dir) => {
                let path = dir.path().to_path_buf();
                dir.close()
                    .map_err(|e| BulkError::output_dir(Some(&path), e))?;
                Ok(None)
            }
        }
    }
}

/// Converts every book that has no file in `request.format` and imports the
/// produced files into the catalog.
///
/// Books are processed in title order. Per-book failures are reported in the
/// summary and do not abort the run.
pub async fn add_missing_format<K, C>(
    catalog: &K,
    converter: C,
    request: BulkRequest,
) -> Result<BulkSummary, BulkError>
where
    K: Catalog + ?Sized,
    C: Converter + 'static,
{
    request.pool.validate()?;

    let books = catalog.list().await?;
    let library_size = books.len();
    let mut missing = books_missing_format(books, &request.format);
    sort_by_title(&mut missing);

    info!(
        catalog = catalog.name(),
        library_size,
        missing = missing.len(),
        format = %request.format,
        "Scanned library"
    );

    if missing.is_empty() {
        info!(format = %request.format, "Every book already has the format");
        return Ok(BulkSummary {
            library_size,
            ..BulkSummary::default()
        });
    }

    let output = OutputDir::prepare(&request)?;
    info!(output_dir = %output.path().display(), "Writing converted files");

    let mut tasks: Vec<_> = missing
        .iter()
        .map(|book| request.task_for(book, output.path()))
        .collect();
    let separated = separate_colliding_outputs(&mut tasks);
    if separated > 0 {
        debug!(separated, "Books sharing an output name get their own directory");
    }
    let considered = tasks.len();

    let pool = ConversionPool::new(request.pool.clone(), converter)?;
    let converted = pool.convert_all(tasks).await;

    let imported = match &converted {
        Ok(report) if !report.produced.is_empty() => {
            let added = catalog.add(&report.produced).await;
            if let Err(ref e) = added {
                warn!(error = %e, "Import failed");
            }
            Some(added)
        }
        _ => None,
    };

    pool.shutdown().await?;
    let report = converted?;
    let imported = match imported {
        Some(added) => {
            added?;
            true
        }
        None => false,
    };

    info!(
        considered,
        produced = report.produced.len(),
        failed = report.failures.len(),
        imported,
        "Bulk conversion finished"
    );

    let output_dir = output.finish(request.keep_output)?;
    Ok(BulkSummary {
        output_dir,
        library_size,
        considered,
        report,
        imported,
    })
}
