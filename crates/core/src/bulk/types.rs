//! Types for bulk operations.

use std::path::{Path, PathBuf};

use crate::catalog::BookRecord;
use crate::converter::{InvalidFormat, TargetFormat};
use crate::processor::{ConversionReport, ConversionTask, PoolConfig};

/// Parameters of an "add missing format" run.
#[derive(Debug, Clone)]
pub struct BulkRequest {
    /// Format every book should end up having.
    pub format: TargetFormat,
    /// Worker pool settings.
    pub pool: PoolConfig,
    /// Simulate the run without converting or importing.
    pub dry_run: bool,
    /// Where converted files are written. A temporary directory is created
    /// when unset.
    pub output_dir: Option<PathBuf>,
    /// Keep the temporary directory after importing.
    pub keep_output: bool,
}

impl BulkRequest {
    /// Creates a request for the given format with default pool settings.
    pub fn new(format: impl AsRef<str>) -> Result<Self, InvalidFormat> {
        Ok(Self {
            format: TargetFormat::new(format)?,
            pool: PoolConfig::default(),
            dry_run: false,
            output_dir: None,
            keep_output: false,
        })
    }

    /// Sets the pool configuration.
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Sets the dry-run flag.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Writes converted files to `dir` instead of a temporary directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Keeps the temporary output directory.
    pub fn with_keep_output(mut self, keep: bool) -> Self {
        self.keep_output = keep;
        self
    }

    /// Builds the conversion task for one book.
    pub fn task_for(&self, book: &BookRecord, output_dir: &Path) -> ConversionTask {
        ConversionTask::new(
            book.id.to_string(),
            book.title.clone(),
            book.formats.clone(),
            output_dir,
            self.format.clone(),
        )
        .with_dry_run(self.dry_run)
    }
}

/// Outcome of an "add missing format" run.
#[derive(Debug, Clone, Default)]
pub struct BulkSummary {
    /// Output directory, if it still exists on disk.
    pub output_dir: Option<PathBuf>,
    /// Number of books in the library.
    pub library_size: usize,
    /// Number of books missing the format (one task each).
    pub considered: usize,
    /// Pool report for the submitted tasks.
    pub report: ConversionReport,
    /// Whether the produced files were imported into the library.
    pub imported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_format() {
        let request = BulkRequest::new(".EPUB").unwrap();
        assert_eq!(request.format.as_str(), ".epub");
        assert_eq!(request.pool.workers, 8);
        assert!(BulkRequest::new("").is_err());
    }

    #[test]
    fn test_task_for_book() {
        let request = BulkRequest::new("mobi").unwrap().with_dry_run(true);
        let book = BookRecord::new(42, "Dune", vec![PathBuf::from("/lib/Dune.epub")]);

        let task = request.task_for(&book, Path::new("/tmp/out"));
        assert_eq!(task.id, "42");
        assert_eq!(task.title, "Dune");
        assert_eq!(task.candidates, book.formats);
        assert_eq!(task.output_dir, PathBuf::from("/tmp/out"));
        assert!(task.dry_run);
    }
}
