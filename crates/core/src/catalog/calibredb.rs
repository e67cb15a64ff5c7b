//! Catalog backed by Calibre's `calibredb` command line tool.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::types::{BookRecord, CatalogError};
use super::Catalog;

/// Fields requested from `calibredb list`.
const LIST_FIELDS: &str = "author_sort,authors,comments,cover,formats,identifiers,isbn,\
last_modified,pubdate,publisher,rating,series,series_index,size,tags,timestamp,title,uuid";

/// Catalog that shells out to `calibredb`.
pub struct CalibreDb {
    calibredb_path: PathBuf,
    library: PathBuf,
}

impl CalibreDb {
    /// Creates a catalog for the library at `library`.
    pub fn new(library: impl Into<PathBuf>) -> Self {
        Self {
            calibredb_path: PathBuf::from("calibredb"),
            library: library.into(),
        }
    }

    /// Sets the calibredb binary path.
    pub fn with_calibredb_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibredb_path = path.into();
        self
    }

    /// Library this catalog operates on.
    pub fn library(&self) -> &Path {
        &self.library
    }

    fn list_args(&self) -> Vec<String> {
        vec![
            "list".to_string(),
            "--fields".to_string(),
            LIST_FIELDS.to_string(),
            "--for-machine".to_string(),
            "--with-library".to_string(),
            self.library.to_string_lossy().to_string(),
        ]
    }

    fn add_args(&self, paths: &[PathBuf]) -> Vec<String> {
        let mut args = vec![
            "add".to_string(),
            "--with-library".to_string(),
            self.library.to_string_lossy().to_string(),
        ];
        args.extend(paths.iter().map(|p| p.to_string_lossy().to_string()));
        args
    }

    /// Runs calibredb and returns its stdout.
    async fn run(&self, command: &str, args: &[String]) -> Result<Vec<u8>, CatalogError> {
        debug!(
            program = %self.calibredb_path.display(),
            ?args,
            "Running calibredb"
        );

        let output = Command::new(&self.calibredb_path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CatalogError::NotFound {
                        path: self.calibredb_path.clone(),
                    }
                } else {
                    CatalogError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CatalogError::command_failed(
                command,
                format!("exited with code: {:?}", output.status.code()),
                (!stderr.is_empty()).then_some(stderr),
            ));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Catalog for CalibreDb {
    fn name(&self) -> &str {
        "calibredb"
    }

    async fn list(&self) -> Result<Vec<BookRecord>, CatalogError> {
        let stdout = self.run("list", &self.list_args()).await?;
        let books: Vec<BookRecord> = serde_json::from_slice(&stdout)?;
        debug!(count = books.len(), library = %self.library.display(), "Listed library");
        Ok(books)
    }

    async fn add(&self, paths: &[PathBuf]) -> Result<(), CatalogError> {
        if paths.is_empty() {
            return Ok(());
        }
        self.run("add", &self.add_args(paths)).await?;
        info!(count = paths.len(), library = %self.library.display(), "Imported books");
        Ok(())
    }
}
