//! Mock catalog for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{BookRecord, Catalog, CatalogError};

/// Mock implementation of the Catalog trait.
///
/// Serves a fixed list of books and records every import.
#[derive(Debug, Default)]
pub struct MockCatalog {
    books: Arc<RwLock<Vec<BookRecord>>>,
    imports: Arc<RwLock<Vec<Vec<PathBuf>>>>,
    list_error: Arc<RwLock<Option<CatalogError>>>,
    add_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockCatalog {
    /// Create an empty mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock catalog serving the given books.
    pub fn with_books(books: Vec<BookRecord>) -> Self {
        Self {
            books: Arc::new(RwLock::new(books)),
            ..Self::default()
        }
    }

    /// Replace the served books.
    pub async fn set_books(&self, books: Vec<BookRecord>) {
        *self.books.write().await = books;
    }

    /// Every `add` call, in order.
    pub async fn imports(&self) -> Vec<Vec<PathBuf>> {
        self.imports.read().await.clone()
    }

    /// Configure the next `list` to fail.
    pub async fn set_list_error(&self, error: CatalogError) {
        *self.list_error.write().await = Some(error);
    }

    /// Configure the next `add` to fail.
    pub async fn set_add_error(&self, error: CatalogError) {
        *self.add_error.write().await = Some(error);
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list(&self) -> Result<Vec<BookRecord>, CatalogError> {
        if let Some(err) = self.list_error.write().await.take() {
            return Err(err);
        }
        Ok(self.books.read().await.clone())
    }

    async fn add(&self, paths: &[PathBuf]) -> Result<(), CatalogError> {
        if let Some(err) = self.add_error.write().await.take() {
            return Err(err);
        }
        self.imports.write().await.push(paths.to_vec());
        Ok(())
    }
}
