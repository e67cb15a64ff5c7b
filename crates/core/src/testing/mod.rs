//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits,
//! allowing the conversion pipeline to be tested without Calibre installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use ebookfill_core::testing::{fixtures, MockCatalog, MockConverter};
//!
//! let catalog = MockCatalog::with_books(vec![fixtures::book(1, "Dune", &["/lib/Dune.epub"])]);
//! let converter = MockConverter::new();
//! converter.fail_extension("pdf").await;
//! ```

mod mock_catalog;
mod mock_converter;

pub use mock_catalog::MockCatalog;
pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::PathBuf;

    use crate::catalog::BookRecord;

    /// Create a book with the given format files.
    pub fn book(id: i64, title: &str, formats: &[&str]) -> BookRecord {
        let mut book = BookRecord::new(id, title, formats.iter().map(PathBuf::from).collect());
        book.uuid = Some(format!("uuid-{}", id));
        book.authors = Some("Test Author".to_string());
        book
    }
}
