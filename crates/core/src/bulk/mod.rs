//! Bulk operations over a whole library.
//!
//! `add_missing_format` lists the library, converts every book lacking the
//! target format through a `ConversionPool`, and imports what was produced.
//!
//! # Example
//!
//! ```ignore
//! use ebookfill_core::bulk::{add_missing_format, BulkRequest};
//! use ebookfill_core::catalog::CalibreDb;
//! use ebookfill_core::converter::EbookConvert;
//!
//! let catalog = CalibreDb::new("/home/me/Calibre Library");
//! let request = BulkRequest::new("mobi")?;
//!
//! let summary = add_missing_format(&catalog, EbookConvert::with_defaults(), request).await?;
//! for failure in &summary.report.failures {
//!     eprintln!("{}: {:?}", failure.task.title, failure.outcome);
//! }
//! ```

mod add_format;
mod error;
mod types;

pub use add_format::add_missing_format;
pub use error::BulkError;
pub use types::{BulkRequest, BulkSummary};
