//! Converter module for turning ebooks into another format.
//!
//! This module provides the `Converter` trait and an implementation backed by
//! Calibre's `ebook-convert` command line tool.
//!
//! # Example
//!
//! ```ignore
//! use ebookfill_core::converter::{EbookConvert, Converter, ConverterConfig, TargetFormat};
//!
//! let converter = EbookConvert::new(ConverterConfig::default().with_timeout(600));
//!
//! // Validate ebook-convert is available
//! converter.validate().await?;
//!
//! let format = TargetFormat::new("mobi")?;
//! let dest = format.output_path(Path::new("/library/book.epub"), Path::new("/tmp/out"));
//! converter.convert(Path::new("/library/book.epub"), &dest).await?;
//! ```

mod config;
mod ebook_convert;
mod error;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use ebook_convert::EbookConvert;
pub use error::ConverterError;
pub use traits::Converter;
pub use types::{InvalidFormat, TargetFormat};
