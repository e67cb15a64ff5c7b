//! Processor module: the bounded conversion pool.
//!
//! This module provides the `ConversionPool` which coordinates:
//! - Workers: a fixed number of tasks pulling from one bounded job queue
//! - Candidate fallback: each task tries its source files in order
//! - Aggregation: exactly one result is collected per submitted task
//!
//! Task failures never fail the batch. They are reported per task in the
//! returned `ConversionReport`.
//!
//! # Example
//!
//! ```ignore
//! use ebookfill_core::processor::{ConversionPool, ConversionTask, PoolConfig};
//! use ebookfill_core::converter::{EbookConvert, ConverterConfig, TargetFormat};
//!
//! let converter = EbookConvert::new(ConverterConfig::default());
//! let pool = ConversionPool::new(PoolConfig::default().with_workers(4), converter)?;
//!
//! let format = TargetFormat::new("mobi")?;
//! let tasks = vec![ConversionTask::for_path("/books/a.epub", "/tmp/out", format)];
//!
//! let report = pool.convert_all(tasks).await?;
//! for path in &report.produced {
//!     println!("Converted: {}", path.display());
//! }
//!
//! pool.shutdown().await?;
//! ```

mod aggregate;
mod candidate;
mod config;
mod error;
mod pool;
mod types;
mod worker;

pub use candidate::convert_candidates;
pub use config::PoolConfig;
pub use error::PoolError;
pub use pool::ConversionPool;
pub use types::{
    separate_colliding_outputs, CandidateFailure, ConversionReport, ConversionResult,
    ConversionTask, PoolStatus, TaskError,
};
