//! Error types for the processor module.

use thiserror::Error;

/// Errors from the conversion pool itself. Per-task failures are reported in
/// `ConversionResult`, never here.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Pool configuration is unusable.
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// The task queue is closed.
    #[error("Conversion pool is closed")]
    Closed,

    /// The result queue closed before every result arrived.
    #[error("Result queue closed after {received} of {expected} results")]
    ResultsLost { expected: usize, received: usize },

    /// The aggregator stopped without reporting.
    #[error("Result aggregator stopped without reporting")]
    AggregatorStopped,

    /// A worker task failed to join.
    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}
