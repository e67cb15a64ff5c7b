//! Configuration for the processor module.

use serde::{Deserialize, Serialize};

use super::error::PoolError;

/// Configuration for the conversion pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of parallel workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the task and result queues.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_workers() -> usize {
    8
}

fn default_queue_capacity() -> usize {
    100
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl PoolConfig {
    /// Sets the number of workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Checks the configuration can start a pool.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.workers == 0 {
            return Err(PoolError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
