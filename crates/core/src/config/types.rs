use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::CatalogConfig;
use crate::converter::{ConverterConfig, TargetFormat};
use crate::processor::PoolConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub library: CatalogConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// Conversion run configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Target format, e.g. "mobi".
    #[serde(default)]
    pub format: Option<TargetFormat>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub keep_output: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: None,
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            dry_run: false,
            output_dir: None,
            keep_output: false,
        }
    }
}

impl ConversionConfig {
    /// Pool settings of this run.
    pub fn pool(&self) -> PoolConfig {
        PoolConfig::default()
            .with_workers(self.workers)
            .with_queue_capacity(self.queue_capacity)
    }
}

fn default_workers() -> usize {
    PoolConfig::default().workers
}

fn default_queue_capacity() -> usize {
    PoolConfig::default().queue_capacity
}
