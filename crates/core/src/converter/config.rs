//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the ebook-convert based converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to the ebook-convert binary.
    #[serde(default = "default_ebook_convert_path")]
    pub ebook_convert_path: PathBuf,

    /// Timeout for a single conversion in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Additional arguments appended after the input and output paths.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ebook_convert_path() -> PathBuf {
    PathBuf::from("ebook-convert")
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ebook_convert_path: default_ebook_convert_path(),
            timeout_secs: None,
            extra_args: Vec::new(),
        }
    }
}

impl ConverterConfig {
    /// Creates a new config with a custom ebook-convert path.
    pub fn with_path(ebook_convert_path: PathBuf) -> Self {
        Self {
            ebook_convert_path,
            ..Default::default()
        }
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Appends extra arguments passed to every invocation.
    pub fn with_extra_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }
}
