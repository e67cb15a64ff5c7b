//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Target ebook format, stored as a lowercase extension with a leading dot.
///
/// `mobi`, `.mobi` and `.MOBI` all normalize to `.mobi`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetFormat(String);

/// Error returned when a target format string is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid target format: {0:?}")]
pub struct InvalidFormat(pub String);

impl TargetFormat {
    /// Parses and normalizes a format string.
    pub fn new(format: impl AsRef<str>) -> Result<Self, InvalidFormat> {
        let raw = format.as_ref();
        let trimmed = raw.trim().trim_start_matches('.');
        if trimmed.is_empty() || trimmed.contains(['/', '\\', '.']) {
            return Err(InvalidFormat(raw.to_string()));
        }
        Ok(Self(format!(".{}", trimmed.to_lowercase())))
    }

    /// Returns the format with its leading dot (e.g. `.mobi`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the bare extension (e.g. `mobi`).
    pub fn extension(&self) -> &str {
        &self.0[1..]
    }

    /// Whether the path already has this format as its extension.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()))
    }

    /// Builds the output path for a source file: `dir/<file stem><format>`.
    pub fn output_path(&self, source: &Path, dir: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        dir.join(format!("{}{}", stem, self.0))
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TargetFormat {
    type Err = InvalidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TargetFormat {
    type Error = InvalidFormat;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetFormat> for String {
    fn from(format: TargetFormat) -> Self {
        format.0
    }
}
