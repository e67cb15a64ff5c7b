//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{Converter, ConverterError};

/// A recorded conversion for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// Source file passed to the converter.
    pub source: PathBuf,
    /// Destination passed to the converter.
    pub dest: PathBuf,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversions for assertions
/// - Fail specific source files or extensions
/// - Panic on specific source files
/// - Simulate slow conversions
///
/// # Example
///
/// ```rust,ignore
/// use ebookfill_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_extension("pdf").await;
///
/// converter.convert(Path::new("/lib/a.pdf"), Path::new("/out/a.mobi")).await; // Err
/// converter.convert(Path::new("/lib/a.epub"), Path::new("/out/a.mobi")).await; // Ok
///
/// assert_eq!(converter.conversion_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Source files that fail to convert.
    failing_sources: Arc<RwLock<HashSet<PathBuf>>>,
    /// Lowercase extensions that fail to convert.
    failing_extensions: Arc<RwLock<HashSet<String>>>,
    /// Source files that make the converter panic.
    panicking_sources: Arc<RwLock<HashSet<PathBuf>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_delay_ms: Arc<RwLock<u64>>,
    /// Whether successful conversions write the destination file.
    write_outputs: Arc<RwLock<bool>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter where every conversion succeeds.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            failing_sources: Arc::new(RwLock::new(HashSet::new())),
            failing_extensions: Arc::new(RwLock::new(HashSet::new())),
            panicking_sources: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_delay_ms: Arc::new(RwLock::new(0)),
            write_outputs: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Source files passed to the converter, in call order.
    pub async fn converted_sources(&self) -> Vec<PathBuf> {
        self.conversions
            .read()
            .await
            .iter()
            .map(|c| c.source.clone())
            .collect()
    }

    /// Clear recorded conversions.
    pub async fn clear_recorded(&self) {
        self.conversions.write().await.clear();
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Make conversions of this source file fail.
    pub async fn fail_source(&self, path: impl AsRef<Path>) {
        self.failing_sources
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Make conversions of every file with this extension fail.
    pub async fn fail_extension(&self, extension: &str) {
        self.failing_extensions
            .write()
            .await
            .insert(extension.trim_start_matches('.').to_lowercase());
    }

    /// Make the converter panic when handed this source file.
    pub async fn panic_on(&self, path: impl AsRef<Path>) {
        self.panicking_sources
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_delay(&self, duration: Duration) {
        *self.conversion_delay_ms.write().await = duration.as_millis() as u64;
    }

    /// Write an empty destination file on success.
    pub async fn set_write_outputs(&self, write: bool) {
        *self.write_outputs.write().await = write;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }

    async fn should_fail(&self, source: &Path) -> bool {
        if self.failing_sources.read().await.contains(source) {
            return true;
        }
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.failing_extensions.read().await.contains(&extension)
    }

    async fn record(&self, source: &Path, dest: &Path, success: bool) {
        self.conversions.write().await.push(RecordedConversion {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
            success,
        });
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
        let delay = *self.conversion_delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let panics = self.panicking_sources.read().await.contains(source);
        if panics {
            panic!("mock converter panicked on {}", source.display());
        }

        if let Some(err) = self.take_error().await {
            self.record(source, dest, false).await;
            return Err(err);
        }

        if self.should_fail(source).await {
            self.record(source, dest, false).await;
            return Err(ConverterError::conversion_failed(
                format!("mock failure for {}", source.display()),
                Some("simulated stderr".to_string()),
            ));
        }

        if *self.write_outputs.read().await {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(dest, b"").await?;
        }

        self.record(source, dest, true).await;
        Ok(())
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_succeeds_and_records() {
        let converter = MockConverter::new();
        converter
            .convert(Path::new("/lib/a.epub"), Path::new("/out/a.mobi"))
            .await
            .unwrap();

        let recorded = converter.recorded_conversions().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].dest, PathBuf::from("/out/a.mobi"));
        assert!(recorded[0].success);
    }

    #[tokio::test]
    async fn test_fail_extension_case_insensitive() {
        let converter = MockConverter::new();
        converter.fail_extension(".PDF").await;

        let result = converter
            .convert(Path::new("/lib/a.pdf"), Path::new("/out/a.mobi"))
            .await;
        assert!(result.is_err());
        assert!(!converter.recorded_conversions().await[0].success);
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let converter = MockConverter::new();
        converter
            .set_next_error(ConverterError::Timeout { timeout_secs: 1 })
            .await;

        assert!(converter.validate().await.is_err());
        assert!(converter.validate().await.is_ok());

        converter
            .set_next_error(ConverterError::Timeout { timeout_secs: 1 })
            .await;
        converter.clear_next_error().await;
        assert!(converter.validate().await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_recorded() {
        let converter = MockConverter::new();
        converter
            .convert(Path::new("/lib/a.epub"), Path::new("/out/a.mobi"))
            .await
            .unwrap();
        assert_eq!(converter.conversion_count().await, 1);

        converter.clear_recorded().await;
        assert_eq!(converter.conversion_count().await, 0);
    }

    #[tokio::test]
    async fn test_writes_outputs() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("nested").join("a.mobi");

        let converter = MockConverter::new();
        converter.set_write_outputs(true).await;
        converter.convert(Path::new("/lib/a.epub"), &dest).await.unwrap();
        assert!(dest.exists());
    }
}
