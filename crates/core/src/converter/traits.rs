//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;

/// A converter that turns one ebook file into another format.
///
/// Implementations are invoked once per candidate attempt. A failure means the
/// candidate did not produce a usable output, nothing more.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts `source` into `dest`. The output format is implied by the
    /// extension of `dest`.
    async fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}

#[async_trait]
impl<C: Converter + ?Sized> Converter for std::sync::Arc<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
        (**self).convert(source, dest).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        (**self).validate().await
    }
}
