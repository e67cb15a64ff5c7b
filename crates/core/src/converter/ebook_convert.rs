//! Calibre `ebook-convert` based converter implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;

/// Maximum number of stderr bytes kept for error reporting.
const STDERR_TAIL_BYTES: usize = 4096;

/// Converter that shells out to Calibre's `ebook-convert`.
pub struct EbookConvert {
    config: ConverterConfig,
}

impl EbookConvert {
    /// Creates a new converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Builds the ebook-convert argument list.
    fn build_args(&self, source: &Path, dest: &Path) -> Vec<String> {
        let mut args = vec![
            source.to_string_lossy().to_string(),
            dest.to_string_lossy().to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args
    }

    fn map_spawn_error(&self, e: std::io::Error) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::ConverterNotFound {
                path: self.config.ebook_convert_path.clone(),
            }
        } else {
            ConverterError::Io(e)
        }
    }

    async fn run_conversion(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(ConverterError::InputNotFound {
                path: source.to_path_buf(),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                ConverterError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        // A file left at dest by an earlier run must not pass the output check.
        match tokio::fs::remove_file(dest).await {
            Ok(()) => tracing::debug!(dest = %dest.display(), "Removed stale output file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ConverterError::Io(e)),
        }

        let args = self.build_args(source, dest);
        tracing::debug!(
            program = %self.config.ebook_convert_path.display(),
            ?args,
            "Running ebook-convert"
        );

        let mut child = Command::new(&self.config.ebook_convert_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.map_spawn_error(e))?;

        let mut stderr = child.stderr.take();
        let run = async {
            let mut error_output = Vec::new();
            if let Some(ref mut pipe) = stderr {
                pipe.read_to_end(&mut error_output).await?;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, error_output))
        };

        let outcome = match self.config.timeout_secs {
            Some(secs) => {
                let waited = timeout(Duration::from_secs(secs), run).await;
                match waited {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        // Kill the process on timeout
                        let _ = child.kill().await;
                        return Err(ConverterError::Timeout { timeout_secs: secs });
                    }
                }
            }
            None => run.await,
        };

        let (status, error_output) = outcome?;
        if !status.success() {
            let stderr = stderr_tail(&error_output);
            return Err(ConverterError::conversion_failed(
                format!("ebook-convert exited with code: {:?}", status.code()),
                (!stderr.is_empty()).then_some(stderr),
            ));
        }

        if !tokio::fs::try_exists(dest).await.unwrap_or(false) {
            return Err(ConverterError::conversion_failed(
                "Output file not created",
                None,
            ));
        }

        Ok(())
    }
}

/// Keeps the last few KiB of stderr, which is where ebook-convert prints the
/// traceback.
fn stderr_tail(bytes: &[u8]) -> String {
    let start = bytes.len().saturating_sub(STDERR_TAIL_BYTES);
    String::from_utf8_lossy(&bytes[start..]).trim().to_string()
}

#[async_trait]
impl Converter for EbookConvert {
    fn name(&self) -> &str {
        "ebook-convert"
    }

    async fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConverterError> {
        self.run_conversion(source, dest).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Command::new(&self.config.ebook_convert_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_args() {
        let converter = EbookConvert::new(
            ConverterConfig::default().with_extra_args(["--output-profile=kindle".to_string()]),
        );
        let args = converter.build_args(Path::new("/in/a.epub"), Path::new("/out/a.mobi"));
        assert_eq!(
            args,
            vec![
                "/in/a.epub".to_string(),
                "/out/a.mobi".to_string(),
                "--output-profile=kindle".to_string(),
            ]
        );
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(stderr_tail(b"  boom \n"), "boom");
        let long = vec![b'x'; STDERR_TAIL_BYTES + 10];
        assert_eq!(stderr_tail(&long).len(), STDERR_TAIL_BYTES);
    }

    #[tokio::test]
    async fn test_missing_input() {
        let converter = EbookConvert::with_defaults();
        let result = converter
            .convert(
                Path::new("/definitely/not/here.epub"),
                Path::new("/tmp/out.mobi"),
            )
            .await;
        assert!(matches!(result, Err(ConverterError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("a.epub");
        std::fs::write(&source, b"epub").unwrap();

        let converter = EbookConvert::new(ConverterConfig::with_path(PathBuf::from(
            "/nonexistent/ebook-convert",
        )));
        let result = converter.convert(&source, &dir.path().join("a.mobi")).await;
        assert!(matches!(
            result,
            Err(ConverterError::ConverterNotFound { .. })
        ));
        assert!(matches!(
            converter.validate().await,
            Err(ConverterError::ConverterNotFound { .. })
        ));
    }
}
