//! Per-task conversion with fallback across candidate source files.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::converter::Converter;

use super::types::{CandidateFailure, ConversionResult, ConversionTask, TaskError};

/// Outcome of attempting a task's candidates, without the task itself.
pub(crate) struct Attempt {
    pub outcome: Result<PathBuf, TaskError>,
    pub failed_attempts: Vec<CandidateFailure>,
}

/// Converts a task, trying each candidate in order until one succeeds.
pub async fn convert_candidates<C>(converter: &C, task: ConversionTask) -> ConversionResult
where
    C: Converter + ?Sized,
{
    let attempt = attempt_candidates(converter, &task).await;
    ConversionResult {
        task,
        outcome: attempt.outcome,
        failed_attempts: attempt.failed_attempts,
    }
}

pub(crate) async fn attempt_candidates<C>(converter: &C, task: &ConversionTask) -> Attempt
where
    C: Converter + ?Sized,
{
    if task.dry_run {
        info!(
            task_id = %task.id,
            title = %task.title,
            candidates = task.candidates.len(),
            "Dry run, skipping conversion"
        );
        return Attempt {
            outcome: Err(TaskError::DryRun),
            failed_attempts: Vec::new(),
        };
    }

    if task.candidates.is_empty() {
        warn!(task_id = %task.id, title = %task.title, "Book has no formats");
        return Attempt {
            outcome: Err(TaskError::NoSourceFormats),
            failed_attempts: Vec::new(),
        };
    }

    let mut failed_attempts: Vec<CandidateFailure> = Vec::new();

    for candidate in &task.candidates {
        let dest = task.output_path(candidate);
        debug!(
            task_id = %task.id,
            candidate = %candidate.display(),
            dest = %dest.display(),
            "Converting candidate"
        );

        match converter.convert(candidate, &dest).await {
            Ok(()) => {
                info!(
                    task_id = %task.id,
                    title = %task.title,
                    output = %dest.display(),
                    failed_before = failed_attempts.len(),
                    "Converted"
                );
                return Attempt {
                    outcome: Ok(dest),
                    failed_attempts,
                };
            }
            Err(e) => {
                warn!(
                    task_id = %task.id,
                    title = %task.title,
                    candidate = %candidate.display(),
                    error = %e,
                    "Candidate conversion failed"
                );
                failed_attempts.push(CandidateFailure {
                    candidate: candidate.clone(),
                    error: Arc::new(e),
                });
            }
        }
    }

    // Candidates were non-empty, so there is at least one failure.
    let outcome = match failed_attempts.last() {
        Some(last) => Err(TaskError::AllCandidatesFailed {
            attempts: failed_attempts.len(),
            last: Arc::clone(&last.error),
        }),
        None => Err(TaskError::NoSourceFormats),
    };

    Attempt {
        outcome,
        failed_attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ConverterError, TargetFormat};
    use crate::testing::MockConverter;
    use std::path::Path;

    fn task(candidates: &[&str]) -> ConversionTask {
        ConversionTask::new(
            "1",
            "Dune",
            candidates.iter().map(PathBuf::from).collect(),
            "/out",
            TargetFormat::new("mobi").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let converter = MockConverter::new();
        let result = convert_candidates(&converter, task(&["/lib/a.epub", "/lib/a.pdf"])).await;

        assert_eq!(result.output_path(), Some(Path::new("/out/a.mobi")));
        assert!(result.failed_attempts.is_empty());
        assert_eq!(converter.conversion_count().await, 1);
    }

    #[tokio::test]
    async fn test_falls_back_and_stops_at_success() {
        let converter = MockConverter::new();
        converter.fail_source("/lib/a.azw3").await;

        let result = convert_candidates(
            &converter,
            task(&["/lib/a.azw3", "/lib/b.epub", "/lib/c.pdf"]),
        )
        .await;

        assert_eq!(result.output_path(), Some(Path::new("/out/b.mobi")));
        assert_eq!(result.failed_attempts.len(), 1);
        assert_eq!(result.failed_attempts[0].candidate, PathBuf::from("/lib/a.azw3"));

        let sources = converter.converted_sources().await;
        assert_eq!(
            sources,
            vec![PathBuf::from("/lib/a.azw3"), PathBuf::from("/lib/b.epub")]
        );
    }

    #[tokio::test]
    async fn test_all_candidates_fail() {
        let converter = MockConverter::new();
        converter.fail_source("/lib/a.epub").await;
        converter.fail_source("/lib/a.pdf").await;

        let result = convert_candidates(&converter, task(&["/lib/a.epub", "/lib/a.pdf"])).await;

        match result.outcome {
            Err(TaskError::AllCandidatesFailed { attempts, ref last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(**last, ConverterError::ConversionFailed { .. }));
            }
            ref other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(result.output_path().is_none());
        assert_eq!(result.failed_attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let converter = MockConverter::new();
        let result = convert_candidates(&converter, task(&[])).await;

        assert!(matches!(result.outcome, Err(TaskError::NoSourceFormats)));
        assert_eq!(converter.conversion_count().await, 0);
    }

    #[tokio::test]
    async fn test_dry_run_checked_before_candidates() {
        let converter = MockConverter::new();

        let result = convert_candidates(&converter, task(&["/lib/a.epub"]).with_dry_run(true)).await;
        assert!(matches!(result.outcome, Err(TaskError::DryRun)));

        let result = convert_candidates(&converter, task(&[]).with_dry_run(true)).await;
        assert!(matches!(result.outcome, Err(TaskError::DryRun)));

        assert_eq!(converter.conversion_count().await, 0);
    }

    #[tokio::test]
    async fn test_same_task_same_choice() {
        let converter = MockConverter::new();
        converter.fail_source("/lib/a.epub").await;
        let t = task(&["/lib/a.epub", "/lib/a.pdf"]);

        let first = convert_candidates(&converter, t.clone()).await;
        let second = convert_candidates(&converter, t).await;
        assert_eq!(first.output_path(), second.output_path());
        assert_eq!(first.output_path(), Some(Path::new("/out/a.mobi")));
    }
}
