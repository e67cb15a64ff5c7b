//! Types for the processor module.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::converter::{ConverterError, TargetFormat};

/// One unit of work: a book (or file) and the source files it can be
/// converted from, tried in order.
#[derive(Debug, Clone)]
pub struct ConversionTask {
    /// Opaque identifier (catalog id, or the source path for plain files).
    pub id: String,
    /// Human readable title, used in logs.
    pub title: String,
    /// Candidate source files, in the order they are attempted.
    pub candidates: Vec<PathBuf>,
    /// Directory the converted file is written to.
    pub output_dir: PathBuf,
    /// Format to convert into.
    pub format: TargetFormat,
    /// When set, the converter is never invoked.
    pub dry_run: bool,
}

impl ConversionTask {
    /// Creates a task.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        candidates: Vec<PathBuf>,
        output_dir: impl Into<PathBuf>,
        format: TargetFormat,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            candidates,
            output_dir: output_dir.into(),
            format,
            dry_run: false,
        }
    }

    /// Creates a task converting a single file, outside of any catalog.
    pub fn for_path(
        path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        format: TargetFormat,
    ) -> Self {
        let path = path.into();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(path.display().to_string(), title, vec![path], output_dir, format)
    }

    /// Sets the dry-run flag.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Output path the given candidate converts to.
    pub fn output_path(&self, candidate: &Path) -> PathBuf {
        self.format.output_path(candidate, &self.output_dir)
    }

    fn output_paths(&self) -> HashSet<PathBuf> {
        self.candidates.iter().map(|c| self.output_path(c)).collect()
    }
}

/// Gives every task that could write the same output file as another task
/// its own subdirectory, so no two tasks of a batch share a destination.
///
/// The subdirectory is named after the task id when that is a plain file
/// name, otherwise after the task's 1-based position in `tasks`. Returns the
/// number of tasks moved.
pub fn separate_colliding_outputs(tasks: &mut [ConversionTask]) -> usize {
    let mut claims: HashMap<PathBuf, usize> = HashMap::new();
    for task in tasks.iter() {
        for path in task.output_paths() {
            *claims.entry(path).or_default() += 1;
        }
    }

    let mut used = HashSet::new();
    let mut moved = 0;
    for (index, task) in tasks.iter_mut().enumerate() {
        let collides = task
            .output_paths()
            .iter()
            .any(|path| claims.get(path).is_some_and(|&n| n > 1));
        if !collides {
            continue;
        }

        let position = (index + 1).to_string();
        let mut name = if is_plain_name(&task.id) {
            task.id.clone()
        } else {
            position.clone()
        };
        if !used.insert((task.output_dir.clone(), name.clone())) {
            name = format!("{}-{}", name, position);
            used.insert((task.output_dir.clone(), name.clone()));
        }
        task.output_dir = task.output_dir.join(name);
        moved += 1;
    }
    moved
}

fn is_plain_name(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

/// A candidate that was attempted and failed.
#[derive(Debug, Clone)]
pub struct CandidateFailure {
    /// Source file that was attempted.
    pub candidate: PathBuf,
    /// Why the converter rejected it.
    pub error: Arc<ConverterError>,
}

/// Why a task produced no output.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// The task had no candidate source files.
    #[error("book has no formats")]
    NoSourceFormats,

    /// Conversion was skipped because of the dry-run flag.
    #[error("conversion cancelled because of dry run flag")]
    DryRun,

    /// Every candidate was attempted and none converted.
    #[error("all {attempts} candidate(s) failed, last error: {last}")]
    AllCandidatesFailed {
        attempts: usize,
        #[source]
        last: Arc<ConverterError>,
    },

    /// The converter panicked while handling the task.
    #[error("converter panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    /// Whether running the task again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::AllCandidatesFailed { last, .. } => last.is_retryable(),
            _ => false,
        }
    }
}

/// Outcome of a single task. Exactly one is produced per submitted task.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// The task this result belongs to.
    pub task: ConversionTask,
    /// Path of the converted file, or why there is none.
    pub outcome: Result<PathBuf, TaskError>,
    /// Candidates that failed before the outcome was decided.
    pub failed_attempts: Vec<CandidateFailure>,
}

impl ConversionResult {
    /// Whether a usable file was produced.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Path of the produced file, if any.
    pub fn output_path(&self) -> Option<&Path> {
        self.outcome.as_deref().ok()
    }

    /// The error, if the task produced nothing.
    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.as_ref().err()
    }
}

/// Aggregated outcome of one `convert_all` call.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// Produced files, in completion order.
    pub produced: Vec<PathBuf>,
    /// Results of tasks that produced nothing, in completion order.
    pub failures: Vec<ConversionResult>,
    /// Number of results collected (always the number of submitted tasks).
    pub results_seen: usize,
}

impl ConversionReport {
    /// Whether every task produced a file.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runtime statistics of a conversion pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Number of workers.
    pub workers: usize,
    /// Tasks currently being converted.
    pub active_tasks: usize,
    /// Tasks finished since the pool started.
    pub total_processed: u64,
    /// Finished tasks that produced nothing.
    pub total_failed: u64,
}
