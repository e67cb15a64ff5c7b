//! Worker loop: pulls tasks from the shared queue, converts them and reports
//! one result per task.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::converter::Converter;

use super::candidate::{attempt_candidates, Attempt};
use super::types::{ConversionResult, ConversionTask, TaskError};

/// A task tagged with the `convert_all` call it belongs to.
pub(crate) struct Job {
    pub call: u64,
    pub task: ConversionTask,
}

/// A result tagged with the `convert_all` call it belongs to.
pub(crate) struct Delivery {
    pub call: u64,
    pub result: ConversionResult,
}

/// Counters shared between the workers and the pool.
#[derive(Default)]
pub(crate) struct PoolStats {
    pub active: AtomicU64,
    pub total_processed: AtomicU64,
    pub total_failed: AtomicU64,
}

pub(crate) async fn run<C>(
    id: usize,
    converter: Arc<C>,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    results: mpsc::Sender<Delivery>,
    stats: Arc<PoolStats>,
) where
    C: Converter + ?Sized,
{
    debug!(worker = id, "Worker started");

    loop {
        // Hold the lock only while waiting for the next job.
        let job = {
            let mut jobs = jobs.lock().await;
            jobs.recv().await
        };
        let Some(Job { call, task }) = job else {
            break;
        };

        stats.active.fetch_add(1, Ordering::Relaxed);
        let attempt = AssertUnwindSafe(attempt_candidates(&*converter, &task))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                let message = panic_message(payload.as_ref());
                error!(worker = id, task_id = %task.id, panic = %message, "Converter panicked");
                Attempt {
                    outcome: Err(TaskError::Panicked(message)),
                    failed_attempts: Vec::new(),
                }
            });
        stats.active.fetch_sub(1, Ordering::Relaxed);
        stats.total_processed.fetch_add(1, Ordering::Relaxed);
        if attempt.outcome.is_err() {
            stats.total_failed.fetch_add(1, Ordering::Relaxed);
        }

        let delivery = Delivery {
            call,
            result: ConversionResult {
                task,
                outcome: attempt.outcome,
                failed_attempts: attempt.failed_attempts,
            },
        };
        if results.send(delivery).await.is_err() {
            warn!(worker = id, "Result queue closed, stopping worker");
            break;
        }
    }

    debug!(worker = id, "Worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
