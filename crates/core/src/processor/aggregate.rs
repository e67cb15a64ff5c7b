//! Result aggregation: collects exactly one result per submitted task.

use tokio::sync::{mpsc, oneshot, OwnedMutexGuard};
use tracing::debug;

use super::error::PoolError;
use super::types::{ConversionReport, ConversionResult};
use super::worker::Delivery;

/// Builds a report from results in the order they arrive.
#[derive(Debug)]
pub(crate) struct Collector {
    expected: usize,
    report: ConversionReport,
}

impl Collector {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            report: ConversionReport::default(),
        }
    }

    pub fn push(&mut self, result: ConversionResult) {
        self.report.results_seen += 1;
        match result.outcome {
            Ok(ref path) => self.report.produced.push(path.clone()),
            Err(_) => self.report.failures.push(result),
        }
    }

    pub fn seen(&self) -> usize {
        self.report.results_seen
    }

    pub fn is_complete(&self) -> bool {
        self.seen() >= self.expected
    }

    pub fn finish(self) -> ConversionReport {
        self.report
    }
}

/// Receives results for `call` until `expected` have arrived.
///
/// Results tagged with another call belong to an abandoned `convert_all`
/// and are dropped.
pub(crate) async fn collect(
    results: &mut mpsc::Receiver<Delivery>,
    call: u64,
    expected: usize,
) -> Result<ConversionReport, PoolError> {
    let mut collector = Collector::new(expected);

    while !collector.is_complete() {
        match results.recv().await {
            Some(delivery) if delivery.call == call => collector.push(delivery.result),
            Some(delivery) => {
                debug!(
                    call,
                    stale_call = delivery.call,
                    task_id = %delivery.result.task.id,
                    "Dropping result of an abandoned call"
                );
            }
            None => {
                return Err(PoolError::ResultsLost {
                    expected,
                    received: collector.seen(),
                })
            }
        }
    }

    Ok(collector.finish())
}

/// Aggregator task for one `convert_all` call.
///
/// Owns the result queue until the report is sent, or until the caller stops
/// waiting for it.
pub(crate) async fn run(
    mut results: OwnedMutexGuard<mpsc::Receiver<Delivery>>,
    call: u64,
    expected: usize,
    mut report_tx: oneshot::Sender<Result<ConversionReport, PoolError>>,
) {
    let report = tokio::select! {
        report = collect(&mut results, call, expected) => report,
        _ = report_tx.closed() => {
            debug!(call, "Caller stopped waiting, releasing result queue");
            return;
        }
    };
    let _ = report_tx.send(report);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::TargetFormat;
    use crate::processor::types::{ConversionTask, TaskError};
    use std::path::PathBuf;

    fn delivery(call: u64, name: &str, ok: bool) -> Delivery {
        let format = TargetFormat::new("mobi").unwrap();
        let task = ConversionTask::for_path(format!("/lib/{}.epub", name), "/out", format);
        let outcome = if ok {
            Ok(PathBuf::from(format!("/out/{}.mobi", name)))
        } else {
            Err(TaskError::NoSourceFormats)
        };
        Delivery {
            call,
            result: ConversionResult {
                task,
                outcome,
                failed_attempts: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn test_collect_keeps_completion_order() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(delivery(1, "c", true)).await.unwrap();
        tx.send(delivery(1, "x", false)).await.unwrap();
        tx.send(delivery(1, "a", true)).await.unwrap();

        let report = collect(&mut rx, 1, 3).await.unwrap();
        assert_eq!(report.results_seen, 3);
        assert_eq!(
            report.produced,
            vec![PathBuf::from("/out/c.mobi"), PathBuf::from("/out/a.mobi")]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task.title, "x");
    }

    #[tokio::test]
    async fn test_collect_stops_at_expected() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(delivery(1, "a", true)).await.unwrap();
        tx.send(delivery(1, "b", true)).await.unwrap();

        let report = collect(&mut rx, 1, 1).await.unwrap();
        assert_eq!(report.results_seen, 1);
        // The second result is left in the queue.
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_collect_drops_stale_results() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(delivery(0, "stale", true)).await.unwrap();
        tx.send(delivery(1, "fresh", true)).await.unwrap();

        let report = collect(&mut rx, 1, 1).await.unwrap();
        assert_eq!(report.produced, vec![PathBuf::from("/out/fresh.mobi")]);
    }

    #[tokio::test]
    async fn test_collect_reports_lost_results() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(delivery(1, "a", true)).await.unwrap();
        drop(tx);

        let err = collect(&mut rx, 1, 3).await.unwrap_err();
        assert!(matches!(
            err,
            PoolError::ResultsLost {
                expected: 3,
                received: 1
            }
        ));
    }
}
