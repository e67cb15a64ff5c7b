//! Fixed-size conversion pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::converter::Converter;

use super::aggregate;
use super::config::PoolConfig;
use super::error::PoolError;
use super::types::{ConversionReport, ConversionTask, PoolStatus};
use super::worker::{self, Delivery, Job, PoolStats};

/// A fixed number of workers converting tasks from a shared bounded queue.
///
/// Workers run until [`ConversionPool::shutdown`] is called or the pool is
/// dropped. One pool can serve any number of [`ConversionPool::convert_all`]
/// calls; concurrent calls are served one after the other.
pub struct ConversionPool {
    config: PoolConfig,
    jobs: mpsc::Sender<Job>,
    results: Arc<Mutex<mpsc::Receiver<Delivery>>>,
    workers: Vec<JoinHandle<()>>,
    next_call: AtomicU64,
    stats: Arc<PoolStats>,
}

impl ConversionPool {
    /// Starts `config.workers` workers sharing `converter`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<C>(config: PoolConfig, converter: C) -> Result<Self, PoolError>
    where
        C: Converter + 'static,
    {
        config.validate()?;

        let (jobs_tx, jobs_rx) = mpsc::channel(config.queue_capacity);
        let (results_tx, results_rx) = mpsc::channel(config.queue_capacity);
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));
        let converter = Arc::new(converter);
        let stats = Arc::new(PoolStats::default());

        let workers = (0..config.workers)
            .map(|id| {
                tokio::spawn(worker::run(
                    id,
                    Arc::clone(&converter),
                    Arc::clone(&jobs_rx),
                    results_tx.clone(),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            converter = converter.name(),
            "Conversion pool started"
        );

        Ok(Self {
            config,
            jobs: jobs_tx,
            results: Arc::new(Mutex::new(results_rx)),
            workers,
            next_call: AtomicU64::new(0),
            stats,
        })
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Current pool statistics.
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            workers: self.config.workers,
            active_tasks: self.stats.active.load(Ordering::Relaxed) as usize,
            total_processed: self.stats.total_processed.load(Ordering::Relaxed),
            total_failed: self.stats.total_failed.load(Ordering::Relaxed),
        }
    }

    /// Converts every task and waits for one result per task.
    ///
    /// Task failures are reported in the returned [`ConversionReport`]; an
    /// `Err` means the pool itself could not deliver.
    pub async fn convert_all(
        &self,
        tasks: Vec<ConversionTask>,
    ) -> Result<ConversionReport, PoolError> {
        if tasks.is_empty() {
            return Ok(ConversionReport::default());
        }

        let expected = tasks.len();
        let results = Arc::clone(&self.results).lock_owned().await;
        let call = self.next_call.fetch_add(1, Ordering::Relaxed);

        let (report_tx, report_rx) = oneshot::channel();
        tokio::spawn(aggregate::run(results, call, expected, report_tx));

        debug!(call, tasks = expected, "Submitting tasks");
        for task in tasks {
            self.jobs
                .send(Job { call, task })
                .await
                .map_err(|_| PoolError::Closed)?;
        }

        let report = report_rx.await.map_err(|_| PoolError::AggregatorStopped)??;
        info!(
            call,
            produced = report.produced.len(),
            failed = report.failures.len(),
            "Conversion batch finished"
        );
        Ok(report)
    }

    /// Closes the task queue and waits for every worker to exit.
    pub async fn shutdown(self) -> Result<(), PoolError> {
        let Self {
            jobs,
            results,
            workers,
            ..
        } = self;

        drop(jobs);
        // Unblocks workers waiting to deliver results nobody will read.
        drop(results);

        let count = workers.len();
        let mut failure = None;
        for handle in workers {
            if let Err(e) = handle.await {
                failure.get_or_insert(PoolError::WorkerFailed(e.to_string()));
            }
        }

        match failure {
            Some(e) => Err(e),
            None => {
                info!(workers = count, "Conversion pool stopped");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::TargetFormat;
    use crate::testing::MockConverter;
    use std::time::Duration;

    fn tasks(n: usize) -> Vec<ConversionTask> {
        let format = TargetFormat::new("mobi").unwrap();
        (0..n)
            .map(|i| ConversionTask::for_path(format!("/lib/{}.epub", i), "/out", format.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let result = ConversionPool::new(PoolConfig::default().with_workers(0), MockConverter::new());
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pool = ConversionPool::new(PoolConfig::default(), MockConverter::new()).unwrap();
        let report = pool.convert_all(Vec::new()).await.unwrap();
        assert_eq!(report.results_seen, 0);
        assert!(report.produced.is_empty());
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_counts() {
        let converter = Arc::new(MockConverter::new());
        converter.fail_source("/lib/1.epub").await;
        let pool = ConversionPool::new(PoolConfig::default().with_workers(2), Arc::clone(&converter))
            .unwrap();

        pool.convert_all(tasks(3)).await.unwrap();
        let status = pool.status();
        assert_eq!(status.workers, 2);
        assert_eq!(status.active_tasks, 0);
        assert_eq!(status.total_processed, 3);
        assert_eq!(status.total_failed, 1);
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_call_does_not_leak_into_next() {
        let converter = Arc::new(MockConverter::new());
        converter.set_conversion_delay(Duration::from_millis(50)).await;
        let pool = ConversionPool::new(
            PoolConfig::default().with_workers(1),
            Arc::clone(&converter),
        )
        .unwrap();

        // Give up on the first call while its task is still converting.
        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), pool.convert_all(tasks(1))).await;
        assert!(abandoned.is_err());

        converter.set_conversion_delay(Duration::ZERO).await;
        let format = TargetFormat::new("mobi").unwrap();
        let report = pool
            .convert_all(vec![ConversionTask::for_path("/lib/next.epub", "/out", format)])
            .await
            .unwrap();

        assert_eq!(report.results_seen, 1);
        assert_eq!(report.produced, vec![std::path::PathBuf::from("/out/next.mobi")]);
        pool.shutdown().await.unwrap();
    }
}
