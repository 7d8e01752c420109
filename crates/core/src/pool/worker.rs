//! Bounded worker pool that runs conversion jobs.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::converter::{Converter, TranscodeOutput, TranscodeRequest};
use crate::planner::ConversionJob;

use super::config::PoolConfig;
use super::error::JobError;
use super::types::{ConversionResult, JobFailure, JobOutcome, JobSuccess, PoolEvent, PoolStatus};

type JobQueue = Arc<Mutex<VecDeque<ConversionJob>>>;

/// Tracks statistics for the pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_succeeded: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            max_concurrent,
            active_jobs: self.active.load(Ordering::Relaxed) as usize,
            queued_jobs: self.queued.load(Ordering::Relaxed) as usize,
            total_succeeded: self.total_succeeded.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, result: &ConversionResult) {
        if result.is_success() {
            self.total_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Stops a running pool from taking new jobs off the queue.
///
/// Jobs already converting run to completion; jobs still queued come
/// back as cancelled failures.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Everything a worker task needs, cloned once per worker.
struct WorkerContext<C: Converter> {
    worker_id: usize,
    queue: JobQueue,
    converter: Arc<C>,
    config: PoolConfig,
    stats: Arc<PoolStats>,
    cancel: CancelHandle,
    events: Option<mpsc::UnboundedSender<PoolEvent>>,
    results: mpsc::UnboundedSender<ConversionResult>,
}

/// A fixed number of workers draining a shared job queue.
pub struct WorkerPool<C: Converter> {
    config: PoolConfig,
    converter: Arc<C>,
    events: Option<mpsc::UnboundedSender<PoolEvent>>,
    stats: Arc<PoolStats>,
    cancel: CancelHandle,
}

impl<C: Converter + 'static> WorkerPool<C> {
    /// Creates a new pool.
    pub fn new(config: PoolConfig, converter: C) -> Self {
        Self {
            config,
            converter: Arc::new(converter),
            events: None,
            stats: Arc::new(PoolStats::default()),
            cancel: CancelHandle::default(),
        }
    }

    /// Sends lifecycle events to `tx` in addition to the log.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<PoolEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Returns the pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns a handle that cancels this pool.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Returns the current pool status.
    pub fn status(&self) -> PoolStatus {
        self.stats.to_status(self.config.concurrency)
    }

    /// Runs every job and returns one result per job, in plan order.
    ///
    /// Individual failures never abort the run.
    pub async fn run(&self, jobs: Vec<ConversionJob>) -> Vec<ConversionResult> {
        let total = jobs.len();
        if total == 0 {
            return Vec::new();
        }

        let worker_count = self.config.concurrency.max(1).min(total);
        info!(
            "Starting {} workers for {} jobs (target: {})",
            worker_count, total, self.config.target_format
        );

        self.stats.queued.fetch_add(total as u64, Ordering::Relaxed);
        let queue: JobQueue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let (results_tx, mut results_rx) = mpsc::unbounded_channel();

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let context = WorkerContext {
                worker_id,
                queue: Arc::clone(&queue),
                converter: Arc::clone(&self.converter),
                config: self.config.clone(),
                stats: Arc::clone(&self.stats),
                cancel: self.cancel.clone(),
                events: self.events.clone(),
                results: results_tx.clone(),
            };
            workers.spawn(Self::worker_loop(context));
        }
        // Workers hold the only senders now; the channel closes when they exit
        drop(results_tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = results_rx.recv().await {
            results.push(result);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Worker task failed: {}", e);
            }
        }

        // Anything left was never dequeued because of cancellation
        let leftover: Vec<ConversionJob> = queue.lock().await.drain(..).collect();
        if !leftover.is_empty() {
            warn!("Batch cancelled, skipping {} queued jobs", leftover.len());
        }
        for job in leftover {
            self.stats.queued.fetch_sub(1, Ordering::Relaxed);
            let result = Self::failed_result(job, JobError::Cancelled, 0);
            warn!("Skipped: {}", result.job.display_name());
            self.emit_failure(&result);
            self.stats.record(&result);
            results.push(result);
        }

        results.sort_by_key(|r| r.job.index);
        results
    }

    async fn worker_loop(context: WorkerContext<C>) {
        debug!("Worker {} started", context.worker_id);

        loop {
            if context.cancel.is_cancelled() {
                break;
            }

            let job = context.queue.lock().await.pop_front();
            let Some(job) = job else {
                break;
            };

            context.stats.queued.fetch_sub(1, Ordering::Relaxed);
            context.stats.active.fetch_add(1, Ordering::Relaxed);

            let result = Self::process_job(&context, job).await;

            context.stats.active.fetch_sub(1, Ordering::Relaxed);
            context.stats.record(&result);

            if context.results.send(result).is_err() {
                break;
            }
        }

        debug!("Worker {} exiting", context.worker_id);
    }

    async fn process_job(context: &WorkerContext<C>, job: ConversionJob) -> ConversionResult {
        let start = Instant::now();

        info!("Converting: {}", job.display_name());
        if let Some(ref tx) = context.events {
            let _ = tx.send(PoolEvent::JobStarted {
                index: job.index,
                source_path: job.source_path.clone(),
            });
        }

        let outcome = Self::execute(&job, &context.converter, &context.config).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                info!(
                    "Converted: {} -> {}",
                    job.display_name(),
                    output.output_path.display()
                );
                if let Some(ref tx) = context.events {
                    let _ = tx.send(PoolEvent::JobSucceeded {
                        index: job.index,
                        dest_path: output.output_path.clone(),
                        output_size_bytes: output.output_size_bytes,
                    });
                }
                ConversionResult {
                    job,
                    outcome: JobOutcome::Succeeded(JobSuccess {
                        output_path: output.output_path,
                        output_size_bytes: output.output_size_bytes,
                        transcode_ms: output.duration_ms,
                    }),
                    elapsed_ms,
                }
            }
            Err(e) => {
                error!(
                    kind = %e.kind(),
                    "Error converting {}: {}",
                    job.display_name(),
                    e
                );
                let result = Self::failed_result(job, e, elapsed_ms);
                if let Some(ref tx) = context.events {
                    Self::send_failure(tx, &result);
                }
                result
            }
        }
    }

    /// Creates the destination directory, then transcodes in a separate
    /// task so a panicking converter only fails this job.
    async fn execute(
        job: &ConversionJob,
        converter: &Arc<C>,
        config: &PoolConfig,
    ) -> Result<TranscodeOutput, JobError> {
        tokio::fs::create_dir_all(&job.dest_dir)
            .await
            .map_err(|e| JobError::DirectoryCreation {
                path: job.dest_dir.clone(),
                source: e,
            })?;

        let request = TranscodeRequest {
            source_path: job.source_path.clone(),
            dest_path: job.dest_path(),
            format: config.target_format,
            quality: config.quality,
        };

        let converter = Arc::clone(converter);
        let handle = tokio::spawn(async move { converter.convert(request).await });

        match handle.await {
            Ok(result) => result.map_err(JobError::from),
            Err(e) if e.is_panic() => Err(JobError::Panicked(panic_message(e.into_panic()))),
            Err(e) => Err(JobError::Panicked(e.to_string())),
        }
    }

    fn failed_result(job: ConversionJob, error: JobError, elapsed_ms: u64) -> ConversionResult {
        ConversionResult {
            job,
            outcome: JobOutcome::Failed(JobFailure {
                kind: error.kind(),
                reason: error.to_string(),
            }),
            elapsed_ms,
        }
    }

    fn emit_failure(&self, result: &ConversionResult) {
        if let Some(ref tx) = self.events {
            Self::send_failure(tx, result);
        }
    }

    fn send_failure(tx: &mpsc::UnboundedSender<PoolEvent>, result: &ConversionResult) {
        if let Some(failure) = result.failure() {
            let _ = tx.send(PoolEvent::JobFailed {
                index: result.job.index,
                kind: failure.kind,
                reason: failure.reason.clone(),
            });
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterError;
    use crate::pool::FailureKind;
    use crate::testing::MockConverter;
    use std::ffi::OsString;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn make_jobs(input: &Path, output: &Path, names: &[&str]) -> Vec<ConversionJob> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let source_path = input.join(name);
                std::fs::create_dir_all(source_path.parent().unwrap()).unwrap();
                std::fs::write(&source_path, b"flac").unwrap();
                let relative_path = Path::new(name).to_path_buf();
                let dest_dir = match relative_path.parent() {
                    Some(p) if !p.as_os_str().is_empty() => output.join(p),
                    _ => output.to_path_buf(),
                };
                let mut dest_filename = relative_path.file_stem().unwrap().to_os_string();
                dest_filename.push(OsString::from(".mp3"));
                ConversionJob {
                    index,
                    source_path,
                    relative_path,
                    dest_dir,
                    dest_filename,
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_run() {
        let pool = WorkerPool::new(PoolConfig::default(), MockConverter::new());
        let results = pool.run(Vec::new()).await;
        assert!(results.is_empty());
        assert_eq!(pool.status().total_succeeded, 0);
    }

    #[tokio::test]
    async fn test_results_in_plan_order() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::from_millis(5)).await;

        let jobs = make_jobs(
            input.path(),
            output.path(),
            &["a.flac", "b.flac", "c/d.flac", "c/e.flac", "f.flac"],
        );
        let pool = WorkerPool::new(PoolConfig::default().with_concurrency(3), converter.clone());
        let results = pool.run(jobs).await;

        let indices: Vec<usize> = results.iter().map(|r| r.job.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(results.iter().all(|r| r.is_success()));
        assert!(output.path().join("c/e.mp3").exists());
        assert_eq!(converter.conversion_count().await, 5);

        let status = pool.status();
        assert_eq!(status.total_succeeded, 5);
        assert_eq!(status.active_jobs, 0);
        assert_eq!(status.queued_jobs, 0);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::from_millis(20)).await;

        let names: Vec<String> = (0..12).map(|i| format!("{:02}.flac", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let jobs = make_jobs(input.path(), output.path(), &names);

        let pool = WorkerPool::new(PoolConfig::default().with_concurrency(3), converter.clone());
        let results = pool.run(jobs).await;

        assert_eq!(results.len(), 12);
        assert!(converter.max_concurrent_conversions() <= 3);
        assert!(converter.max_concurrent_conversions() >= 1);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::ZERO).await;
        converter.fail_on("bad.flac", "Invalid data found when processing input").await;

        let jobs = make_jobs(input.path(), output.path(), &["a.flac", "bad.flac", "c.flac"]);
        let pool = WorkerPool::new(PoolConfig::default().with_concurrency(2), converter);
        let results = pool.run(jobs).await;

        assert!(results[0].is_success());
        assert!(results[2].is_success());
        let failure = results[1].failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Transcode);
        assert!(failure.reason.contains("Invalid data"));
        assert!(!output.path().join("bad.mp3").exists());
        assert_eq!(pool.status().total_failed, 1);
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::ZERO).await;
        converter.panic_on("boom.flac").await;

        let jobs = make_jobs(input.path(), output.path(), &["a.flac", "boom.flac", "c.flac"]);
        let pool = WorkerPool::new(PoolConfig::default().with_concurrency(1), converter);
        let results = pool.run(jobs).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(results[2].is_success());
        assert_eq!(results[1].failure().unwrap().kind, FailureKind::WorkerPanic);
    }

    #[tokio::test]
    async fn test_directory_creation_failure() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        // A file where the destination directory should be
        std::fs::write(output.path().join("sub"), b"in the way").unwrap();

        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::ZERO).await;
        let jobs = make_jobs(input.path(), output.path(), &["sub/a.flac", "b.flac"]);
        let pool = WorkerPool::new(PoolConfig::default().with_concurrency(2), converter.clone());
        let results = pool.run(jobs).await;

        assert_eq!(
            results[0].failure().unwrap().kind,
            FailureKind::DirectoryCreation
        );
        assert!(results[1].is_success());
        // The converter never saw the job whose directory failed
        assert_eq!(converter.conversion_count().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let converter = MockConverter::new();
        let jobs = make_jobs(input.path(), output.path(), &["a.flac", "b.flac"]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::new(PoolConfig::default(), converter.clone()).with_events(tx);
        pool.cancel_handle().cancel();
        let results = pool.run(jobs).await;

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.failure().map(|f| f.kind) == Some(FailureKind::Cancelled)));
        assert_eq!(converter.conversion_count().await, 0);

        let mut cancelled_events = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, PoolEvent::JobFailed { kind: FailureKind::Cancelled, .. }) {
                cancelled_events += 1;
            }
        }
        assert_eq!(cancelled_events, 2);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_keeps_in_flight_jobs() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::from_millis(50)).await;

        let names: Vec<String> = (0..6).map(|i| format!("{}.flac", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let jobs = make_jobs(input.path(), output.path(), &names);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::new(PoolConfig::default().with_concurrency(1), converter.clone())
            .with_events(tx);
        let cancel = pool.cancel_handle();

        tokio::spawn(async move {
            // Cancel as soon as the first job starts
            while let Some(event) = rx.recv().await {
                if matches!(event, PoolEvent::JobStarted { .. }) {
                    cancel.cancel();
                    break;
                }
            }
        });

        let results = pool.run(jobs).await;

        assert_eq!(results.len(), 6);
        assert!(results[0].is_success());
        let cancelled = results
            .iter()
            .filter(|r| r.failure().map(|f| f.kind) == Some(FailureKind::Cancelled))
            .count();
        assert_eq!(cancelled, 6 - converter.conversion_count().await);
        assert!(cancelled >= 1);
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let converter = MockConverter::new();
        converter.set_conversion_duration(Duration::ZERO).await;
        converter
            .set_next_error(ConverterError::Timeout { timeout_secs: 1 })
            .await;

        let jobs = make_jobs(input.path(), output.path(), &["only.flac"]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::new(PoolConfig::default(), converter).with_events(tx);
        pool.run(jobs).await;

        let started = rx.try_recv().unwrap();
        assert!(matches!(started, PoolEvent::JobStarted { index: 0, .. }));
        let failed = rx.try_recv().unwrap();
        assert!(matches!(
            failed,
            PoolEvent::JobFailed {
                kind: FailureKind::Timeout,
                ..
            }
        ));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "unknown panic payload");
    }
}
