//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::converter::{Converter, ConverterError, TranscodeOutput, TranscodeRequest};

/// Bytes written to every successful destination.
const MOCK_OUTPUT: &[u8] = b"ID3mock-mp3-frames";

/// A recorded conversion request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The request that was submitted.
    pub request: TranscodeRequest,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion requests for assertions
/// - Fail or panic on selected source files
/// - Simulate slow conversions
/// - Measure how many conversions overlap
///
/// Clones share all state, so a test can keep one handle while the pool
/// owns another.
///
/// # Example
///
/// ```rust,ignore
/// use flake_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_on("broken.flac", "Invalid data found").await;
///
/// let pool = WorkerPool::new(PoolConfig::default(), converter.clone());
/// pool.run(jobs).await;
///
/// assert!(converter.max_concurrent_conversions() <= 4);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Source path suffixes that fail, with the reason to report.
    failures: Arc<RwLock<HashMap<String, String>>>,
    /// Source path suffixes that panic.
    panics: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter even when the conversion panics.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            panics: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_duration_ms: Arc::new(RwLock::new(10)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Clear recorded conversions.
    pub async fn clear_recorded(&self) {
        self.conversions.write().await.clear();
    }

    /// Get the number of conversions attempted.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Fail every source whose path ends with `suffix`.
    pub async fn fail_on(&self, suffix: &str, reason: &str) {
        self.failures
            .write()
            .await
            .insert(suffix.to_string(), reason.to_string());
    }

    /// Panic while converting every source whose path ends with `suffix`.
    pub async fn panic_on(&self, suffix: &str) {
        self.panics.write().await.push(suffix.to_string());
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
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Highest number of conversions observed running at once.
    pub fn max_concurrent_conversions(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, request: TranscodeRequest, success: bool) {
        self.conversions
            .write()
            .await
            .push(RecordedConversion { request, success });
    }

    async fn scripted_failure(&self, request: &TranscodeRequest) -> Option<String> {
        let source = request.source_path.to_string_lossy();
        self.failures
            .read()
            .await
            .iter()
            .find(|(suffix, _)| source.ends_with(suffix.as_str()))
            .map(|(_, reason)| reason.clone())
    }

    async fn should_panic(&self, request: &TranscodeRequest) -> bool {
        let source = request.source_path.to_string_lossy();
        self.panics
            .read()
            .await
            .iter()
            .any(|suffix| source.ends_with(suffix.as_str()))
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, request: TranscodeRequest) -> Result<TranscodeOutput, ConverterError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);
        let start = Instant::now();

        // Simulate conversion time
        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if let Some(err) = self.take_error().await {
            self.record(request, false).await;
            return Err(err);
        }

        if !request.source_path.exists() {
            let path = request.source_path.clone();
            self.record(request, false).await;
            return Err(ConverterError::InputNotFound { path });
        }

        if self.should_panic(&request).await {
            self.record(request.clone(), false).await;
            panic!("mock converter panicked on {}", request.source_path.display());
        }

        if let Some(reason) = self.scripted_failure(&request).await {
            self.record(request, false).await;
            return Err(ConverterError::conversion_failed(
                reason.clone(),
                Some(format!("[flac] {}\n", reason)),
            ));
        }

        tokio::fs::write(&request.dest_path, MOCK_OUTPUT).await?;
        let output = TranscodeOutput {
            output_path: request.dest_path.clone(),
            output_size_bytes: MOCK_OUTPUT.len() as u64,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        self.record(request, true).await;

        Ok(output)
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
