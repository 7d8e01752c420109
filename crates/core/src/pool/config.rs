//! Configuration for the worker pool.

use crate::converter::{AudioFormat, QualityHint};

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent workers. Always at least 1.
    pub concurrency: usize,
    /// Format every job is converted to.
    pub target_format: AudioFormat,
    /// Quality requested from the converter.
    pub quality: QualityHint,
}

fn default_concurrency() -> usize {
    num_cpus::get().max(1)
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            target_format: AudioFormat::Mp3,
            quality: QualityHint::HighestVbr,
        }
    }
}

impl PoolConfig {
    /// Sets the number of workers; zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the target format.
    pub fn with_target_format(mut self, format: AudioFormat) -> Self {
        self.target_format = format;
        self
    }

    /// Sets the quality hint.
    pub fn with_quality(mut self, quality: QualityHint) -> Self {
        self.quality = quality;
        self
    }
}
