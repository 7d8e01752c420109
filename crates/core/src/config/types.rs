use serde::{Deserialize, Serialize};

use crate::converter::{AudioFormat, ConverterConfig, QualityHint};
use crate::planner::PlanOptions;
use crate::pool::PoolConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// What gets converted, into what, and how many at once
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Source extensions without the leading dot.
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    #[serde(default)]
    pub target_format: AudioFormat,
    /// Worker count; the number of CPUs when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    /// Fixed bitrate instead of the highest VBR tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_extensions: default_source_extensions(),
            target_format: AudioFormat::default(),
            concurrency: None,
            bitrate_kbps: None,
        }
    }
}

fn default_source_extensions() -> Vec<String> {
    vec!["flac".to_string()]
}

impl BatchConfig {
    pub fn quality(&self) -> QualityHint {
        match self.bitrate_kbps {
            Some(kbps) => QualityHint::Bitrate(kbps),
            None => QualityHint::HighestVbr,
        }
    }

    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            source_extensions: self.source_extensions.clone(),
            target_format: self.target_format,
        }
    }

    /// Builds the pool settings, falling back to the CPU count.
    pub fn pool_config(&self) -> PoolConfig {
        let pool = PoolConfig::default()
            .with_target_format(self.target_format)
            .with_quality(self.quality());
        match self.concurrency {
            Some(concurrency) => pool.with_concurrency(concurrency),
            None => pool,
        }
    }
}
