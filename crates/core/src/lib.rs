pub mod batch;
pub mod config;
pub mod converter;
pub mod planner;
pub mod pool;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use batch::{BatchError, BatchReport, BatchRun, BatchRunner, BatchSummary};
pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, BatchConfig, Config,
    ConfigError,
};
pub use converter::{AudioFormat, Converter, ConverterError, FfmpegConverter};
pub use planner::{plan, ConversionJob, PlanError, PlanOptions};
pub use pool::{CancelHandle, ConversionResult, FailureKind, PoolConfig, PoolEvent, WorkerPool};
