//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{TranscodeOutput, TranscodeRequest};

/// A converter that can transcode audio files.
///
/// Implementations must leave nothing at `request.dest_path` when a
/// conversion fails.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Transcodes `request.source_path` into `request.dest_path`.
    async fn convert(&self, request: TranscodeRequest) -> Result<TranscodeOutput, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
