use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - concurrency, when set, is at least 1
/// - bitrate, when set, is within what the encoders accept
/// - converter timeout is not 0 and the ffmpeg path is not empty
/// - source extensions are present, bare, and differ from the target
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let batch = &config.batch;

    if batch.concurrency == Some(0) {
        return Err(ConfigError::ValidationError(
            "batch.concurrency cannot be 0".to_string(),
        ));
    }

    if let Some(kbps) = batch.bitrate_kbps {
        if !(8..=512).contains(&kbps) {
            return Err(ConfigError::ValidationError(format!(
                "batch.bitrate_kbps must be between 8 and 512, got {}",
                kbps
            )));
        }
    }

    if batch.source_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "batch.source_extensions cannot be empty".to_string(),
        ));
    }

    for ext in &batch.source_extensions {
        if ext.is_empty() || ext.starts_with('.') {
            return Err(ConfigError::ValidationError(format!(
                "batch.source_extensions entry '{}' must be a bare extension such as \"flac\"",
                ext
            )));
        }
        // Outputs would be picked up as inputs on the next run
        if ext == batch.target_format.extension() {
            return Err(ConfigError::ValidationError(format!(
                "batch.source_extensions cannot include the target extension '{}'",
                ext
            )));
        }
    }

    // Converter validation
    if config.converter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.converter.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
