//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{TranscodeOutput, TranscodeRequest};

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based converter implementation.
///
/// The encoder writes to `<dest>.part` and the file is renamed onto the
/// destination only after ffmpeg exits successfully.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Returns the converter configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Path the encoder writes to before the output is moved into place.
    pub fn partial_path(dest_path: &Path) -> PathBuf {
        let mut name = dest_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".part");
        dest_path.with_file_name(name)
    }

    /// Builds ffmpeg arguments for an audio transcode into `output_path`.
    ///
    /// Paths are passed through as raw `OsString`s so that file names
    /// which are not valid UTF-8 reach ffmpeg unchanged.
    fn build_args(&self, request: &TranscodeRequest, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(), // Overwrite leftovers from an interrupted run
            "-nostdin".into(),
            "-i".into(),
            request.source_path.as_os_str().to_os_string(),
            // Drop embedded cover art streams, keep tags
            "-vn".into(),
            "-map_metadata".into(),
            "0".into(),
        ];

        // Audio codec
        args.extend([
            OsString::from("-c:a"),
            OsString::from(request.format.ffmpeg_codec()),
        ]);

        // Quality
        args.extend(
            request
                .format
                .quality_args(request.quality)
                .into_iter()
                .map(OsString::from),
        );

        // Log level
        args.extend([
            OsString::from("-loglevel"),
            OsString::from(&self.config.ffmpeg_log_level),
        ]);

        // Extra args
        args.extend(self.config.extra_ffmpeg_args.iter().map(OsString::from));

        // The partial file has no usable extension, so the muxer is explicit
        args.extend([
            OsString::from("-f"),
            OsString::from(request.format.ffmpeg_muxer()),
        ]);
        args.push(output_path.as_os_str().to_os_string());

        args
    }

    async fn discard_partial(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove partial output {:?}: {}", path, e);
            }
        }
    }

    async fn run_conversion(
        &self,
        request: &TranscodeRequest,
    ) -> Result<TranscodeOutput, ConverterError> {
        let start = Instant::now();

        if !tokio::fs::try_exists(&request.source_path)
            .await
            .unwrap_or(false)
        {
            return Err(ConverterError::InputNotFound {
                path: request.source_path.clone(),
            });
        }

        let partial_path = Self::partial_path(&request.dest_path);
        let args = self.build_args(request, &partial_path);

        tracing::debug!("Running {:?} {:?}", self.config.ffmpeg_path, args);

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConverterError::conversion_failed("FFmpeg stderr not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, VecDeque<String>), std::io::Error>((status, tail))
        })
        .await;

        match result {
            Ok(Ok((status, tail))) => {
                if !status.success() {
                    Self::discard_partial(&partial_path).await;
                    let stderr = if tail.is_empty() {
                        None
                    } else {
                        Some(Vec::from(tail).join("\n"))
                    };
                    return Err(ConverterError::conversion_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        stderr,
                    ));
                }
            }
            Ok(Err(e)) => {
                Self::discard_partial(&partial_path).await;
                return Err(ConverterError::Io(e));
            }
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                Self::discard_partial(&partial_path).await;
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        // Verify output exists and get size
        let output_meta = tokio::fs::metadata(&partial_path)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;

        if let Err(e) = tokio::fs::rename(&partial_path, &request.dest_path).await {
            Self::discard_partial(&partial_path).await;
            return Err(ConverterError::Io(e));
        }

        Ok(TranscodeOutput {
            output_path: request.dest_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(&self, request: TranscodeRequest) -> Result<TranscodeOutput, ConverterError> {
        self.run_conversion(&request).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                format!("`ffmpeg -version` exited with code: {:?}", output.status.code()),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        Ok(())
    }
}
