//! Converter module for transcoding audio files.
//!
//! This module provides the `Converter` trait and an FFmpeg-backed
//! implementation. The rest of the crate only talks to the trait, so the
//! codec behind it is replaceable.
//!
//! # Example
//!
//! ```ignore
//! use flake_core::converter::{AudioFormat, Converter, FfmpegConverter, QualityHint, TranscodeRequest};
//!
//! let converter = FfmpegConverter::with_defaults();
//!
//! // Validate ffmpeg is available
//! converter.validate().await?;
//!
//! let output = converter
//!     .convert(TranscodeRequest {
//!         source_path: PathBuf::from("/music/album/01.flac"),
//!         dest_path: PathBuf::from("/mp3/album/01.mp3"),
//!         format: AudioFormat::Mp3,
//!         quality: QualityHint::HighestVbr,
//!     })
//!     .await?;
//! println!("Wrote {} bytes in {} ms", output.output_size_bytes, output.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{AudioFormat, QualityHint, TranscodeOutput, TranscodeRequest};
