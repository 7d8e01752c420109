//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Compressed audio format produced by a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// MPEG Audio Layer III
    #[default]
    Mp3,
    /// Ogg Vorbis
    #[serde(alias = "ogg", alias = "vorbis")]
    OggVorbis,
    /// Opus in an Ogg container
    Opus,
}

impl AudioFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggVorbis => "ogg",
            Self::Opus => "opus",
        }
    }

    /// Returns the ffmpeg encoder name for this format.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::OggVorbis => "libvorbis",
            Self::Opus => "libopus",
        }
    }

    /// Returns the ffmpeg muxer name (`-f`) for this format.
    pub fn ffmpeg_muxer(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggVorbis => "ogg",
            Self::Opus => "opus",
        }
    }

    /// Encoder arguments for the requested quality.
    pub fn quality_args(&self, quality: QualityHint) -> Vec<String> {
        match quality {
            QualityHint::HighestVbr => match self {
                // LAME V0
                Self::Mp3 => vec!["-q:a".to_string(), "0".to_string()],
                Self::OggVorbis => vec!["-q:a".to_string(), "10".to_string()],
                Self::Opus => vec![
                    "-b:a".to_string(),
                    "256k".to_string(),
                    "-vbr".to_string(),
                    "on".to_string(),
                ],
            },
            QualityHint::Bitrate(kbps) => vec!["-b:a".to_string(), format!("{}k", kbps)],
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "ogg" | "vorbis" | "ogg_vorbis" => Ok(Self::OggVorbis),
            "opus" => Ok(Self::Opus),
            other => Err(format!(
                "unknown target format '{}' (expected mp3, ogg or opus)",
                other
            )),
        }
    }
}

/// Quality requested from the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityHint {
    /// The encoder's top variable-bitrate tier.
    #[default]
    HighestVbr,
    /// Target average bitrate in kbps.
    Bitrate(u32),
}

/// A single transcode request handed to a [`Converter`](super::Converter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    /// Source file path.
    pub source_path: PathBuf,
    /// Final destination path. Its parent directory must already exist.
    pub dest_path: PathBuf,
    /// Target format.
    pub format: AudioFormat,
    /// Quality setting.
    pub quality: QualityHint,
}

/// Result of a successful transcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOutput {
    /// Path of the written file.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Encoder wall time in milliseconds.
    pub duration_ms: u64,
}
