use clap::Parser;
use std::path::PathBuf;

use flake_core::AudioFormat;

#[derive(Debug, Parser)]
#[command(name = "flake")]
#[command(author, version, about = "Batch-convert lossless audio files, mirroring the directory tree")]
pub struct Cli {
    /// Directory searched recursively for source files
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory the converted tree is written to (created if missing)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Number of concurrent conversions [default: number of CPUs]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,

    /// Target format: mp3, ogg or opus
    #[arg(short, long)]
    pub format: Option<AudioFormat>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON report of every file to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}
