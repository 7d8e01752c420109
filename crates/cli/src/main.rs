mod cli;

use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flake_core::{
    load_config, load_default_config, validate_config, BatchReport, BatchRunner, CancelHandle,
    Config, Converter, FfmpegConverter,
};

use cli::Cli;

/// Exit status after a second interrupt, as shells report SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let json_layer = cli.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!cli.log_json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn load(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_default_config().context("Failed to load default configuration")?,
    };

    // Command-line flags win over file and environment
    if let Some(threads) = cli.threads {
        config.batch.concurrency = Some(threads as usize);
    }
    if let Some(format) = cli.format {
        config.batch.target_format = format;
    }

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load(&cli)?;

    let converter = FfmpegConverter::new(config.converter.clone());
    if let Err(e) = converter.validate().await {
        warn!("{}; conversions are likely to fail", e);
    }

    let runner = BatchRunner::new(&config, converter);
    info!(
        "Converting {} -> {} ({}, {} workers)",
        cli.input.display(),
        cli.output.display(),
        config.batch.target_format,
        runner.pool_status().max_concurrent
    );

    spawn_signal_handler(runner.cancel_handle());

    let run = runner.run(&cli.input, &cli.output).await?;

    if let Some(path) = &cli.report {
        write_report(&runner.report(&run), path)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

/// First Ctrl+C or SIGTERM stops dispatching new files; a second one
/// exits immediately.
fn spawn_signal_handler(cancel: CancelHandle) {
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupted, finishing in-flight conversions (interrupt again to abort)");
        cancel.cancel();

        shutdown_signal().await;
        error!("Interrupted again, aborting");
        std::process::exit(EXIT_INTERRUPTED);
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize report")?;
    writer
        .flush()
        .with_context(|| format!("Failed to write report file {}", path.display()))?;
    Ok(())
}
