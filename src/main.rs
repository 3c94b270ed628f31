//! Card Scanner - Payment card field extraction from OCR detections
//!
//! Replays recorded OCR detections through the card parser and the
//! multi-frame scan loop, printing the extracted fields as JSON.

mod analysis;
mod app;
mod capture;
mod config;
mod shared;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::analysis::{parse_card_from_detections, LogObserver};
use crate::app::{CardScanner, ScanError};
use crate::config::{AppConfig, CompletionPolicy};
use crate::vision::{filter_by_score, load_detections, load_frames, ReplayCamera, ReplayOcr};

/// Card Scanner - extract card fields from OCR output
#[derive(Parser, Debug)]
#[command(name = "card-scanner")]
#[command(about = "Extracts payment card fields from OCR text detections")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a single frame of detections
    Parse {
        /// JSON array of detections
        file: PathBuf,
    },
    /// Replay recorded frames through a scan session
    Scan {
        /// JSON array of frames, each an array of detections
        file: PathBuf,

        /// Seconds before giving up
        #[arg(long)]
        timeout: Option<u32>,

        /// Milliseconds between scan attempts
        #[arg(long)]
        interval: Option<u64>,

        /// Consecutive identical readings needed to lock a field
        #[arg(long)]
        required_ticks: Option<u32>,

        /// Finish once card number, expiry and holder name are locked
        #[arg(long)]
        essentials: bool,

        /// Restart from the first frame when the recording runs out
        #[arg(long)]
        cycle: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) = load_or_create_config(args.config.as_deref());
    let debug = args.debug || config.scanner.debug;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Card Scanner starting...");
    match config_source {
        ConfigSource::Loaded(path) => info!("Loaded configuration from {:?}", path),
        ConfigSource::Created(path) => info!("Wrote default configuration to {:?}", path),
        ConfigSource::Unreadable(path, e) => {
            warn!("Ignoring unreadable config {:?}: {:#}", path, e);
            info!("Using default configuration");
        }
        ConfigSource::Default => info!("Using default configuration"),
    }

    match args.command {
        Command::Parse { file } => run_parse(&file, &config),
        Command::Scan {
            file,
            timeout,
            interval,
            required_ticks,
            essentials,
            cycle,
        } => {
            let mut config = config;
            if let Some(timeout) = timeout {
                config.scanner.timeout_secs = timeout;
            }
            if let Some(interval) = interval {
                config.scanner.scan_interval_ms = interval;
            }
            if let Some(required_ticks) = required_ticks {
                config.scanner.required_ticks = required_ticks;
            }
            if essentials {
                config.scanner.completion = CompletionPolicy::Essentials;
            }
            config.scanner.debug = debug;
            run_scan(&file, config, cycle).await
        }
    }
}

/// Where the active configuration came from
#[derive(Debug)]
enum ConfigSource {
    /// Read from an existing file
    Loaded(PathBuf),
    /// No file existed; defaults were written there
    Created(PathBuf),
    /// File exists but could not be read or parsed
    Unreadable(PathBuf, anyhow::Error),
    /// No usable location
    Default,
}

/// Load configuration from file, writing defaults when none exists yet.
///
/// Runs before logging is installed, so the outcome is returned for the
/// caller to log.
fn load_or_create_config(explicit: Option<&Path>) -> (AppConfig, ConfigSource) {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config::default_config_path() {
            Ok(path) => path,
            Err(_) => return (AppConfig::default(), ConfigSource::Default),
        },
    };

    if path.exists() {
        return match config::load_config(&path) {
            Ok(config) => (config, ConfigSource::Loaded(path)),
            Err(e) => (AppConfig::default(), ConfigSource::Unreadable(path, e)),
        };
    }

    let config = AppConfig::default();
    match config::save_config(&config, &path) {
        Ok(()) => (config, ConfigSource::Created(path)),
        Err(_) => (config, ConfigSource::Default),
    }
}

/// Parse one frame and print the extracted fields
fn run_parse(file: &Path, config: &AppConfig) -> Result<()> {
    let detections = load_detections(file)?;
    let detections = filter_by_score(detections, config.ocr.recognition_threshold);
    info!("Parsing {} detections", detections.len());

    let fields = parse_card_from_detections(&detections);
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

/// Replay recorded frames through a scan session and print the result
async fn run_scan(file: &Path, config: AppConfig, cycle: bool) -> Result<()> {
    let ocr = ReplayOcr::new(load_frames(file)?, cycle);
    info!("Replaying {} frames", ocr.frame_count());
    let camera = if cycle {
        ReplayCamera::new()
    } else {
        ReplayCamera::with_frame_limit(ocr.frame_count() as u64)
    };

    let scanner = CardScanner::builder(config.scanner)
        .ocr_settings(config.ocr)
        .camera(Arc::new(camera))
        .ocr(Arc::new(ocr))
        .observer(Arc::new(LogObserver))
        .build()?;
    info!("Scan session {}", scanner.session_id());
    let status = scanner.status();

    let shutdown = scanner.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, closing scanner");
            shutdown.cancel();
        }
    });

    let outcome = scanner.run().await;

    let status = status.read().clone();
    info!("{}", status.summary());
    if let Some(e) = &status.model_error {
        warn!("OCR model error: {}", e);
    }

    match outcome {
        Ok(card) => println!("{}", serde_json::to_string_pretty(&card)?),
        Err(ScanError::Cancelled) => {
            // Partial fields are still useful for manual entry
            println!("{}", serde_json::to_string_pretty(&status.display_fields)?);
        }
        Err(e) => return Err(e).context("Scan session ended without a result"),
    }

    info!("Card Scanner shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_missing_config_is_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let (config, source) = load_or_create_config(Some(&path));
        assert!(matches!(source, ConfigSource::Created(ref p) if p == &path));
        assert_eq!(config.scanner.timeout_secs, 120);

        let written = config::load_config(&path).unwrap();
        assert_eq!(written.scanner.required_ticks, config.scanner.required_ticks);

        let (_, source) = load_or_create_config(Some(&path));
        assert!(matches!(source, ConfigSource::Loaded(_)));
    }

    #[test]
    fn test_unreadable_config_falls_back() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[scanner]\ntimeout_secs = \"soon\"").unwrap();

        let (config, source) = load_or_create_config(Some(temp_file.path()));
        assert!(matches!(source, ConfigSource::Unreadable(_, _)));
        assert_eq!(config.scanner.timeout_secs, 120);
    }
}
