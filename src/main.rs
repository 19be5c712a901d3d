//! Endcard - Localized CTA End-Card Batch Compositor
//!
//! Main entry point for the endcard command line tool, which batch-appends
//! language-specific CTA clips onto marketing videos using ffmpeg.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use endcard::catalog::AspectRatio;
use endcard::cli::{Args, Commands};
use endcard::config::Config;
use endcard::error::EndcardError;
use endcard::media::MediaEngineFactory;
use endcard::progress::{ChannelSink, JsonLinesSink, LogSink, ProgressEvent};
use endcard::workflow::{collect_main_videos, BatchSummary, Workflow};

enum ProgressMode {
    Bar,
    Log,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    // Execute command
    match args.command {
        Commands::Process {
            input,
            input_dir,
            cta_root,
            output,
            overlay_duration,
            gpu,
            progress,
        } => {
            let progress_mode = parse_progress_mode(&progress)?;

            let mut main_videos = input;
            if let Some(dir) = input_dir {
                main_videos.extend(collect_main_videos(&dir)?);
            }

            let workflow = Workflow::new(config)?;

            let use_gpu = if gpu {
                if workflow.hardware_encoder_available() {
                    true
                } else {
                    warn!("Hardware encoder requested but not available, falling back to software encoding");
                    false
                }
            } else {
                false
            };

            info!(
                "Processing {} main videos against CTA catalog {}",
                main_videos.len(),
                cta_root.display()
            );

            let summary = match progress_mode {
                ProgressMode::Bar => {
                    run_with_progress_bar(
                        workflow,
                        main_videos,
                        cta_root,
                        output,
                        overlay_duration,
                        use_gpu,
                    )
                    .await?
                }
                ProgressMode::Log => {
                    let mut sink = LogSink::default();
                    workflow
                        .process_videos(&main_videos, &cta_root, &output, overlay_duration, use_gpu, &mut sink)
                        .await?
                }
                ProgressMode::Json => {
                    let mut sink = JsonLinesSink;
                    workflow
                        .process_videos(&main_videos, &cta_root, &output, overlay_duration, use_gpu, &mut sink)
                        .await?
                }
            };

            print_summary(&summary);
        }
        Commands::Probe { input } => {
            let workflow = Workflow::new(config)?;
            let (info, duration) = workflow.probe_asset(&input).await?;

            println!("File:         {}", input.display());
            println!("Resolution:   {}x{}", info.width, info.height);
            println!("Aspect ratio: {}", AspectRatio::from_dimensions(info.width, info.height));
            println!("Frame rate:   {:.3} fps", info.frame_rate);
            println!("Duration:     {:.2} s", duration);
        }
        Commands::Check => {
            let engine = MediaEngineFactory::create_engine(config.media.clone());
            match engine.check_availability() {
                Ok(()) => {
                    println!("Media engine: available");
                    match engine.version_info().await {
                        Ok(version) => println!("Version: {}", version),
                        Err(e) => println!("Version: unknown ({})", e),
                    }
                    let hardware = if engine.hardware_encoder_available() {
                        "available"
                    } else {
                        "not available"
                    };
                    println!("Hardware encoder: {}", hardware);
                }
                Err(e) => {
                    println!("Media engine: not available ({})", e);
                    println!("Install ffmpeg and make sure it is on the PATH.");
                }
            }
        }
    }

    Ok(())
}

/// Drive the batch on a background worker while this task renders progress
/// signals as a terminal bar.
async fn run_with_progress_bar(
    workflow: Workflow,
    main_videos: Vec<PathBuf>,
    cta_root: PathBuf,
    output: PathBuf,
    overlay_duration: f64,
    use_gpu: bool,
) -> Result<BatchSummary> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let worker = tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        workflow
            .process_videos(&main_videos, &cta_root, &output, overlay_duration, use_gpu, &mut sink)
            .await
    });

    let mut bar: Option<ProgressBar> = None;
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Total { total } => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                    .unwrap()
                    .progress_chars("#>-"));
                bar = Some(pb);
            }
            ProgressEvent::ItemDone => {
                if let Some(pb) = &bar {
                    pb.inc(1);
                }
            }
            ProgressEvent::BatchComplete => {
                if let Some(pb) = &bar {
                    pb.finish();
                }
            }
        }
    }

    let summary = worker
        .await
        .map_err(|e| anyhow::anyhow!("Batch worker failed: {}", e))??;
    Ok(summary)
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "Batch complete: {} encoded, {} skipped (probe), {} without matching CTA, {} failed ({} total)",
        summary.encoded,
        summary.probe_skipped,
        summary.match_missed,
        summary.encode_failed,
        summary.total
    );
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let endcard_dir = std::env::current_dir()?.join(".endcard");
    let log_dir = endcard_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "endcard.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Parse progress reporting mode from string
fn parse_progress_mode(mode: &str) -> Result<ProgressMode> {
    match mode.to_lowercase().as_str() {
        "bar" => Ok(ProgressMode::Bar),
        "log" => Ok(ProgressMode::Log),
        "json" => Ok(ProgressMode::Json),
        _ => Err(EndcardError::Config(format!(
            "Invalid progress mode '{}'. Valid modes: bar, log, json",
            mode
        ))
        .into()),
    }
}
