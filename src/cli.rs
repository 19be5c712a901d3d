use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Append localized CTA end cards onto main videos, one output per
    /// (main video, language, CTA) combination
    Process {
        /// Main video file (repeatable)
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Directory scanned recursively for main videos, in addition to --input
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// CTA catalog root (language folders containing CTA-name folders)
        #[arg(long)]
        cta_root: PathBuf,

        /// Output root folder
        #[arg(short, long)]
        output: PathBuf,

        /// Seconds of the main video tail replaced by the CTA overlay
        #[arg(long, default_value = "4.0")]
        overlay_duration: f64,

        /// Use the hardware encoder when the engine supports it
        #[arg(long)]
        gpu: bool,

        /// Progress reporting style
        #[arg(long, default_value = "bar")]
        progress: String,
    },

    /// Print stream properties of a video file
    Probe {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Check media engine and hardware encoder availability
    Check,
}
