// Media engine abstraction
//
// The compositor never touches pixels itself. Everything below is a thin,
// injectable layer over the external engine's probe and transform modes:
// - Commands: argument-list builder and process execution
// - Probe: read-only stream property lookups
// - Processor: ffmpeg-backed engine implementation and capability checks

pub mod commands;
pub mod probe;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use probe::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Intrinsic properties of a video stream, probed once per asset per run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// Main trait for external media engine operations
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Pixel dimensions of the first video stream
    async fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32)>;

    /// Dimensions plus normalized frame rate of the first video stream
    async fn probe_info(&self, path: &Path) -> Result<VideoInfo>;

    /// Container duration in seconds
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Check the engine responds to a version query
    fn check_availability(&self) -> Result<()>;

    /// Engine version line for diagnostics
    async fn version_info(&self) -> Result<String>;

    /// Whether the engine's encoder listing carries a hardware codec
    fn hardware_encoder_available(&self) -> bool;

    /// Execute a fully-formed engine command
    async fn execute(&self, command: &MediaCommand) -> Result<()>;
}

/// Factory for creating media engine instances
pub struct MediaEngineFactory;

impl MediaEngineFactory {
    /// Create the default engine implementation (ffmpeg/ffprobe-based)
    pub fn create_engine(config: MediaConfig) -> Box<dyn MediaEngine> {
        Box::new(processor::FfmpegEngine::new(config))
    }
}
