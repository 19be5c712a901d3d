use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{EndcardError, Result};
use super::{MediaCommand, MediaEngine, MediaProbe, VideoInfo};

/// Concrete engine implementation (ffmpeg/ffprobe-based)
pub struct FfmpegEngine {
    config: MediaConfig,
    probe: MediaProbe,
}

impl FfmpegEngine {
    pub fn new(config: MediaConfig) -> Self {
        let probe = MediaProbe::new(&config.ffprobe_path);

        Self { config, probe }
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        self.probe.dimensions(path).await
    }

    async fn probe_info(&self, path: &Path) -> Result<VideoInfo> {
        self.probe.info(path).await
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        self.probe.duration(path).await
    }

    /// Check if the media engine is available
    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .map_err(|e| EndcardError::Media(format!("Media engine not found: {}", e)))?;

        if output.status.success() {
            info!("Media engine is available");
            Ok(())
        } else {
            Err(EndcardError::Media("Media engine version check failed".to_string()))
        }
    }

    /// Get media engine version information
    async fn version_info(&self) -> Result<String> {
        debug!("Getting media engine version information");

        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .map_err(|e| EndcardError::Media(format!("Failed to execute media engine: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            // The first line typically contains the version
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(EndcardError::Media(format!("Media engine version check failed: {}", stderr)))
        }
    }

    /// Scan the engine's encoder listing for a hardware codec name
    fn hardware_encoder_available(&self) -> bool {
        let listing = Command::new(&self.config.ffmpeg_path)
            .arg("-encoders")
            .output();

        match listing {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout)
                    .to_lowercase()
                    .contains(&self.config.hardware_encoder_marker.to_lowercase())
            }
            _ => false,
        }
    }

    async fn execute(&self, command: &MediaCommand) -> Result<()> {
        info!("Executing media engine command: {}", command.description);
        command.execute().await
    }
}
