use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{EndcardError, Result};

fn default_cutoff_markers() -> Vec<String> {
    ["DN", "MN", "SN", "PN"].iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub media: MediaConfig,
    pub encode: EncodeConfig,
    pub naming: NamingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Substring looked for in the encoder listing to detect hardware encoding support
    pub hardware_encoder_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Software video encoder and its fixed quality settings
    pub software_encoder: String,
    pub software_preset: String,
    pub software_crf: u32,
    /// Hardware video encoder and its fixed quality settings
    pub hardware_encoder: String,
    pub hardware_preset: String,
    pub hardware_qp: u32,
    /// Hardware decode context requested alongside the hardware encoder
    pub hwaccel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Segment markers that end the kept prefix of a main video's base name.
    /// Any exactly-2-character segment cuts the name off as well.
    #[serde(default = "default_cutoff_markers")]
    pub cutoff_markers: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            cutoff_markers: default_cutoff_markers(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media: MediaConfig {
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
                hardware_encoder_marker: "nvenc".to_string(),
            },
            encode: EncodeConfig {
                software_encoder: "libx264".to_string(),
                software_preset: "medium".to_string(),
                software_crf: 23,
                hardware_encoder: "h264_nvenc".to_string(),
                hardware_preset: "p4".to_string(),
                hardware_qp: 23,
                hwaccel: "cuda".to_string(),
            },
            naming: NamingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EndcardError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| EndcardError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EndcardError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| EndcardError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.media.ffmpeg_path, "ffmpeg");
        assert_eq!(parsed.encode.software_crf, 23);
        assert_eq!(parsed.naming.cutoff_markers, vec!["DN", "MN", "SN", "PN"]);
    }

    #[test]
    fn cutoff_markers_default_when_table_omits_them() {
        let parsed: Config = toml::from_str(
            r#"
            [media]
            ffmpeg_path = "ffmpeg"
            ffprobe_path = "ffprobe"
            hardware_encoder_marker = "nvenc"

            [encode]
            software_encoder = "libx264"
            software_preset = "medium"
            software_crf = 23
            hardware_encoder = "h264_nvenc"
            hardware_preset = "p4"
            hardware_qp = 23
            hwaccel = "cuda"

            [naming]
            "#,
        )
        .unwrap();
        assert_eq!(parsed.naming.cutoff_markers, vec!["DN", "MN", "SN", "PN"]);
    }
}
