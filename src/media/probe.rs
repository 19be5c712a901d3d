use std::path::Path;

use crate::error::{EndcardError, Result};
use super::{MediaCommand, VideoInfo};

/// Frame rate used when the engine reports a rate that cannot be parsed.
/// Keeps a malformed single asset from failing a whole batch.
const FALLBACK_FRAME_RATE: f64 = 30.0;

/// Read-only stream property lookups backed by the engine's probe mode
pub struct MediaProbe {
    binary_path: String,
}

impl MediaProbe {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Pixel dimensions of the first video stream
    pub async fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        let output = MediaCommand::new(&self.binary_path, "Dimension probe")
            .args(["-v", "error", "-select_streams", "v:0", "-count_packets"])
            .args(["-show_entries", "stream=width,height", "-of", "csv=p=0"])
            .output(path)
            .execute_capture()
            .await
            .map_err(probe_error)?;

        let fields = csv_fields(&output, 2)
            .ok_or_else(|| unparsable(path, &output))?;
        let width = parse_u32(&fields[0], path)?;
        let height = parse_u32(&fields[1], path)?;
        Ok((width, height))
    }

    /// Dimensions plus frame rate of the first video stream
    pub async fn info(&self, path: &Path) -> Result<VideoInfo> {
        let output = MediaCommand::new(&self.binary_path, "Stream info probe")
            .args(["-v", "error", "-select_streams", "v:0", "-count_packets"])
            .args(["-show_entries", "stream=width,height,r_frame_rate", "-of", "csv=p=0"])
            .output(path)
            .execute_capture()
            .await
            .map_err(probe_error)?;

        let fields = csv_fields(&output, 3)
            .ok_or_else(|| unparsable(path, &output))?;
        Ok(VideoInfo {
            width: parse_u32(&fields[0], path)?,
            height: parse_u32(&fields[1], path)?,
            frame_rate: normalize_frame_rate(&fields[2]),
        })
    }

    /// Container duration in seconds
    pub async fn duration(&self, path: &Path) -> Result<f64> {
        let output = MediaCommand::new(&self.binary_path, "Duration probe")
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .output(path)
            .execute_capture()
            .await
            .map_err(probe_error)?;

        output
            .trim()
            .parse::<f64>()
            .map_err(|_| unparsable(path, &output))
    }
}

fn probe_error(err: EndcardError) -> EndcardError {
    EndcardError::Probe(err.to_string())
}

fn unparsable(path: &Path, output: &str) -> EndcardError {
    EndcardError::Probe(format!(
        "Unparsable probe output for {}: {:?}",
        path.display(),
        output.trim()
    ))
}

fn parse_u32(field: &str, path: &Path) -> Result<u32> {
    field
        .trim()
        .parse::<u32>()
        .map_err(|_| EndcardError::Probe(format!(
            "Invalid stream attribute {:?} for {}",
            field,
            path.display()
        )))
}

/// Split the probe's comma-separated output into at least `expected` fields.
/// Some assets make the engine emit extra lines; fall back to the first line.
fn csv_fields(output: &str, expected: usize) -> Option<Vec<String>> {
    let trimmed = output.trim();
    let parts: Vec<&str> = trimmed.split(',').collect();
    if parts.len() >= expected && parts[..expected].iter().all(|p| !p.contains('\n')) {
        return Some(parts[..expected].iter().map(|s| s.to_string()).collect());
    }

    let first_line = trimmed.lines().next()?;
    let parts: Vec<&str> = first_line.split(',').collect();
    if parts.len() >= expected {
        Some(parts[..expected].iter().map(|s| s.to_string()).collect())
    } else {
        None
    }
}

/// Normalize a rational frame rate string like "30000/1001" to a float.
/// A zero denominator folds into the numerator; garbage folds into a default.
pub fn normalize_frame_rate(raw: &str) -> f64 {
    let raw = raw.trim();
    if let Some((num, den)) = raw.split_once('/') {
        match (num.parse::<f64>(), den.parse::<f64>()) {
            (Ok(n), Ok(d)) if d != 0.0 => n / d,
            (Ok(n), _) => n,
            _ => FALLBACK_FRAME_RATE,
        }
    } else {
        raw.parse::<f64>().unwrap_or(FALLBACK_FRAME_RATE)
    }
}
