use std::path::PathBuf;

use crate::config::EncodeConfig;
use crate::media::{MediaCommand, VideoInfo};

/// One unit of work: composite a CTA tail onto a main video
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub main_video: PathBuf,
    pub cta_video: PathBuf,
    pub output_path: PathBuf,
    pub overlay_duration: f64,
    pub use_gpu: bool,
}

/// Assembles the engine invocation that replaces the last N seconds of the
/// main video with an overlay transition into the CTA while keeping the
/// original audio. Performs no I/O itself.
pub struct JobBuilder {
    binary_path: String,
    encode: EncodeConfig,
}

impl JobBuilder {
    pub fn new<S: Into<String>>(binary_path: S, encode: EncodeConfig) -> Self {
        Self {
            binary_path: binary_path.into(),
            encode,
        }
    }

    /// Build the full engine command for one job. Input-level options
    /// (hwaccel) must precede the input they apply to; encoder options are
    /// output options and stay before the output file.
    pub fn build(&self, job: &EncodeJob, main_info: &VideoInfo, main_duration: f64) -> MediaCommand {
        let overlay_start = (main_duration - job.overlay_duration).max(0.0);
        let graph = tail_overlay_graph(
            overlay_start,
            job.overlay_duration,
            main_info.width,
            main_info.height,
        );

        let mut command = MediaCommand::new(
            &self.binary_path,
            format!("Tail overlay composite -> {}", job.output_path.display()),
        )
        .overwrite();

        if job.use_gpu {
            command = command.hwaccel(&self.encode.hwaccel);
        }

        command = command
            .input(&job.main_video)
            .arg("-accurate_seek")
            .input(&job.cta_video)
            .filter_complex(graph)
            .map_stream("[outv]")
            .map_stream("0:a")
            .copy_audio();

        command = if job.use_gpu {
            command
                .video_codec(&self.encode.hardware_encoder)
                .preset(&self.encode.hardware_preset)
                .arg("-qp")
                .arg(self.encode.hardware_qp.to_string())
        } else {
            command
                .video_codec(&self.encode.software_encoder)
                .preset(&self.encode.software_preset)
                .arg("-crf")
                .arg(self.encode.software_crf.to_string())
        };

        command.frame_rate(main_info.frame_rate).output(&job.output_path)
    }
}

/// Filter graph splitting the main video into an untouched prefix and a
/// tail that gets the scaled, letterboxed CTA overlaid onto it, then
/// concatenating both back into one video stream. The overlay runs for the
/// shorter of the two inputs, which is the trimmed CTA.
pub fn tail_overlay_graph(
    overlay_start: f64,
    overlay_duration: f64,
    width: u32,
    height: u32,
) -> String {
    format!(
        "[0:v]split=2[v1][v2];\
        [v1]trim=0:{overlay_start},setpts=PTS-STARTPTS[main];\
        [v2]trim={overlay_start},setpts=PTS-STARTPTS[base];\
        [1:v]trim=0:{overlay_duration},setpts=PTS-STARTPTS,\
        scale={width}:{height}:force_original_aspect_ratio=decrease,\
        pad={width}:{height}:(ow-iw)/2:(oh-ih)/2[cta];\
        [base][cta]overlay=shortest=1[overlaid];\
        [main][overlaid]concat=n=2:v=1:a=0[outv]"
    )
}
