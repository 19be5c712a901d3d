use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::catalog::{AspectRatio, CtaCatalog, CtaEntry, find_cta};
use crate::compose::{EncodeJob, JobBuilder};
use crate::config::Config;
use crate::error::{EndcardError, Result};
use crate::media::{MediaEngine, MediaEngineFactory, VideoInfo};
use crate::naming::{NamingPolicy, SegmentNamingPolicy, cta_code, language_code, resolve_collision};
use crate::progress::ProgressSink;

/// Per-item tallies for one batch run. The item counts always sum to the
/// total computed at discovery time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub encoded: usize,
    pub probe_skipped: usize,
    pub match_missed: usize,
    pub encode_failed: usize,
}

enum ItemOutcome {
    Encoded,
    MatchMiss,
    EncodeFailed,
}

/// A main video with its probed properties, queried once per batch run
struct MainAsset<'a> {
    path: &'a Path,
    base_name: String,
    info: VideoInfo,
    duration: f64,
    ratio: AspectRatio,
}

impl<'a> MainAsset<'a> {
    fn new(path: &'a Path, info: VideoInfo, duration: f64) -> Self {
        let base_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            path,
            base_name,
            ratio: AspectRatio::from_dimensions(info.width, info.height),
            info,
            duration,
        }
    }
}

/// Drives the whole batch sequentially: discovery, then per combination
/// probe -> match -> name -> build -> encode -> report.
pub struct Workflow {
    engine: Box<dyn MediaEngine>,
    naming: Box<dyn NamingPolicy>,
    jobs: JobBuilder,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let engine = MediaEngineFactory::create_engine(config.media.clone());

        // Check dependencies before any batch work begins
        engine.check_availability()?;

        Ok(Self::assemble(config, engine))
    }

    /// Build a workflow around a caller-supplied engine
    pub fn with_engine(config: Config, engine: Box<dyn MediaEngine>) -> Self {
        Self::assemble(config, engine)
    }

    fn assemble(config: Config, engine: Box<dyn MediaEngine>) -> Self {
        let naming = Box::new(SegmentNamingPolicy::new(&config.naming));
        let jobs = JobBuilder::new(config.media.ffmpeg_path.clone(), config.encode.clone());

        Self { engine, naming, jobs }
    }

    pub fn hardware_encoder_available(&self) -> bool {
        self.engine.hardware_encoder_available()
    }

    pub async fn engine_version(&self) -> Result<String> {
        self.engine.version_info().await
    }

    /// Stream properties plus duration of a single asset
    pub async fn probe_asset(&self, path: &Path) -> Result<(VideoInfo, f64)> {
        let info = self.engine.probe_info(path).await?;
        let duration = self.engine.probe_duration(path).await?;
        Ok((info, duration))
    }

    /// Batch entry point: produce one output per (main video, language, CTA)
    /// combination. The total item count is emitted to the sink before any
    /// item is processed, one signal follows per item regardless of outcome,
    /// and a final completion signal closes the run.
    pub async fn process_videos(
        &self,
        main_videos: &[PathBuf],
        cta_root: &Path,
        output_root: &Path,
        overlay_duration: f64,
        use_gpu: bool,
        progress: &mut dyn ProgressSink,
    ) -> Result<BatchSummary> {
        validate_request(main_videos, cta_root, overlay_duration)?;

        let catalog = CtaCatalog::discover(cta_root)?;
        if catalog.is_empty() {
            warn!("No CTA folders discovered under {}", cta_root.display());
        }

        fs::create_dir_all(output_root).await?;

        let mut summary = BatchSummary {
            total: main_videos.len() * catalog.len(),
            ..Default::default()
        };
        progress.on_total(summary.total);

        for main_video in main_videos {
            let asset = match self.probe_asset(main_video).await {
                Ok((info, duration)) => MainAsset::new(main_video, info, duration),
                Err(e) => {
                    error!("Skipping {}: {}", main_video.display(), e);
                    // Keep the totals consistent: one unit per leaf folder
                    for _ in 0..catalog.len() {
                        summary.probe_skipped += 1;
                        progress.on_item_done();
                    }
                    continue;
                }
            };

            for entry in catalog.entries() {
                let outcome = self
                    .encode_one(&asset, entry, output_root, overlay_duration, use_gpu)
                    .await;

                match outcome {
                    ItemOutcome::Encoded => summary.encoded += 1,
                    ItemOutcome::MatchMiss => summary.match_missed += 1,
                    ItemOutcome::EncodeFailed => summary.encode_failed += 1,
                }
                progress.on_item_done();
            }
        }

        progress.on_batch_complete();
        info!(
            "Batch finished: {} encoded, {} probe-skipped, {} without matching CTA, {} failed ({} total)",
            summary.encoded,
            summary.probe_skipped,
            summary.match_missed,
            summary.encode_failed,
            summary.total
        );

        Ok(summary)
    }

    async fn encode_one(
        &self,
        asset: &MainAsset<'_>,
        entry: &CtaEntry,
        output_root: &Path,
        overlay_duration: f64,
        use_gpu: bool,
    ) -> ItemOutcome {
        let Some(cta_video) = find_cta(&entry.folder, &entry.cta_name, asset.ratio) else {
            warn!(
                "CTA video not found for {} with aspect ratio {} in {}",
                entry.cta_name,
                asset.ratio,
                entry.folder.display()
            );
            return ItemOutcome::MatchMiss;
        };

        let output_folder = output_root.join(&entry.language).join(&entry.cta_name);
        if let Err(e) = fs::create_dir_all(&output_folder).await {
            error!("Failed to create output folder {}: {}", output_folder.display(), e);
            return ItemOutcome::EncodeFailed;
        }

        let file_name = self.naming.build_name(
            &asset.base_name,
            &language_code(&entry.language),
            &cta_code(&entry.cta_name),
            asset.ratio,
        );
        let output_path = resolve_collision(&output_folder, &file_name);

        let job = EncodeJob {
            main_video: asset.path.to_path_buf(),
            cta_video,
            output_path: output_path.clone(),
            overlay_duration,
            use_gpu,
        };
        let command = self.jobs.build(&job, &asset.info, asset.duration);
        info!("Executing media engine command: {}", command.to_command_line());

        match self.engine.execute(&command).await {
            Ok(()) if output_path.exists() => {
                info!("Successfully created: {}", output_path.display());
                ItemOutcome::Encoded
            }
            Ok(()) => {
                error!(
                    "Engine reported success but output is missing: {} ({})",
                    output_path.display(),
                    command.to_command_line()
                );
                ItemOutcome::EncodeFailed
            }
            Err(e) => {
                error!(
                    "Encode failed for {}: {} ({})",
                    output_path.display(),
                    e,
                    command.to_command_line()
                );
                ItemOutcome::EncodeFailed
            }
        }
    }
}

fn validate_request(main_videos: &[PathBuf], cta_root: &Path, overlay_duration: f64) -> Result<()> {
    if main_videos.is_empty() {
        return Err(EndcardError::Config("No main videos provided".to_string()));
    }
    for video in main_videos {
        if !video.is_file() {
            return Err(EndcardError::FileNotFound(video.display().to_string()));
        }
    }
    if !cta_root.is_dir() {
        return Err(EndcardError::Config(format!(
            "CTA root is not a directory: {}",
            cta_root.display()
        )));
    }
    if !overlay_duration.is_finite() || overlay_duration <= 0.0 {
        return Err(EndcardError::Config(format!(
            "Overlay duration must be a positive number of seconds, got {}",
            overlay_duration
        )));
    }
    Ok(())
}

/// Collect .mp4 files under a directory, recursively, in a stable order
pub fn collect_main_videos(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(EndcardError::Config(format!(
            "Input path is not a directory: {}",
            input_dir.display()
        )));
    }

    let mut videos = Vec::new();
    for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
        {
            videos.push(entry.path().to_path_buf());
        }
    }
    videos.sort();

    info!("Found {} video files under {}", videos.len(), input_dir.display());
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaCommand;
    use crate::progress::ProgressSink;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Engine double: probes fixed properties, "encodes" by touching the
    /// output path, and fails probing for paths containing "bad".
    struct FakeEngine {
        width: u32,
        height: u32,
    }

    impl FakeEngine {
        fn full_hd() -> Self {
            Self { width: 1920, height: 1080 }
        }

        fn fails_for(&self, path: &Path) -> bool {
            path.to_string_lossy().contains("bad")
        }
    }

    #[async_trait]
    impl MediaEngine for FakeEngine {
        async fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32)> {
            if self.fails_for(path) {
                return Err(EndcardError::Probe("no video stream".to_string()));
            }
            Ok((self.width, self.height))
        }

        async fn probe_info(&self, path: &Path) -> Result<VideoInfo> {
            let (width, height) = self.probe_dimensions(path).await?;
            Ok(VideoInfo { width, height, frame_rate: 25.0 })
        }

        async fn probe_duration(&self, path: &Path) -> Result<f64> {
            if self.fails_for(path) {
                return Err(EndcardError::Probe("no duration".to_string()));
            }
            Ok(30.0)
        }

        fn check_availability(&self) -> Result<()> {
            Ok(())
        }

        async fn version_info(&self) -> Result<String> {
            Ok("fake engine".to_string())
        }

        fn hardware_encoder_available(&self) -> bool {
            false
        }

        async fn execute(&self, command: &MediaCommand) -> Result<()> {
            let output = command.args.last().expect("command has an output path");
            std::fs::write(output, b"")?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        total: Option<usize>,
        items: usize,
        completed: bool,
    }

    impl ProgressSink for RecordingSink {
        fn on_total(&mut self, total: usize) {
            assert!(self.total.is_none(), "total emitted twice");
            assert_eq!(self.items, 0, "total must precede item signals");
            self.total = Some(total);
        }

        fn on_item_done(&mut self) {
            assert!(self.total.is_some(), "item signal before total");
            self.items += 1;
        }

        fn on_batch_complete(&mut self) {
            self.completed = true;
        }
    }

    fn workflow() -> Workflow {
        Workflow::with_engine(Config::default(), Box::new(FakeEngine::full_hd()))
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"").unwrap();
    }

    struct Fixture {
        _root: TempDir,
        main_videos: Vec<PathBuf>,
        cta_root: PathBuf,
        output_root: PathBuf,
    }

    /// One main video and one english/learn_more CTA folder holding the
    /// given candidate filenames.
    fn fixture(cta_files: &[&str]) -> Fixture {
        let root = TempDir::new().unwrap();
        let main = root.path().join("promo_30s_DN_v1.mp4");
        touch(&main);

        let cta_root = root.path().join("ctas");
        let folder = cta_root.join("english").join("learn_more");
        std::fs::create_dir_all(&folder).unwrap();
        for file in cta_files {
            touch(&folder.join(file));
        }

        Fixture {
            output_root: root.path().join("output"),
            main_videos: vec![main],
            cta_root,
            _root: root,
        }
    }

    #[tokio::test]
    async fn produces_one_named_output_per_matching_combination() {
        let fx = fixture(&["learn_more_16x9.mp4"]);
        let mut sink = RecordingSink::default();

        let summary = workflow()
            .process_videos(&fx.main_videos, &fx.cta_root, &fx.output_root, 4.0, false, &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.encoded, 1);
        assert!(
            fx.output_root
                .join("english/learn_more/promo_EN_LM_30s_16x9.mp4")
                .is_file()
        );
        assert_eq!(sink.total, Some(1));
        assert_eq!(sink.items, 1);
        assert!(sink.completed);
    }

    #[tokio::test]
    async fn mismatched_aspect_counts_as_match_miss() {
        let fx = fixture(&["learn_more_9x16.mp4"]);
        let mut sink = RecordingSink::default();

        let summary = workflow()
            .process_videos(&fx.main_videos, &fx.cta_root, &fx.output_root, 4.0, false, &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.match_missed, 1);
        assert_eq!(summary.encoded, 0);
        assert!(!fx.output_root.join("english/learn_more").exists());
        assert_eq!(sink.items, 1);
    }

    #[tokio::test]
    async fn probe_failures_still_emit_one_unit_per_leaf_folder() {
        let root = TempDir::new().unwrap();
        let good = root.path().join("promo_30s_DN_v1.mp4");
        let bad = root.path().join("bad_clip.mp4");
        touch(&good);
        touch(&bad);

        let cta_root = root.path().join("ctas");
        for language in ["english", "german"] {
            let folder = cta_root.join(language).join("learn_more");
            std::fs::create_dir_all(&folder).unwrap();
            touch(&folder.join("learn_more_16x9.mp4"));
        }

        let mut sink = RecordingSink::default();
        let summary = workflow()
            .process_videos(
                &[good, bad],
                &cta_root,
                &root.path().join("output"),
                4.0,
                false,
                &mut sink,
            )
            .await
            .unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.encoded, 2);
        assert_eq!(summary.probe_skipped, 2);
        assert_eq!(sink.total, Some(4));
        assert_eq!(sink.items, 4);
        assert!(sink.completed);
    }

    #[tokio::test]
    async fn same_base_name_gets_numbered_on_collision() {
        let root = TempDir::new().unwrap();
        let first = root.path().join("a").join("promo_30s_DN_v1.mp4");
        let second = root.path().join("b").join("promo_30s_DN_v1.mp4");
        for video in [&first, &second] {
            std::fs::create_dir_all(video.parent().unwrap()).unwrap();
            touch(video);
        }

        let cta_root = root.path().join("ctas");
        let folder = cta_root.join("english").join("learn_more");
        std::fs::create_dir_all(&folder).unwrap();
        touch(&folder.join("learn_more_16x9.mp4"));

        let output_root = root.path().join("output");
        let mut sink = RecordingSink::default();
        let summary = workflow()
            .process_videos(&[first, second], &cta_root, &output_root, 4.0, false, &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.encoded, 2);
        let leaf = output_root.join("english/learn_more");
        assert!(leaf.join("promo_EN_LM_30s_16x9.mp4").is_file());
        assert!(leaf.join("promo_EN_LM_30s_16x9_1.mp4").is_file());
    }

    #[tokio::test]
    async fn empty_catalog_completes_with_zero_total() {
        let root = TempDir::new().unwrap();
        let main = root.path().join("promo.mp4");
        touch(&main);
        let cta_root = root.path().join("ctas");
        std::fs::create_dir_all(&cta_root).unwrap();

        let mut sink = RecordingSink::default();
        let summary = workflow()
            .process_videos(
                &[main],
                &cta_root,
                &root.path().join("output"),
                4.0,
                false,
                &mut sink,
            )
            .await
            .unwrap();

        assert_eq!(summary, BatchSummary { total: 0, ..Default::default() });
        assert_eq!(sink.total, Some(0));
        assert!(sink.completed);
    }

    #[tokio::test]
    async fn configuration_errors_surface_before_any_work() {
        let root = TempDir::new().unwrap();
        let main = root.path().join("promo.mp4");
        touch(&main);
        let cta_root = root.path().join("ctas");
        std::fs::create_dir_all(&cta_root).unwrap();
        let output_root = root.path().join("output");
        let mut sink = RecordingSink::default();

        let no_inputs = workflow()
            .process_videos(&[], &cta_root, &output_root, 4.0, false, &mut sink)
            .await;
        assert!(matches!(no_inputs, Err(EndcardError::Config(_))));

        let missing_input = workflow()
            .process_videos(
                &[root.path().join("nope.mp4")],
                &cta_root,
                &output_root,
                4.0,
                false,
                &mut sink,
            )
            .await;
        assert!(matches!(missing_input, Err(EndcardError::FileNotFound(_))));

        let bad_duration = workflow()
            .process_videos(&[main], &cta_root, &output_root, 0.0, false, &mut sink)
            .await;
        assert!(matches!(bad_duration, Err(EndcardError::Config(_))));

        assert!(sink.total.is_none(), "no progress signals before validation passes");
        assert!(!output_root.exists());
    }

    #[test]
    fn collects_mp4_files_recursively() {
        let root = TempDir::new().unwrap();
        touch(&root.path().join("a.mp4"));
        touch(&root.path().join("notes.txt"));
        std::fs::create_dir_all(root.path().join("nested")).unwrap();
        touch(&root.path().join("nested/b.MP4"));

        let videos = collect_main_videos(root.path()).unwrap();
        let names: Vec<_> = videos
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.mp4", "b.MP4"]);
    }
}
