use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::erase::{BatchScheduler, CommandEngine, InpaintingEngine, writer};
use crate::media_utils;
use crate::ocr::detector::{self, CommandDetector, DetectionMap, TextDetector};
use crate::ocr::{Consolidator, SubtitleBand, consolidator};
use crate::subtitle_processor::{Segmenter, SubtitleEntry, write_srt};
use crate::translation::TranslationService;

/// Constant rate factor for re-encoding the erased video
const COMPOSE_CRF: u32 = 18;

/// Main application controller for the erase and translate workflow
pub struct Controller {
    config: Config,
}

/// Paths of everything the pipeline produces next to the input video.
struct OutputPaths {
    source_srt: PathBuf,
    target_srt: PathBuf,
    erased_video: PathBuf,
    final_video: PathBuf,
}

impl OutputPaths {
    fn new(input_file: &Path, source_language: &str, target_language: &str) -> Self {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let parent = input_file.parent().unwrap_or_else(|| Path::new("."));
        Self {
            source_srt: parent.join(format!("{}.{}.srt", stem, source_language)),
            target_srt: parent.join(format!("{}.{}.srt", stem, target_language)),
            erased_video: parent.join(format!("{}.erased.mp4", stem)),
            final_video: parent.join(format!("{}.{}.mp4", stem, target_language)),
        }
    }
}

impl Controller {
    /// Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Run the full workflow on one video: extract frames, detect and
    /// consolidate subtitle text, erase it, translate it, and embed the
    /// translation into the erased video.
    pub async fn run(&self, input_file: PathBuf, delete_workdir: bool) -> Result<()> {
        let start_time = std::time::Instant::now();

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let outputs = OutputPaths::new(
            &input_file,
            &self.config.source_language,
            &self.config.target_language,
        );
        let frames_dir = media_utils::temp_directory_path(&input_file)?;
        let fps = media_utils::detect_fps(&input_file).await;
        info!("Processing {:?} at {:.3} fps", input_file, fps);

        media_utils::extract_frames(&input_file, &frames_dir, fps).await?;
        let frame_paths = media_utils::list_frame_paths(&frames_dir);
        if frame_paths.is_empty() {
            return Err(anyhow!("No frames were extracted from {:?}", input_file));
        }
        let total_frames = frame_paths.len() as u32;
        let (frame_width, frame_height) = image::image_dimensions(&frame_paths[0])
            .with_context(|| format!("Failed to read frame dimensions: {}", frame_paths[0].display()))?;
        debug!("{} frames extracted at {}x{}", total_frames, frame_width, frame_height);

        let detections = self.detect_text(&frames_dir).await?;
        if detections.is_empty() {
            warn!("No text detected in {:?}, nothing to erase", input_file);
            if delete_workdir {
                self.cleanup_workdir(&frames_dir);
            }
            return Ok(());
        }

        // Consolidate and segment before touching any pixels, so a broken
        // detection run fails fast.
        let consolidator = Consolidator::new(frame_width, frame_height, &self.config.video, fps);
        let (consolidated, band) = consolidator.consolidate(&detections);

        // Persist the consolidated stream next to the raw sidecar so a
        // detection run can be inspected before and after filtering.
        let check_sidecar = frames_dir.join("detections.check.json");
        detector::write_sidecar(
            &consolidator::to_detection_map(&consolidated),
            &frames_dir,
            &check_sidecar,
        )
        .with_context(|| format!("Failed to write sidecar: {}", check_sidecar.display()))?;

        let segmenter = Segmenter::new(fps, self.config.video.min_duration);
        let entries = segmenter.segment(&consolidated);
        info!("Segmented {} subtitle intervals", entries.len());
        write_srt(&entries, fps, &outputs.source_srt)?;

        let multi_progress = MultiProgress::new();
        self.erase_subtitles(&frames_dir, &detections, frame_width, frame_height, fps, total_frames, &multi_progress)
            .await?;

        media_utils::compose_video(&input_file, &frames_dir, &outputs.erased_video, fps, COMPOSE_CRF)
            .await?;

        self.translate_subtitles(&entries, fps, &outputs).await?;

        media_utils::embed_subtitles(
            &outputs.erased_video,
            &outputs.target_srt,
            &outputs.final_video,
            band_center(&band),
            frame_height,
        )
        .await?;

        if delete_workdir {
            self.cleanup_workdir(&frames_dir);
        }

        info!(
            "Finished {:?} in {:.1}s -> {:?}",
            input_file,
            start_time.elapsed().as_secs_f64(),
            outputs.final_video
        );
        Ok(())
    }

    /// Run OCR over the frames, reusing a detection sidecar from a previous
    /// run when one is present.
    async fn detect_text(&self, frames_dir: &Path) -> Result<DetectionMap> {
        let sidecar = frames_dir.join("detections.json");
        if sidecar.exists() {
            info!("Reusing existing detections from {}", sidecar.display());
            let content = std::fs::read_to_string(&sidecar)
                .with_context(|| format!("Failed to read sidecar: {}", sidecar.display()))?;
            return Ok(detector::parse_sidecar(&content)?);
        }

        info!("Running text detection over extracted frames");
        let command_detector = CommandDetector::new(&self.config.detector.command);
        let detections = command_detector.detect(frames_dir).await?;
        Ok(detections)
    }

    /// Schedule and run inpainting over every detected frame, one batch at a
    /// time so only a single batch's pixels are in memory.
    #[allow(clippy::too_many_arguments)]
    async fn erase_subtitles(
        &self,
        frames_dir: &Path,
        detections: &DetectionMap,
        frame_width: u32,
        frame_height: u32,
        fps: f64,
        total_frames: u32,
        multi_progress: &MultiProgress,
    ) -> Result<()> {
        let scheduler = BatchScheduler::new(
            frames_dir,
            frame_width,
            frame_height,
            fps,
            self.config.erase.max_frame_length,
            self.config.erase.min_frame_length,
            self.config.erase.mask_expand,
            total_frames,
        );
        let plans = scheduler.plan(detections);
        if plans.is_empty() {
            return Ok(());
        }

        let progress_bar = multi_progress.add(ProgressBar::new(plans.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style);
        progress_bar.set_message("Erasing subtitles");

        let engine = CommandEngine::new(&self.config.erase.engine_command);
        for plan in &plans {
            let batch = scheduler.materialize(plan)?;
            let repaired = engine
                .inpaint(&batch, self.config.erase.neighbor_stride)
                .await?;
            writer::write_frames(repaired, self.config.erase.write_concurrency).await?;
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();
        Ok(())
    }

    /// Translate the rendered SRT in one piece. Falls back to the
    /// untranslated file when every attempt is rejected, so the embed step
    /// always has something to burn in.
    async fn translate_subtitles(
        &self,
        entries: &[SubtitleEntry],
        fps: f64,
        outputs: &OutputPaths,
    ) -> Result<()> {
        let original = crate::subtitle_processor::render_srt(entries, fps);
        let service = TranslationService::new(self.config.translation.clone())?;

        let translated = match service
            .translate_srt(
                &original,
                &self.config.source_language,
                &self.config.target_language,
            )
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Translation failed, embedding the untranslated subtitles: {}", e);
                original.clone()
            }
        };

        std::fs::write(&outputs.target_srt, &translated)
            .with_context(|| format!("Failed to write subtitle file: {}", outputs.target_srt.display()))?;
        Ok(())
    }

    fn cleanup_workdir(&self, frames_dir: &Path) {
        if let Err(e) = std::fs::remove_dir_all(frames_dir) {
            warn!("Failed to remove working directory {}: {}", frames_dir.display(), e);
        }
    }
}

/// The band center as a pixel row, clamped to zero for empty bands.
fn band_center(band: &SubtitleBand) -> u32 {
    band.center_y.max(0.0) as u32
}
