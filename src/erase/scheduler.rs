/*!
 * Inpainting batch scheduler.
 *
 * The inpainting engine is stateful over time: it needs enough temporal
 * context to repair a frame (at least `min_frame_length` frames) but cannot
 * hold arbitrarily many (at most `max_frame_length`). This module groups the
 * raw detections into bounded, temporally-contiguous batch plans, then
 * materializes one plan at a time into pixel data.
 *
 * The scheduler consumes the *raw* detection map, not the consolidated
 * stream: the erasure mask must cover every frame with any detected box,
 * not just the dominant-band subtitle.
 *
 * Planning is a strictly sequential fold over records in increasing frame
 * order. The accumulator carries the previous frame index, so it cannot be
 * sharded or parallelized.
 */

use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage};
use log::debug;

use crate::erase::mask::{self, MaskRect};
use crate::errors::EngineError;
use crate::media_utils;
use crate::ocr::detector::DetectionMap;

/// One planned frame: its index, storage path, and the mask rectangles to
/// erase. No rectangles means an empty mask (context-only frame).
#[derive(Debug, Clone, PartialEq)]
pub struct PlanFrame {
    pub index: u32,
    pub path: PathBuf,
    pub rects: Vec<MaskRect>,
}

/// A bounded, temporally-contiguous group of planned frames.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub frames: Vec<PlanFrame>,
}

/// A materialized batch: three lists aligned by position, consumed exactly
/// once by the inpainting engine.
pub struct MaskBatch {
    pub paths: Vec<PathBuf>,
    pub frames: Vec<RgbImage>,
    pub masks: Vec<GrayImage>,
}

/// Groups detected frames into batch plans.
pub struct BatchScheduler {
    frames_dir: PathBuf,
    frame_width: u32,
    frame_height: u32,
    /// Index gap that forces a new batch: `2 × fps`
    gap_frames: f64,
    max_frame_length: usize,
    min_frame_length: usize,
    mask_expand: i32,
    /// Highest frame index on disk; extensions never run past it
    total_frames: u32,
}

impl BatchScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frames_dir: &Path,
        frame_width: u32,
        frame_height: u32,
        fps: f64,
        max_frame_length: usize,
        min_frame_length: usize,
        mask_expand: i32,
        total_frames: u32,
    ) -> Self {
        Self {
            frames_dir: frames_dir.to_path_buf(),
            frame_width,
            frame_height,
            gap_frames: fps * 2.0,
            max_frame_length,
            min_frame_length,
            mask_expand,
            total_frames,
        }
    }

    /// Plan batches over the raw detections. Pure: no image I/O happens here.
    pub fn plan(&self, detections: &DetectionMap) -> Vec<BatchPlan> {
        let mut accumulator = BatchAccumulator::new(self);
        for (&index, observations) in detections {
            let rects: Vec<MaskRect> = observations
                .iter()
                .filter_map(|obs| {
                    mask::mask_rect(&obs.bbox, self.frame_width, self.frame_height, self.mask_expand)
                })
                .collect();
            accumulator.push(index, rects);
        }
        let batches = accumulator.finish();
        debug!(
            "Planned {} inpainting batches over {} detected frames",
            batches.len(),
            detections.len()
        );
        batches
    }

    /// Load the plan's frames and rasterize its masks. Called one plan at a
    /// time so only one batch's pixels are in memory.
    pub fn materialize(&self, plan: &BatchPlan) -> Result<MaskBatch, EngineError> {
        let mut paths = Vec::with_capacity(plan.frames.len());
        let mut frames = Vec::with_capacity(plan.frames.len());
        let mut masks = Vec::with_capacity(plan.frames.len());

        for frame in &plan.frames {
            let image = image::open(&frame.path)?.to_rgb8();
            let mask = if frame.rects.is_empty() {
                mask::empty_mask(image.width(), image.height())
            } else {
                mask::rasterize(&frame.rects, image.width(), image.height())
            };
            paths.push(frame.path.clone());
            frames.push(image);
            masks.push(mask);
        }

        Ok(MaskBatch { paths, frames, masks })
    }
}

/// Explicit accumulator for the planning fold: the running batch, the
/// previous accumulated frame index, and the finished batches.
struct BatchAccumulator<'a> {
    scheduler: &'a BatchScheduler,
    batches: Vec<BatchPlan>,
    current: Vec<PlanFrame>,
    prev_index: u32,
}

impl<'a> BatchAccumulator<'a> {
    fn new(scheduler: &'a BatchScheduler) -> Self {
        Self {
            scheduler,
            batches: Vec::new(),
            current: Vec::new(),
            prev_index: 0,
        }
    }

    /// Feed the next detected frame, in increasing index order.
    fn push(&mut self, index: u32, rects: Vec<MaskRect>) {
        let splits = !self.current.is_empty()
            && ((index - self.prev_index) as f64 >= self.scheduler.gap_frames
                || self.current.len() >= self.scheduler.max_frame_length);
        if splits {
            self.close(Some(index));
        }

        self.current.push(PlanFrame {
            index,
            path: media_utils::frame_path(&self.scheduler.frames_dir, index),
            rects,
        });
        self.prev_index = index;
    }

    /// Close the running batch, first extending it forward with empty-mask
    /// context frames: up to `min_frame_length` indices past the last
    /// detection, stopping at the next detection and at the end of the
    /// frame sequence. Short isolated detections still end up with a batch
    /// long enough for the engine's temporal context.
    fn close(&mut self, next_index: Option<u32>) {
        if self.current.is_empty() {
            return;
        }

        let last = self.prev_index;
        let cap = last + self.scheduler.min_frame_length as u32;
        let end_exclusive = next_index.unwrap_or(cap);

        for index in (last + 1)..end_exclusive {
            if index > self.scheduler.total_frames || index > cap {
                break;
            }
            self.current.push(PlanFrame {
                index,
                path: media_utils::frame_path(&self.scheduler.frames_dir, index),
                rects: Vec::new(),
            });
        }

        self.batches.push(BatchPlan {
            frames: std::mem::take(&mut self.current),
        });
    }

    /// Flush the final batch and absorb it into its predecessor when it is
    /// too short for the engine. A structural correction, not an error.
    fn finish(mut self) -> Vec<BatchPlan> {
        self.close(None);

        let undersized_tail = self.batches.len() >= 2
            && self
                .batches
                .last()
                .is_some_and(|batch| batch.frames.len() < self.scheduler.min_frame_length);
        if undersized_tail {
            if let Some(short) = self.batches.pop() {
                if let Some(previous) = self.batches.last_mut() {
                    previous.frames.extend(short.frames);
                }
            }
        }

        self.batches
    }
}
