/*!
 * OCR consolidation: from noisy raw observations to one trustworthy
 * subtitle record per frame.
 *
 * Three sequential passes over the detection map:
 *
 * 1. keep observations horizontally near the frame center and estimate the
 *    dominant band (vertical center + glyph height) from the survivors;
 * 2. keep observations inside the band and merge multiple fragments on the
 *    same frame into a single box/text record;
 * 3. gap-fill: synthesize records for short runs of missed frames between
 *    two identical detections.
 *
 * All passes are deterministic, sequential walks in increasing frame order.
 */

use std::collections::BTreeMap;

use log::{debug, info};

use crate::app_config::VideoConfig;
use crate::ocr::band::{grouped_mean, SubtitleBand};
use crate::ocr::detector::{BoundingBox, DetectionMap, OcrObservation};
use crate::subtitle_processor::normalize_text;

/// One merged subtitle record for a frame that survived filtering. Absent
/// frame indices mean "no subtitle on this frame".
#[derive(Debug, Clone, PartialEq)]
pub struct FrameText {
    pub bbox: BoundingBox,
    pub text: String,
}

/// Per-frame text stream after consolidation, keyed by frame index.
pub type ConsolidatedFrames = BTreeMap<u32, FrameText>;

/// Flatten a consolidated stream back into a detection map, one observation
/// per frame, so it can be persisted in the sidecar format.
pub fn to_detection_map(frames: &ConsolidatedFrames) -> DetectionMap {
    frames
        .iter()
        .map(|(&index, frame)| {
            (index, vec![OcrObservation { bbox: frame.bbox, text: frame.text.clone() }])
        })
        .collect()
}

/// Consolidates raw detections for one video. Holds the geometry thresholds
/// derived from the frame dimensions and config.
pub struct Consolidator {
    frame_center_x: f64,
    /// Horizontal window around the frame center, in pixels
    x_delta: f64,
    /// Vertical window around the band center, in pixels
    y_delta: f64,
    /// Grouping tolerance shared by band estimation and height filtering
    tolerance: f64,
    /// Maximum index gap treated as the same subtitle, in frames
    gap_frames: f64,
}

impl Consolidator {
    pub fn new(frame_width: u32, frame_height: u32, config: &VideoConfig, fps: f64) -> Self {
        Self {
            frame_center_x: frame_width as f64 / 2.0,
            x_delta: frame_width as f64 * config.width_delta,
            y_delta: frame_height as f64 * config.height_delta,
            tolerance: config.groups_tolerance,
            gap_frames: fps * config.min_duration,
        }
    }

    /// Run all three passes. Returns the consolidated per-frame stream and
    /// the immutable band estimate the run settled on.
    pub fn consolidate(&self, detections: &DetectionMap) -> (ConsolidatedFrames, SubtitleBand) {
        let band = self.estimate_band(detections);
        info!(
            "Subtitle band: center_y={:.1}, word_height={:.1}",
            band.center_y, band.word_height
        );

        let merged = self.merge_in_band(detections, &band);
        let filled = self.fill_gaps(&merged, &band);
        debug!(
            "Consolidation: {} raw frames -> {} merged -> {} after gap-fill",
            detections.len(),
            merged.len(),
            filled.len()
        );
        (filled, band)
    }

    /// Pass 1: estimate the dominant band from horizontally centered
    /// observations.
    fn estimate_band(&self, detections: &DetectionMap) -> SubtitleBand {
        let mut centers = Vec::new();
        let mut heights = Vec::new();
        for observations in detections.values() {
            for obs in observations {
                if self.near_center_x(&obs.bbox) {
                    centers.push(obs.bbox.center_y());
                    heights.push(obs.bbox.height());
                }
            }
        }
        SubtitleBand {
            center_y: grouped_mean(&centers, self.tolerance),
            word_height: grouped_mean(&heights, self.tolerance),
            tolerance: self.tolerance,
        }
    }

    /// Pass 2: keep in-band observations and merge fragments per frame.
    fn merge_in_band(&self, detections: &DetectionMap, band: &SubtitleBand) -> ConsolidatedFrames {
        let mut merged = ConsolidatedFrames::new();
        for (&index, observations) in detections {
            for obs in observations {
                if !self.in_band(&obs.bbox, band) {
                    continue;
                }
                match merged.get_mut(&index) {
                    None => {
                        merged.insert(
                            index,
                            FrameText { bbox: obs.bbox, text: obs.text.clone() },
                        );
                    }
                    Some(existing) => {
                        if self.fragments_belong_together(existing, obs) {
                            existing.text = merge_fragment_text(&existing.bbox, &existing.text, obs);
                            existing.bbox = existing.bbox.union(&obs.bbox);
                        }
                    }
                }
            }
        }
        merged
    }

    /// Pass 3: re-check the band and center windows, then synthesize records
    /// for short runs of missed frames between identical-text detections.
    fn fill_gaps(&self, merged: &ConsolidatedFrames, band: &SubtitleBand) -> ConsolidatedFrames {
        let mut filled = ConsolidatedFrames::new();
        let mut prev_index: u32 = 0;
        let mut prev_text = String::new();

        for (&index, record) in merged {
            let centered = (record.bbox.center_x() - self.frame_center_x).abs() <= self.x_delta;
            let in_band = (record.bbox.center_y() - band.center_y).abs() < self.y_delta;
            if !(centered && in_band) {
                continue;
            }

            if normalize_text(&record.text) == normalize_text(&prev_text)
                && (index - prev_index) as f64 <= self.gap_frames
            {
                for missing in (prev_index + 1)..index {
                    filled.insert(missing, record.clone());
                }
            }
            filled.insert(index, record.clone());
            prev_index = index;
            prev_text = record.text.clone();
        }
        filled
    }

    fn near_center_x(&self, bbox: &BoundingBox) -> bool {
        (bbox.center_x() - self.frame_center_x).abs() < self.x_delta
    }

    fn in_band(&self, bbox: &BoundingBox, band: &SubtitleBand) -> bool {
        let vertical = (bbox.center_y() - band.center_y).abs() < self.y_delta;
        let height = bbox.height() >= band.word_height - self.tolerance
            && bbox.height() <= band.word_height + self.tolerance;
        vertical && height
    }

    /// Two fragments on one frame belong to the same subtitle when they are
    /// horizontally adjacent and vertically aligned, or when the new fragment
    /// itself sits in the centered window.
    fn fragments_belong_together(&self, existing: &FrameText, obs: &OcrObservation) -> bool {
        let adjacent = ((obs.bbox.xmin - existing.bbox.xmax) as f64 <= self.x_delta / 2.0
            || (existing.bbox.xmin - obs.bbox.xmax) as f64 <= self.x_delta / 2.0)
            && ((existing.bbox.ymin - obs.bbox.ymin) as f64).abs() <= self.tolerance / 2.0
            && ((existing.bbox.ymax - obs.bbox.ymax) as f64).abs() <= self.tolerance / 2.0;
        adjacent || self.near_center_x(&obs.bbox)
    }
}

/// Concatenate a new fragment's text into a frame's running text.
///
/// When the fragments do not overlap horizontally the result reads
/// left-to-right by position; when they overlap (the adjacency path) the
/// encounter order is kept. The original implementation had both behaviors
/// in two divergent code paths; the position-aware ordering is the one that
/// reads correctly for multi-fragment subtitles.
fn merge_fragment_text(existing_bbox: &BoundingBox, existing_text: &str, obs: &OcrObservation) -> String {
    if obs.bbox.xmin >= existing_bbox.xmax {
        // New fragment fully to the right
        format!("{}{}", existing_text, obs.text)
    } else if obs.bbox.xmax <= existing_bbox.xmin {
        // New fragment fully to the left
        format!("{}{}", obs.text, existing_text)
    } else {
        // Horizontal overlap: fixed encounter order
        format!("{}{}", existing_text, obs.text)
    }
}
