/*!
 * OCR boundary and per-frame detection shaping.
 *
 * This module turns the raw output of an external text detector into one
 * trustworthy subtitle record per frame. It is split into:
 *
 * - `detector`: the detector boundary (bounding boxes, raw observations,
 *   the `TextDetector` trait and sidecar JSON parsing)
 * - `band`: robust 1-D grouping used to find the dominant subtitle band
 * - `consolidator`: per-frame merge, in-band filtering and gap-fill
 */

pub mod band;
pub mod consolidator;
pub mod detector;

pub use band::{grouped_mean, SubtitleBand};
pub use consolidator::{Consolidator, FrameText};
pub use detector::{BoundingBox, DetectionMap, OcrObservation, TextDetector};
