/*!
 * Text detector boundary.
 *
 * The detector itself is an external black box (a vision model run out of
 * process). This module owns the data shapes that cross the boundary and the
 * parsing of the detector's JSON sidecar into a proper two-level structure:
 * frame index to list of raw observations. The sidecar keys frames by
 * `"<frame path>,<detection index>"`; those composite strings are parsed
 * exactly once, here, and never leak further into the pipeline.
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;

use crate::errors::DetectorError;
use crate::media_utils;

/// Axis-aligned box in frame pixel space.
///
/// The detector disambiguates quad corners with min/max arithmetic, which can
/// produce degenerate boxes (`xmin > xmax`) for skewed text. Those are kept
/// as-is; consumers clamp rather than reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BoundingBox {
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Horizontal center; meaningful even for degenerate boxes
    pub fn center_x(&self) -> f64 {
        (self.xmin + self.xmax) as f64 / 2.0
    }

    /// Vertical center
    pub fn center_y(&self) -> f64 {
        (self.ymin + self.ymax) as f64 / 2.0
    }

    /// Box height; can be negative for degenerate boxes
    pub fn height(&self) -> f64 {
        (self.ymax - self.ymin) as f64
    }

    /// Smallest box covering both `self` and `other`
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

/// One raw detector output for a frame: a box and the text read inside it.
/// A frame may carry zero or several observations before consolidation.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrObservation {
    pub bbox: BoundingBox,
    pub text: String,
}

/// Raw detections keyed by frame index, in frame order. Frames with no
/// detection are simply absent.
pub type DetectionMap = BTreeMap<u32, Vec<OcrObservation>>;

/// Boundary trait for the external text detector.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Run detection over the extracted frames and return raw observations
    /// per frame index.
    async fn detect(&self, frames_dir: &Path) -> Result<DetectionMap, DetectorError>;
}

/// Detector backed by an external command.
///
/// The command is invoked with the frames directory and an output path; it is
/// expected to write a JSON object keyed `"<frame path>,<idx>"` with values
/// `{"box": [xmin, ymin, xmax, ymax], "text": "..."}`, the sidecar format
/// the pipeline also persists for debugging.
pub struct CommandDetector {
    command: String,
    timeout: Duration,
}

impl CommandDetector {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            // Vision models over a full episode of frames are slow.
            timeout: Duration::from_secs(3600),
        }
    }
}

#[async_trait]
impl TextDetector for CommandDetector {
    async fn detect(&self, frames_dir: &Path) -> Result<DetectionMap, DetectorError> {
        let sidecar = frames_dir.join("detections.json");

        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| DetectorError::CommandFailed("empty detector command".to_string()))?;

        let detect_future = Command::new(program)
            .args(parts)
            .arg(frames_dir)
            .arg(&sidecar)
            .output();

        let output = tokio::select! {
            result = detect_future => {
                result.map_err(|e| DetectorError::CommandFailed(e.to_string()))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(DetectorError::CommandFailed(format!(
                    "detector command timed out after {:?}", self.timeout
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Detector command failed: {}", stderr);
            return Err(DetectorError::CommandFailed(stderr.into_owned()));
        }

        let content = std::fs::read_to_string(&sidecar)
            .map_err(|e| DetectorError::ParseError(format!("{}: {}", sidecar.display(), e)))?;
        parse_sidecar(&content)
    }
}

/// Parse the detector's composite-keyed JSON sidecar into a `DetectionMap`.
///
/// Missing frames and multiple detections per frame are both normal; records
/// with malformed keys or boxes are skipped with a warning rather than
/// failing the run.
pub fn parse_sidecar(content: &str) -> Result<DetectionMap, DetectorError> {
    let json: Value =
        serde_json::from_str(content).map_err(|e| DetectorError::ParseError(e.to_string()))?;

    let object = json
        .as_object()
        .ok_or_else(|| DetectorError::ParseError("expected a top-level object".to_string()))?;

    // Keys are "<frame path>,<detection idx>". The JSON map iterates keys
    // lexicographically, which permutes detection indices past 9, so each
    // frame's observations are re-sorted by the parsed index before the
    // positional index is dropped.
    let mut indexed: BTreeMap<u32, Vec<(u32, OcrObservation)>> = BTreeMap::new();
    for (key, value) in object {
        let (frame_part, detection_part) = key.rsplit_once(',').unwrap_or((key.as_str(), "0"));
        let index = match media_utils::parse_frame_index(Path::new(frame_part)) {
            Some(index) => index,
            None => {
                warn!("Skipping detection with unparseable frame key: {}", key);
                continue;
            }
        };

        let bbox = match value.get("box").and_then(|b| b.as_array()) {
            Some(coords) if coords.len() == 4 => {
                let c: Vec<i32> = coords
                    .iter()
                    .map(|v| v.as_i64().unwrap_or(0) as i32)
                    .collect();
                BoundingBox::new(c[0], c[1], c[2], c[3])
            }
            _ => {
                warn!("Skipping detection without a 4-element box: {}", key);
                continue;
            }
        };

        let text = value
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();

        let detection_idx = detection_part.trim().parse::<u32>().unwrap_or(u32::MAX);
        indexed
            .entry(index)
            .or_default()
            .push((detection_idx, OcrObservation { bbox, text }));
    }

    let mut map = DetectionMap::new();
    for (index, mut observations) in indexed {
        observations.sort_by_key(|(detection_idx, _)| *detection_idx);
        map.insert(index, observations.into_iter().map(|(_, obs)| obs).collect());
    }

    debug!("Parsed {} frames with detections from sidecar", map.len());
    Ok(map)
}

/// Persist a detection map back to the composite-key sidecar format, for
/// debugging parity with the raw detector output.
pub fn write_sidecar(map: &DetectionMap, frames_dir: &Path, path: &Path) -> std::io::Result<()> {
    let mut object = serde_json::Map::new();
    for (index, observations) in map {
        let frame_path: PathBuf = media_utils::frame_path(frames_dir, *index);
        for (i, obs) in observations.iter().enumerate() {
            let key = format!("{},{}", frame_path.display(), i);
            object.insert(
                key,
                serde_json::json!({
                    "box": [obs.bbox.xmin, obs.bbox.ymin, obs.bbox.xmax, obs.bbox.ymax],
                    "text": obs.text,
                }),
            );
        }
    }
    let content = serde_json::to_string_pretty(&Value::Object(object))?;
    std::fs::write(path, content)
}
