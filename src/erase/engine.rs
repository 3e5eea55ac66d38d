/*!
 * Inpainting engine boundary.
 *
 * The engine itself (a video inpainting network) is an external black box.
 * The boundary contract: given one batch of aligned (paths, frames, masks)
 * plus a neighbor stride, return a repaired frame for every input path.
 * Batches are submitted strictly sequentially; the engine carries temporal
 * state within a batch but not across batches.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use log::{debug, error};
use tokio::process::Command;

use crate::erase::scheduler::MaskBatch;
use crate::errors::EngineError;

/// One repaired frame, aligned to an input path of the batch.
pub struct RepairedFrame {
    pub path: PathBuf,
    pub image: RgbImage,
}

/// Boundary trait for the external inpainting engine.
#[async_trait]
pub trait InpaintingEngine: Send + Sync {
    /// Repair one batch. Returns one frame per input path, in input order.
    async fn inpaint(
        &self,
        batch: &MaskBatch,
        neighbor_stride: u32,
    ) -> Result<Vec<RepairedFrame>, EngineError>;
}

/// Engine backed by an external command.
///
/// The batch's masks are written beside the frames (`masks/%04d.png`), a
/// JSON manifest describing the batch is handed to the command, and the
/// repaired frames are read back from the manifest's output directory under
/// their original filenames.
pub struct CommandEngine {
    command: String,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: Duration::from_secs(3600),
        }
    }

    fn work_dirs(batch: &MaskBatch) -> Result<(PathBuf, PathBuf), EngineError> {
        let first = batch
            .paths
            .first()
            .ok_or_else(|| EngineError::CommandFailed("empty batch".to_string()))?;
        let frames_dir = first
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        Ok((frames_dir.join("masks"), frames_dir.join("repaired")))
    }
}

#[async_trait]
impl InpaintingEngine for CommandEngine {
    async fn inpaint(
        &self,
        batch: &MaskBatch,
        neighbor_stride: u32,
    ) -> Result<Vec<RepairedFrame>, EngineError> {
        let (masks_dir, output_dir) = Self::work_dirs(batch)?;
        std::fs::create_dir_all(&masks_dir)?;
        std::fs::create_dir_all(&output_dir)?;

        // Write masks under the frame filenames so the engine can pair them.
        let mut mask_paths = Vec::with_capacity(batch.paths.len());
        for (path, mask) in batch.paths.iter().zip(&batch.masks) {
            let file_name = path
                .file_name()
                .ok_or_else(|| EngineError::MissingFrame(path.clone()))?;
            let mask_path = masks_dir.join(file_name);
            mask.save(&mask_path)?;
            mask_paths.push(mask_path);
        }

        let manifest = serde_json::json!({
            "frames": batch.paths,
            "masks": mask_paths,
            "output_dir": output_dir,
            "neighbor_stride": neighbor_stride,
        });
        let manifest_path = output_dir.join("batch.json");
        std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| EngineError::CommandFailed("empty engine command".to_string()))?;

        debug!("Submitting batch of {} frames to inpainting engine", batch.paths.len());
        let engine_future = Command::new(program)
            .args(parts)
            .arg(&manifest_path)
            .output();

        let output = tokio::select! {
            result = engine_future => {
                result.map_err(|e| EngineError::CommandFailed(e.to_string()))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(EngineError::CommandFailed(format!(
                    "engine timed out after {:?}", self.timeout
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Inpainting engine failed: {}", stderr.trim());
            return Err(EngineError::CommandFailed(stderr.into_owned()));
        }

        // Read repaired frames back, aligned to the input order.
        let mut repaired = Vec::with_capacity(batch.paths.len());
        for path in &batch.paths {
            let file_name = path
                .file_name()
                .ok_or_else(|| EngineError::MissingFrame(path.clone()))?;
            let repaired_path = output_dir.join(file_name);
            if !repaired_path.exists() {
                return Err(EngineError::MissingFrame(path.clone()));
            }
            let image = image::open(&repaired_path)?.to_rgb8();
            repaired.push(RepairedFrame { path: path.clone(), image });
        }
        Ok(repaired)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::CommandFailed(error.to_string())
    }
}
