/*!
 * Media pipeline boundary: ffmpeg/ffprobe invocation and the frame storage
 * naming convention.
 *
 * Frames live on disk as zero-padded 4-digit numeric filenames
 * (`0001.png`, `0002.png`, ...) produced by ffmpeg's `%04d` muxer pattern.
 * Every component parses frame indices from this convention, so both the
 * formatter and the parser live here and nowhere else.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::{debug, error, warn};
use tokio::process::Command;
use walkdir::WalkDir;

/// Image format used for extracted frames
pub const FRAME_FORMAT: &str = "png";

/// Format the storage path for a frame index inside a frames directory.
pub fn frame_path(frames_dir: &Path, index: u32) -> PathBuf {
    frames_dir.join(format!("{:04}.{}", index, FRAME_FORMAT))
}

/// Parse the frame index from a storage path (`.../0042.png` -> `42`).
/// Returns `None` for paths that do not follow the convention.
pub fn parse_frame_index(path: &Path) -> Option<u32> {
    path.file_stem()?.to_str()?.parse().ok()
}

/// List the extracted frame paths in a directory, sorted by filename (and
/// therefore by frame index, thanks to the zero padding).
pub fn list_frame_paths(frames_dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(frames_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension().and_then(|e| e.to_str()) == Some(FRAME_FORMAT)
                && parse_frame_index(path).is_some()
        })
        .collect();
    paths.sort();
    paths
}

/// Temp working directory for a video: a sibling directory named after the
/// file stem. Created if missing.
pub fn temp_directory_path(video_path: &Path) -> Result<PathBuf> {
    let stem = video_path
        .file_stem()
        .ok_or_else(|| anyhow!("Video path has no file stem: {:?}", video_path))?;
    let dir = video_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(stem);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create temp directory: {}", dir.display()))?;
    Ok(dir)
}

/// Run ffmpeg with the standard quiet flags plus `args`, with a timeout.
async fn run_ffmpeg(args: &[&str], timeout: Duration) -> Result<()> {
    let ffmpeg_future = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error"])
        .args(args)
        .output();

    let output = tokio::select! {
        result = ffmpeg_future => {
            result.map_err(|e| anyhow!("Failed to execute ffmpeg: {}", e))?
        },
        _ = tokio::time::sleep(timeout) => {
            return Err(anyhow!("ffmpeg timed out after {:?}", timeout));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("ffmpeg failed: {}", stderr.trim());
        return Err(anyhow!("ffmpeg failed: {}", stderr.trim()));
    }
    Ok(())
}

/// Detect the frame rate of a video with ffprobe. Falls back to 30.0 when
/// the rate cannot be determined.
pub async fn detect_fps(video_path: &Path) -> f64 {
    let probe_future = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=r_frame_rate",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(video_path)
        .output();

    let output = tokio::select! {
        result = probe_future => result,
        _ = tokio::time::sleep(Duration::from_secs(60)) => {
            warn!("ffprobe timed out detecting fps, assuming 30");
            return 30.0;
        }
    };

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            match parse_frame_rate(stdout.trim()) {
                Some(fps) => fps,
                None => {
                    warn!("Could not parse frame rate {:?}, assuming 30", stdout.trim());
                    30.0
                }
            }
        }
        _ => {
            warn!("ffprobe failed to detect fps, assuming 30");
            30.0
        }
    }
}

/// Parse ffprobe's rational `r_frame_rate` output (e.g. "30000/1001").
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let mut parts = raw.split('/');
    let numerator: f64 = parts.next()?.trim().parse().ok()?;
    match parts.next() {
        Some(denominator) => {
            let denominator: f64 = denominator.trim().parse().ok()?;
            if denominator == 0.0 {
                None
            } else {
                Some(numerator / denominator)
            }
        }
        None => Some(numerator),
    }
}

/// Extract frames from a video into `frames_dir` at the given rate.
pub async fn extract_frames(video_path: &Path, frames_dir: &Path, fps: f64) -> Result<()> {
    let pattern = frames_dir.join(format!("%04d.{}", FRAME_FORMAT));
    debug!("Extracting frames to {}", frames_dir.display());
    run_ffmpeg(
        &[
            "-hwaccel",
            "auto",
            "-i",
            video_path.to_str().unwrap_or_default(),
            "-q:v",
            "1",
            "-pix_fmt",
            "rgb24",
            "-vf",
            &format!("fps={}", fps),
            pattern.to_str().unwrap_or_default(),
        ],
        Duration::from_secs(1800),
    )
    .await
    .context("Frame extraction failed")
}

/// Re-encode the repaired frame sequence into a video, muxing the original
/// audio track back in.
pub async fn compose_video(
    video_path: &Path,
    frames_dir: &Path,
    output_path: &Path,
    fps: f64,
    crf: u32,
) -> Result<()> {
    let pattern = frames_dir.join(format!("%04d.{}", FRAME_FORMAT));
    run_ffmpeg(
        &[
            "-hwaccel",
            "auto",
            "-r",
            &fps.to_string(),
            "-i",
            pattern.to_str().unwrap_or_default(),
            "-i",
            video_path.to_str().unwrap_or_default(),
            "-c:v",
            "libx264",
            "-c:a",
            "aac",
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-pix_fmt",
            "yuv420p",
            "-crf",
            &crf.to_string(),
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-y",
            output_path.to_str().unwrap_or_default(),
        ],
        Duration::from_secs(3600),
    )
    .await
    .context("Video composition failed")
}

/// Burn a subtitle file into a video with ffmpeg's subtitles filter, placing
/// the lines at the given vertical center (the band the originals occupied).
pub async fn embed_subtitles(
    video_path: &Path,
    srt_path: &Path,
    output_path: &Path,
    band_center_y: u32,
    frame_height: u32,
) -> Result<()> {
    // libass measures MarginV from the bottom edge.
    let margin_v = frame_height.saturating_sub(band_center_y);
    let filter = format!(
        "subtitles={}:force_style='Alignment=2,MarginV={}'",
        srt_path.display(),
        margin_v
    );
    run_ffmpeg(
        &[
            "-i",
            video_path.to_str().unwrap_or_default(),
            "-vf",
            &filter,
            "-c:a",
            "copy",
            "-y",
            output_path.to_str().unwrap_or_default(),
        ],
        Duration::from_secs(3600),
    )
    .await
    .context("Subtitle embedding failed")
}
