/*!
 * Subtitle segmentation and SRT handling.
 *
 * Converts the consolidated per-frame text stream into discrete subtitle
 * intervals, and renders/parses the SRT exchange format used with the
 * translation collaborator.
 */

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ocr::consolidator::ConsolidatedFrames;

// SRT timestamp line, e.g. "00:01:02,345 --> 00:01:04,000"
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2,}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

// Everything that is not a word character or whitespace, Unicode-aware.
static PUNCTUATION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Strip punctuation for text comparison. Detectors jitter on punctuation
/// marks between frames far more than on the words themselves, so interval
/// boundaries are decided on the stripped form only.
pub fn normalize_text(text: &str) -> String {
    PUNCTUATION_REGEX.replace_all(text, "").into_owned()
}

/// One subtitle interval in frame coordinates. `start_frame <= end_frame`
/// always holds; the text is the raw (un-normalized) text of the interval's
/// first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    pub start_frame: u32,
    pub end_frame: u32,
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(start_frame: u32, end_frame: u32, text: impl Into<String>) -> Self {
        Self { start_frame, end_frame, text: text.into() }
    }
}

/// Converts the consolidated frame stream into subtitle intervals.
///
/// Two passes are required: the frame-level state machine splits on text
/// changes and long gaps, but cannot see a subtitle split by frames with no
/// surviving record at all; the interval-level merge closes those.
pub struct Segmenter {
    /// `fps × min_duration`, in frames. Used both as the maximum extension
    /// gap and as the minimum interval length; both thresholds must stay in
    /// the same unit (frame counts, not seconds).
    threshold_frames: f64,
}

/// In-flight interval state for the frame-level scan.
struct Active {
    start: u32,
    end: u32,
    text: String,
}

impl Segmenter {
    pub fn new(fps: f64, min_duration: f64) -> Self {
        Self { threshold_frames: fps * min_duration }
    }

    /// Segment the consolidated stream into intervals, in non-decreasing
    /// start order.
    pub fn segment(&self, frames: &ConsolidatedFrames) -> Vec<SubtitleEntry> {
        let intervals = self.scan(frames);
        self.merge_adjacent(intervals)
    }

    /// Frame-level state machine.
    fn scan(&self, frames: &ConsolidatedFrames) -> Vec<SubtitleEntry> {
        let mut entries = Vec::new();
        let mut active: Option<Active> = None;

        for (&index, record) in frames {
            let extends = active.as_ref().is_some_and(|current| {
                normalize_text(&record.text) == normalize_text(&current.text)
                    && (index - current.end) as f64 <= self.threshold_frames
            });

            if extends {
                if let Some(current) = active.as_mut() {
                    current.end = index;
                }
            } else {
                if let Some(closed) = active.take() {
                    self.emit(closed, &mut entries);
                }
                active = Some(Active {
                    start: index,
                    end: index,
                    text: record.text.clone(),
                });
            }
        }

        if let Some(closed) = active.take() {
            self.emit(closed, &mut entries);
        }
        entries
    }

    /// Close an interval, keeping it only when it is strictly longer than
    /// the minimum duration. Single-frame blinks and detector noise fall
    /// below the threshold and are dropped.
    fn emit(&self, closed: Active, entries: &mut Vec<SubtitleEntry>) {
        if (closed.end - closed.start) as f64 > self.threshold_frames {
            entries.push(SubtitleEntry::new(closed.start, closed.end, closed.text));
        } else {
            debug!(
                "Dropping blink interval [{}, {}] {:?}",
                closed.start, closed.end, closed.text
            );
        }
    }

    /// Interval-level merge: join an interval into its predecessor when the
    /// normalized texts match and the gap between them is short. Handles
    /// subtitles split by frames where detection failed entirely.
    fn merge_adjacent(&self, intervals: Vec<SubtitleEntry>) -> Vec<SubtitleEntry> {
        let mut merged: Vec<SubtitleEntry> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            let joins = merged.last().is_some_and(|previous| {
                normalize_text(&interval.text) == normalize_text(&previous.text)
                    && (interval.start_frame - previous.end_frame) as f64
                        <= self.threshold_frames
            });
            if joins {
                if let Some(previous) = merged.last_mut() {
                    previous.end_frame = interval.end_frame;
                }
            } else {
                merged.push(interval);
            }
        }
        merged
    }
}

/// Convert a frame position to milliseconds, truncating (not rounding) at
/// the millisecond boundary.
pub fn frame_to_ms(frame: u32, fps: f64) -> u64 {
    (frame as f64 / fps * 1000.0) as u64
}

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Render subtitle intervals as SRT text: 1-based index line, time range
/// line, text line(s), blank line between blocks.
pub fn render_srt(entries: &[SubtitleEntry], fps: f64) -> String {
    let mut blocks = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        blocks.push(format!(
            "{}\n{} --> {}\n{}\n",
            i + 1,
            format_timestamp(frame_to_ms(entry.start_frame, fps)),
            format_timestamp(frame_to_ms(entry.end_frame, fps)),
            entry.text
        ));
    }
    blocks.join("\n")
}

/// Write rendered SRT to a file, creating parent directories as needed.
pub fn write_srt(entries: &[SubtitleEntry], fps: f64, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
    file.write_all(render_srt(entries, fps).as_bytes())
        .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;
    Ok(())
}

/// Extract the timestamp lines of an SRT document, verbatim and in order.
pub fn extract_timeline(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| TIMESTAMP_REGEX.is_match(line.trim()))
        .map(|line| line.trim().to_string())
        .collect()
}

/// Whether two SRT documents carry the identical timeline: same number of
/// timestamp lines with identical time ranges, in the same order. Used to
/// verify that translation did not disturb the timing.
pub fn timelines_match(original: &str, candidate: &str) -> bool {
    let a = extract_timeline(original);
    let b = extract_timeline(candidate);
    if a.len() != b.len() {
        warn!("Timeline length mismatch: {} vs {} timestamp lines", a.len(), b.len());
        return false;
    }
    a == b
}
