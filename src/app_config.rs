use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), the language burned into the video
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Detection geometry config
    #[serde(default)]
    pub video: VideoConfig,

    /// OCR detector config
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Inpainting config
    #[serde(default)]
    pub erase: EraseConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Geometry thresholds for grouping OCR detections, expressed as
/// fractions of the frame dimensions where noted
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VideoConfig {
    /// Horizontal adjacency threshold as a fraction of frame width
    #[serde(default = "default_width_delta")]
    pub width_delta: f64,

    /// Vertical band half-height as a fraction of frame height
    #[serde(default = "default_height_delta")]
    pub height_delta: f64,

    /// Pixel tolerance when clustering word heights and positions
    #[serde(default = "default_groups_tolerance")]
    pub groups_tolerance: f64,

    /// Minimum subtitle duration in seconds
    #[serde(default = "default_min_duration")]
    pub min_duration: f64,
}

/// OCR detector configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetectorConfig {
    /// External detector command, given the frames directory and an
    /// output path for the detection sidecar
    #[serde(default = "default_detector_command")]
    pub command: String,
}

/// Inpainting configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EraseConfig {
    /// Maximum number of detected frames in one batch
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,

    /// Minimum batch size; shorter batches are extended with clean frames
    #[serde(default = "default_min_frame_length")]
    pub min_frame_length: usize,

    /// Extra pixels added around each mask rectangle
    #[serde(default = "default_mask_expand")]
    pub mask_expand: i32,

    /// Temporal stride between reference neighbors during inpainting
    #[serde(default = "default_neighbor_stride")]
    pub neighbor_stride: u32,

    /// External inpainting command, given a batch manifest path
    #[serde(default = "default_engine_command")]
    pub engine_command: String,

    /// Max concurrent frame writes when saving repaired frames
    #[serde(default = "default_write_concurrency")]
    pub write_concurrency: usize,
}

/// Translation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL (OpenAI-compatible, including the /v1 prefix)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Number of attempts before giving up on translation
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff between attempts, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "zh".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_width_delta() -> f64 {
    0.25
}

fn default_height_delta() -> f64 {
    0.05
}

fn default_groups_tolerance() -> f64 {
    20.0
}

fn default_min_duration() -> f64 {
    0.2
}

fn default_detector_command() -> String {
    "suberase-ocr".to_string()
}

fn default_max_frame_length() -> usize {
    100
}

fn default_min_frame_length() -> usize {
    10
}

fn default_mask_expand() -> i32 {
    20
}

fn default_neighbor_stride() -> u32 {
    5
}

fn default_engine_command() -> String {
    "suberase-inpaint".to_string()
}

fn default_write_concurrency() -> usize {
    4
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width_delta: default_width_delta(),
            height_delta: default_height_delta(),
            groups_tolerance: default_groups_tolerance(),
            min_duration: default_min_duration(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command: default_detector_command(),
        }
    }
}

impl Default for EraseConfig {
    fn default() -> Self {
        Self {
            max_frame_length: default_max_frame_length(),
            min_frame_length: default_min_frame_length(),
            mask_expand: default_mask_expand(),
            neighbor_stride: default_neighbor_stride(),
            engine_command: default_engine_command(),
            write_concurrency: default_write_concurrency(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            video: VideoConfig::default(),
            detector: DetectorConfig::default(),
            erase: EraseConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read config file: {}", e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| anyhow!("Failed to write config file: {}", e))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if !(0.0..=1.0).contains(&self.video.width_delta) {
            return Err(anyhow!("video.width_delta must be between 0 and 1"));
        }
        if !(0.0..=1.0).contains(&self.video.height_delta) {
            return Err(anyhow!("video.height_delta must be between 0 and 1"));
        }
        if self.video.min_duration <= 0.0 {
            return Err(anyhow!("video.min_duration must be positive"));
        }

        if self.erase.max_frame_length == 0 {
            return Err(anyhow!("erase.max_frame_length must be at least 1"));
        }
        if self.erase.min_frame_length > self.erase.max_frame_length {
            return Err(anyhow!(
                "erase.min_frame_length cannot exceed erase.max_frame_length"
            ));
        }
        if self.erase.mask_expand < 0 {
            return Err(anyhow!("erase.mask_expand cannot be negative"));
        }
        if self.detector.command.trim().is_empty() {
            return Err(anyhow!("detector.command cannot be empty"));
        }
        if self.erase.engine_command.trim().is_empty() {
            return Err(anyhow!("erase.engine_command cannot be empty"));
        }

        if self.translation.api_key.is_empty() {
            return Err(anyhow!("Translation API key is required"));
        }

        Ok(())
    }
}
