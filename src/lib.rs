/*!
 * # SubErase - erase, translate and re-embed burned-in subtitles
 *
 * A Rust library for removing hardcoded subtitles from video files,
 * translating them, and burning the translation back in.
 *
 * ## Features
 *
 * - Frame extraction and re-composition via ffmpeg
 * - OCR text detection over extracted frames
 * - Temporal consolidation of noisy per-frame detections
 * - Subtitle interval segmentation and SRT rendering
 * - Batched mask-based video inpainting
 * - Whole-file subtitle translation with timeline verification
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `media_utils`: ffmpeg/ffprobe plumbing and frame path conventions
 * - `ocr`: Text detection boundary and consolidation:
 *   - `ocr::detector`: External detector boundary and sidecar format
 *   - `ocr::band`: Dominant subtitle band estimation
 *   - `ocr::consolidator`: Per-frame merge and gap filling
 * - `subtitle_processor`: Interval segmentation and SRT handling
 * - `erase`: Mask construction, batch scheduling and inpainting:
 *   - `erase::mask`: Mask geometry and rasterization
 *   - `erase::scheduler`: Batch planning and materialization
 *   - `erase::engine`: External inpainting engine boundary
 *   - `erase::writer`: Concurrent repaired-frame persistence
 * - `translation`: Whole-file SRT translation with retry
 * - `providers`: LLM provider clients
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod erase;
pub mod errors;
pub mod language_utils;
pub mod media_utils;
pub mod ocr;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, DetectorError, EngineError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use ocr::{Consolidator, DetectionMap, SubtitleBand};
pub use subtitle_processor::{Segmenter, SubtitleEntry};
pub use translation::TranslationService;
