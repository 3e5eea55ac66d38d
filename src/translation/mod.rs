/*!
 * Subtitle translation services.
 *
 * Wraps a chat completion provider into a whole-file SRT translator that
 * preserves the timeline of the source file.
 */

pub mod core;

pub use core::TranslationService;
