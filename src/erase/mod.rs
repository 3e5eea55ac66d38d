/*!
 * Subtitle erasure: mask construction, batch scheduling and the inpainting
 * engine boundary.
 *
 * - `mask`: per-box mask geometry and rasterization
 * - `scheduler`: groups detected frames into bounded, temporally-contiguous
 *   batches the inpainting engine can consume
 * - `engine`: the external inpainting engine boundary
 * - `writer`: concurrent persistence of repaired frames
 */

pub mod engine;
pub mod mask;
pub mod scheduler;
pub mod writer;

pub use engine::{CommandEngine, InpaintingEngine, RepairedFrame};
pub use mask::MaskRect;
pub use scheduler::{BatchPlan, BatchScheduler, MaskBatch, PlanFrame};
