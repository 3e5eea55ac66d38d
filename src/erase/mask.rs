/*!
 * Erasure mask geometry and rasterization.
 *
 * A detection box becomes a filled rectangle widened by `mask_expand` pixels
 * on all sides and mirrored to be symmetric about the frame's vertical
 * centerline: the smaller of the two horizontal margins is applied to both
 * sides, so a centered subtitle is fully covered even when the detector only
 * boxed part of it.
 */

use image::{GrayImage, Luma};

use crate::ocr::detector::BoundingBox;

/// A filled mask rectangle in frame pixels, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

/// Compute the mask rectangle for one detection box.
///
/// Returns `None` for degenerate boxes (the detector's corner math can yield
/// `xmin > xmax`); a zero-area mask is the defined outcome, never a panic.
pub fn mask_rect(
    bbox: &BoundingBox,
    frame_width: u32,
    frame_height: u32,
    expand: i32,
) -> Option<MaskRect> {
    if bbox.xmin > bbox.xmax || bbox.ymin > bbox.ymax {
        return None;
    }

    let width = frame_width as i32;
    let height = frame_height as i32;

    // Mirror the smaller horizontal margin to both sides of the centerline.
    let margin = bbox.xmin.min(width - bbox.xmax);

    let x0 = (margin - expand).max(0);
    let x1 = (width - margin + expand).min(width - 1);
    let y0 = (bbox.ymin - expand).max(0);
    let y1 = (bbox.ymax + expand).min(height - 1);

    if x1 < x0 || y1 < y0 {
        return None;
    }

    Some(MaskRect {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    })
}

/// All-black mask (nothing to erase).
pub fn empty_mask(frame_width: u32, frame_height: u32) -> GrayImage {
    GrayImage::new(frame_width, frame_height)
}

/// Rasterize mask rectangles into a binary image: 255 inside, 0 outside.
pub fn rasterize(rects: &[MaskRect], frame_width: u32, frame_height: u32) -> GrayImage {
    let mut mask = GrayImage::new(frame_width, frame_height);
    for rect in rects {
        for y in rect.y0..=rect.y1.min(frame_height.saturating_sub(1)) {
            for x in rect.x0..=rect.x1.min(frame_width.saturating_sub(1)) {
                mask.put_pixel(x, y, Luma([255u8]));
            }
        }
    }
    mask
}
