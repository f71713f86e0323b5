//! Normalized-box to pixel-rectangle conversion.
//!
//! Pure and bit-reproducible: the same `(box, width, height)` always yields
//! the same `PixelBox`. Rounding is half-away-from-zero (`f64::round`).

use pricelens_core::{NormalizedBox, PixelBox};

/// Convert a YOLO-convention normalized box into an integer pixel rectangle
/// clamped to the image bounds.
///
/// The position is clamped into `[0, W-1] × [0, H-1]` first; the extent is
/// then trimmed downward so the rectangle never crosses the right or bottom
/// edge. The box is never re-centered. Degenerate results (`w == 0` or
/// `h == 0`) are returned as-is; the crop extractor handles them.
pub fn to_pixel_box(bbox: NormalizedBox, width: u32, height: u32) -> PixelBox {
    let w_f = f64::from(width);
    let h_f = f64::from(height);

    let cx_px = bbox.cx * w_f;
    let cy_px = bbox.cy * h_f;
    let w_px = bbox.w * w_f;
    let h_px = bbox.h * h_f;

    let x = (cx_px - w_px / 2.0).round() as i64;
    let y = (cy_px - h_px / 2.0).round() as i64;
    let mut w = w_px.round() as i64;
    let mut h = h_px.round() as i64;

    let x = x.clamp(0, i64::from(width) - 1);
    let y = y.clamp(0, i64::from(height) - 1);

    if x + w > i64::from(width) {
        w = i64::from(width) - x;
    }
    if y + h > i64::from(height) {
        h = i64::from(height) - y;
    }

    PixelBox {
        x: x as u32,
        y: y as u32,
        w: w.max(0) as u32,
        h: h.max(0) as u32,
    }
}
