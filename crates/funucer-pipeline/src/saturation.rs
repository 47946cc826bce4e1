//! Luminance-preserving saturation.
//!
//! Each color channel is pulled toward (or pushed away from) the pixel's
//! luma `L = 0.213 R + 0.715 G + 0.072 B`:
//! `C' = L + (C - L) * saturation`, with `saturation` clamped to `[0, 2]`.
//! 0 yields grayscale, 1 the identity, 2 doubled saturation.

use crate::color_matrix::ColorMatrix;
use crate::temperature::apply_matrix;
use crate::types::PixelBuffer;

/// Apply a saturation scale to every pixel of `src`.
#[must_use = "returns the saturation-adjusted buffer"]
pub fn apply_saturation(src: &PixelBuffer, saturation: f32) -> PixelBuffer {
    apply_matrix(src, &ColorMatrix::saturation(saturation))
}
