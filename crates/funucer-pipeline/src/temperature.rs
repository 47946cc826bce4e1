//! Warm/cool color temperature shift.
//!
//! Positive temperatures boost red and cut blue by the same gain; negative
//! temperatures do the opposite. The gain is `temperature / 100`,
//! saturating at +/-1, so +100 doubles red and zeroes blue. Green and alpha
//! are untouched.
//!
//! Unlike the sharpen stage this is a full-image transform: every pixel,
//! border included, goes through [`ColorMatrix::temperature`].

use crate::color_matrix::ColorMatrix;
use crate::types::PixelBuffer;

/// Apply a temperature shift to every pixel of `src`.
#[must_use = "returns the temperature-shifted buffer"]
pub fn apply_temperature(src: &PixelBuffer, temperature: f32) -> PixelBuffer {
    apply_matrix(src, &ColorMatrix::temperature(temperature))
}

/// Run `matrix` over every pixel into a new buffer.
pub(crate) fn apply_matrix(src: &PixelBuffer, matrix: &ColorMatrix) -> PixelBuffer {
    let pixels = src.pixels().iter().map(|&p| matrix.apply(p)).collect();
    PixelBuffer::from_parts(src.dimensions(), pixels)
}
