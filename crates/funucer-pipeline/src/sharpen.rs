//! 3x3 convolution sharpening.
//!
//! The kernel is derived from a single intensity factor:
//!
//! ```text
//!  0   -f/10        0
//! -f/10  1 + f/2.5 -f/10
//!  0   -f/10        0
//! ```
//!
//! Weights sum to `1 + f/2.5 - 4f/10 = 1`, so uniform regions are left
//! unchanged and a factor of 0 is the identity.
//!
//! R, G, and B are convolved independently, clamped to `[0, 255]`, and
//! truncated toward zero. Computed pixels are always fully opaque.
//!
//! Under [`BorderPolicy::Blank`] only interior pixels are convolved and
//! the one-pixel frame keeps the destination's initial transparent black.
//! Buffers narrower or shorter than 3 pixels have no interior and are
//! returned as a copy of the source.

use serde::{Deserialize, Serialize};

use crate::pixel::{self, TRANSPARENT};
use crate::types::PixelBuffer;

/// How the sharpen stage treats the one-pixel frame around the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderPolicy {
    /// Leave border pixels at transparent black (`0x00000000`).
    ///
    /// Matches the camera preview's historical output.
    #[default]
    Blank,

    /// Convolve border pixels too, replicating the nearest edge pixel for
    /// neighbors that fall outside the image.
    Replicate,
}

/// The 3x3 sharpen kernel for one intensity factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharpenKernel {
    weights: [[f32; 3]; 3],
}

impl SharpenKernel {
    /// Build the kernel for `factor`.
    #[must_use]
    pub fn new(factor: f32) -> Self {
        let center = 1.0 + factor / 2.5;
        let edge = -factor / 10.0;
        Self {
            weights: [[0.0, edge, 0.0], [edge, center, edge], [0.0, edge, 0.0]],
        }
    }

    /// Row-major kernel weights, `weights[ky + 1][kx + 1]`.
    #[must_use]
    pub const fn weights(&self) -> &[[f32; 3]; 3] {
        &self.weights
    }

    /// Center weight.
    #[must_use]
    pub const fn center(&self) -> f32 {
        self.weights[1][1]
    }

    /// Weight of each of the four direct neighbors.
    #[must_use]
    pub const fn edge(&self) -> f32 {
        self.weights[0][1]
    }

    /// Convolve the neighborhood of `(x, y)`, clamping neighbor
    /// coordinates to the buffer. For interior pixels the clamp never
    /// triggers.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn convolve(&self, src: &PixelBuffer, x: u32, y: u32) -> u32 {
        let max_x = i64::from(src.width()) - 1;
        let max_y = i64::from(src.height()) - 1;
        let pixels = src.pixels();

        let mut r = 0.0_f32;
        let mut g = 0.0_f32;
        let mut b = 0.0_f32;

        for (ky, row) in self.weights.iter().enumerate() {
            let sy = (i64::from(y) + ky as i64 - 1).clamp(0, max_y) as u32;
            for (kx, &weight) in row.iter().enumerate() {
                let sx = (i64::from(x) + kx as i64 - 1).clamp(0, max_x) as u32;
                let [_, pr, pg, pb] = pixel::unpack_argb(pixels[src.index(sx, sy)]);
                r += f32::from(pr) * weight;
                g += f32::from(pg) * weight;
                b += f32::from(pb) * weight;
            }
        }

        pixel::pack_rgb(
            pixel::clamp_truncate(r),
            pixel::clamp_truncate(g),
            pixel::clamp_truncate(b),
        )
    }
}

/// A configured sharpen stage: kernel plus border policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpen {
    kernel: SharpenKernel,
    border: BorderPolicy,
}

impl Sharpen {
    /// Configure a sharpen stage.
    #[must_use]
    pub fn new(factor: f32, border: BorderPolicy) -> Self {
        Self {
            kernel: SharpenKernel::new(factor),
            border,
        }
    }

    /// The kernel this stage convolves with.
    #[must_use]
    pub const fn kernel(&self) -> &SharpenKernel {
        &self.kernel
    }

    /// The border policy this stage applies.
    #[must_use]
    pub const fn border(&self) -> BorderPolicy {
        self.border
    }

    /// Sharpen `src` into a newly allocated buffer.
    #[must_use = "returns the sharpened buffer"]
    pub fn apply(&self, src: &PixelBuffer) -> PixelBuffer {
        let mut out = Vec::with_capacity(src.pixels().len());
        for y in 0..src.height() {
            for x in 0..src.width() {
                out.push(self.pixel_at(src, x, y));
            }
        }
        PixelBuffer::from_parts(src.dimensions(), out)
    }

    /// The value the sharpened output holds at `(x, y)`.
    ///
    /// Shared by the staged and fused pipelines so both see the exact
    /// same neighborhood arithmetic.
    pub(crate) fn pixel_at(&self, src: &PixelBuffer, x: u32, y: u32) -> u32 {
        match self.border {
            BorderPolicy::Replicate => self.kernel.convolve(src, x, y),
            BorderPolicy::Blank => {
                let (w, h) = (src.width(), src.height());
                if w < 3 || h < 3 {
                    src.pixels()[src.index(x, y)]
                } else if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                    TRANSPARENT
                } else {
                    self.kernel.convolve(src, x, y)
                }
            }
        }
    }
}

/// Sharpen `src` with the default [`BorderPolicy::Blank`].
#[must_use = "returns the sharpened buffer"]
pub fn sharpen(src: &PixelBuffer, factor: f32) -> PixelBuffer {
    Sharpen::new(factor, BorderPolicy::Blank).apply(src)
}

/// Sharpen `src` with an explicit border policy.
#[must_use = "returns the sharpened buffer"]
pub fn sharpen_with_border(src: &PixelBuffer, factor: f32, border: BorderPolicy) -> PixelBuffer {
    Sharpen::new(factor, border).apply(src)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pixel::{pack_rgb, unpack_argb};

    /// A gradient with distinct channel values at every pixel.
    #[allow(clippy::cast_possible_truncation)]
    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            pack_rgb((x * 40) as u8, (y * 50) as u8, ((x + y) * 20) as u8)
        })
        .unwrap()
    }

    fn is_border(buf: &PixelBuffer, x: u32, y: u32) -> bool {
        x == 0 || y == 0 || x == buf.width() - 1 || y == buf.height() - 1
    }

    #[test]
    fn kernel_weights_sum_to_one() {
        for factor in [0.0, 1.0, 2.5, 5.0, 10.0] {
            let k = SharpenKernel::new(factor);
            let sum: f32 = k.weights().iter().flatten().sum();
            assert!((sum - 1.0).abs() < 1e-5, "factor {factor}: sum {sum}");
        }
    }

    #[test]
    fn kernel_for_factor_five() {
        let k = SharpenKernel::new(5.0);
        assert!((k.center() - 3.0).abs() < f32::EPSILON);
        assert!((k.edge() + 0.5).abs() < f32::EPSILON);
        assert!(k.weights()[0][0].abs() < f32::EPSILON);
        assert!(k.weights()[2][2].abs() < f32::EPSILON);
    }

    #[test]
    fn factor_zero_keeps_interior() {
        let src = gradient(5, 5);
        let out = sharpen(&src, 0.0);
        for y in 1..4 {
            for x in 1..4 {
                assert_eq!(out.get(x, y), src.get(x, y), "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn border_is_left_transparent() {
        let src = gradient(5, 4);
        let out = sharpen(&src, 3.0);
        for y in 0..out.height() {
            for x in 0..out.width() {
                if is_border(&out, x, y) {
                    assert_eq!(out.get(x, y), Some(TRANSPARENT), "pixel ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn three_by_three_computes_only_center() {
        let src = PixelBuffer::filled(3, 3, pack_rgb(90, 120, 150)).unwrap();
        let out = sharpen(&src, 5.0);
        let computed: Vec<_> = out.pixels().iter().filter(|&&p| p != TRANSPARENT).collect();
        assert_eq!(computed.len(), 1);
        assert_eq!(out.get(1, 1), Some(pack_rgb(90, 120, 150)));
    }

    #[test]
    fn uniform_interior_unchanged() {
        let src = PixelBuffer::filled(4, 4, pack_rgb(128, 128, 128)).unwrap();
        let out = sharpen(&src, 5.0);
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            assert_eq!(out.get(x, y), Some(pack_rgb(128, 128, 128)));
        }
    }

    #[test]
    fn bright_spot_is_amplified_and_neighbors_darkened() {
        let src = PixelBuffer::from_fn(5, 5, |x, y| {
            if (x, y) == (2, 2) {
                pack_rgb(150, 150, 150)
            } else {
                pack_rgb(100, 100, 100)
            }
        })
        .unwrap();
        let out = sharpen(&src, 5.0);

        // center: 3*150 - 0.5*4*100 = 250
        assert_eq!(out.get(2, 2), Some(pack_rgb(250, 250, 250)));
        // neighbor: 3*100 - 0.5*(150 + 3*100) = 75
        assert_eq!(out.get(2, 1), Some(pack_rgb(75, 75, 75)));
        // diagonal neighbor sees the spot only through a zero weight.
        assert_eq!(out.get(1, 1), Some(pack_rgb(100, 100, 100)));
    }

    #[test]
    fn channels_are_clamped() {
        let src = PixelBuffer::from_fn(3, 3, |x, y| {
            if (x, y) == (1, 1) {
                pack_rgb(255, 0, 200)
            } else {
                pack_rgb(0, 255, 200)
            }
        })
        .unwrap();
        let out = sharpen(&src, 10.0);
        // center weight 5, edge weight -1.
        let [a, r, g, b] = unpack_argb(out.get(1, 1).unwrap());
        assert_eq!(a, 0xFF);
        assert_eq!(r, 255);
        assert_eq!(g, 0);
        assert_eq!(b, 200);
    }

    #[test]
    fn fractional_results_truncate() {
        // center weight 1.4, edge weight -0.1: 1.4*101 - 0.4*100 = 101.4
        let src = PixelBuffer::from_fn(3, 3, |x, y| {
            if (x, y) == (1, 1) {
                pack_rgb(101, 101, 101)
            } else {
                pack_rgb(100, 100, 100)
            }
        })
        .unwrap();
        let out = sharpen(&src, 1.0);
        assert_eq!(out.get(1, 1), Some(pack_rgb(101, 101, 101)));
    }

    #[test]
    fn computed_pixels_are_opaque() {
        let src = PixelBuffer::filled(4, 4, 0x2040_6080).unwrap();
        let out = sharpen(&src, 2.0);
        assert_eq!(unpack_argb(out.get(1, 1).unwrap())[0], 0xFF);
    }

    #[test]
    fn tiny_buffer_passes_through() {
        let src = PixelBuffer::from_fn(2, 5, |x, y| pack_rgb(1, 2, 3) + x + y).unwrap();
        assert_eq!(sharpen(&src, 5.0), src);
        let src = PixelBuffer::filled(7, 1, pack_rgb(9, 9, 9)).unwrap();
        assert_eq!(sharpen(&src, 5.0), src);
    }

    #[test]
    fn source_is_not_mutated() {
        let src = gradient(6, 6);
        let before = src.clone();
        let _ = sharpen(&src, 7.0);
        assert_eq!(src, before);
    }

    #[test]
    fn sharpen_is_not_idempotent() {
        let src = gradient(6, 6);
        let once = sharpen(&src, 5.0);
        let twice = sharpen(&once, 5.0);
        assert_ne!(once, twice);
    }

    // ─────── BorderPolicy::Replicate ────────────────────────────

    #[test]
    fn replicate_matches_blank_in_interior() {
        let src = gradient(6, 5);
        let blank = sharpen_with_border(&src, 4.0, BorderPolicy::Blank);
        let replicate = sharpen_with_border(&src, 4.0, BorderPolicy::Replicate);
        for y in 1..4 {
            for x in 1..5 {
                assert_eq!(blank.get(x, y), replicate.get(x, y), "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn replicate_fills_border_of_uniform_image() {
        let src = PixelBuffer::filled(4, 3, pack_rgb(60, 70, 80)).unwrap();
        let out = sharpen_with_border(&src, 5.0, BorderPolicy::Replicate);
        assert!(out.pixels().iter().all(|&p| p == pack_rgb(60, 70, 80)));
    }

    #[test]
    fn replicate_handles_single_pixel() {
        let src = PixelBuffer::filled(1, 1, pack_rgb(10, 20, 30)).unwrap();
        let out = sharpen_with_border(&src, 5.0, BorderPolicy::Replicate);
        assert_eq!(out.get(0, 0), Some(pack_rgb(10, 20, 30)));
    }
}
