//! 4x5 color matrices for per-pixel color transforms.
//!
//! A color matrix maps `[R, G, B, A, 1]` to `[R', G', B', A']`:
//!
//! ```text
//! | m0  m1  m2  m3  m4  |   | R |
//! | m5  m6  m7  m8  m9  |   | G |
//! | m10 m11 m12 m13 m14 | x | B |
//! | m15 m16 m17 m18 m19 |   | A |
//!                           | 1 |
//! ```
//!
//! Each output channel is clamped to `[0, 255]` and rounded to the nearest
//! integer. The temperature and saturation filters are both expressed
//! this way, which keeps their arithmetic identical whether they run as
//! separate stages or fused into a single pass.

use crate::pixel;

/// Luma weight of the red channel.
pub const LUMA_R: f32 = 0.213;
/// Luma weight of the green channel.
pub const LUMA_G: f32 = 0.715;
/// Luma weight of the blue channel.
pub const LUMA_B: f32 = 0.072;

/// A row-major 4x5 color matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix([f32; 20]);

impl ColorMatrix {
    /// The identity transform.
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0, //
    ]);

    /// Wrap raw row-major coefficients.
    #[must_use]
    pub const fn new(coefficients: [f32; 20]) -> Self {
        Self(coefficients)
    }

    /// Warm/cool shift.
    ///
    /// `red_gain = clamp(temperature / 100, -1, 1)` scales red by
    /// `1 + red_gain`; blue gets the opposite gain. Green and alpha pass
    /// through.
    #[must_use]
    pub fn temperature(temperature: f32) -> Self {
        let red_gain = (temperature / 100.0).clamp(-1.0, 1.0);
        let blue_gain = (-temperature / 100.0).clamp(-1.0, 1.0);
        Self([
            1.0 + red_gain, 0.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0 + blue_gain, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0, //
        ])
    }

    /// Luminance-preserving saturation scale.
    ///
    /// `saturation` is clamped to `[0, 2]`. Each color channel becomes
    /// `L + (C - L) * saturation` with `L = 0.213 R + 0.715 G + 0.072 B`.
    #[must_use]
    pub fn saturation(saturation: f32) -> Self {
        let s = saturation.clamp(0.0, 2.0);
        let inv = 1.0 - s;
        let r = LUMA_R * inv;
        let g = LUMA_G * inv;
        let b = LUMA_B * inv;
        Self([
            r + s, g, b, 0.0, 0.0, //
            r, g + s, b, 0.0, 0.0, //
            r, g, b + s, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0, //
        ])
    }

    /// The raw row-major coefficients.
    #[must_use]
    pub const fn coefficients(&self) -> &[f32; 20] {
        &self.0
    }

    /// Transform one packed ARGB pixel.
    #[must_use]
    pub fn apply(&self, argb: u32) -> u32 {
        let [a, r, g, b] = pixel::unpack_argb(argb);
        let input = [f32::from(r), f32::from(g), f32::from(b), f32::from(a)];
        let m = &self.0;
        let row = |i: usize| {
            let base = i * 5;
            let v = m[base] * input[0]
                + m[base + 1] * input[1]
                + m[base + 2] * input[2]
                + m[base + 3] * input[3]
                + m[base + 4];
            pixel::clamp_round(v)
        };
        pixel::pack_argb(row(3), row(0), row(1), row(2))
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::{pack_argb, pack_rgb, unpack_argb};

    #[test]
    fn identity_leaves_pixels_alone() {
        for p in [0x0000_0000, 0xFF12_3456, 0x80FF_0080, 0xFFFF_FFFF] {
            assert_eq!(ColorMatrix::IDENTITY.apply(p), p);
        }
    }

    #[test]
    fn temperature_zero_is_identity() {
        let m = ColorMatrix::temperature(0.0);
        assert_eq!(m.apply(pack_rgb(100, 150, 200)), pack_rgb(100, 150, 200));
    }

    #[test]
    fn temperature_gain_saturates_at_one() {
        assert_eq!(ColorMatrix::temperature(100.0), ColorMatrix::temperature(250.0));
        assert_eq!(
            ColorMatrix::temperature(-100.0),
            ColorMatrix::temperature(-1000.0)
        );
    }

    #[test]
    fn saturation_one_is_identity() {
        let m = ColorMatrix::saturation(1.0);
        assert_eq!(m.apply(pack_rgb(200, 100, 50)), pack_rgb(200, 100, 50));
    }

    #[test]
    fn saturation_clamps_to_range() {
        assert_eq!(ColorMatrix::saturation(-1.0), ColorMatrix::saturation(0.0));
        assert_eq!(ColorMatrix::saturation(5.0), ColorMatrix::saturation(2.0));
    }

    #[test]
    fn alpha_row_passes_alpha_through() {
        let m = ColorMatrix::saturation(0.3);
        let [a, ..] = unpack_argb(m.apply(pack_argb(0x40, 10, 20, 30)));
        assert_eq!(a, 0x40);
    }

    #[test]
    fn custom_offset_is_added_and_clamped() {
        let mut coefficients = *ColorMatrix::IDENTITY.coefficients();
        coefficients[4] = 300.0;
        let m = ColorMatrix::new(coefficients);
        let [_, r, g, _] = unpack_argb(m.apply(pack_rgb(0, 10, 0)));
        assert_eq!(r, 255);
        assert_eq!(g, 10);
    }
}
