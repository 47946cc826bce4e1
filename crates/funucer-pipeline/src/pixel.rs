//! Packed ARGB pixel helpers.
//!
//! Every pixel in a [`PixelBuffer`](crate::PixelBuffer) is a single `u32`
//! laid out as `0xAARRGGBB`, matching the packed layout camera frames and
//! platform bitmaps use.

/// Fully opaque alpha value.
pub const OPAQUE: u8 = 0xFF;

/// Transparent black: the value a freshly allocated buffer starts with.
pub const TRANSPARENT: u32 = 0x0000_0000;

/// Pack four 8-bit channels into a `0xAARRGGBB` value.
#[must_use]
pub const fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Pack an opaque pixel from its color channels.
#[must_use]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    pack_argb(OPAQUE, r, g, b)
}

/// Split a packed pixel into `[a, r, g, b]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn unpack_argb(pixel: u32) -> [u8; 4] {
    [
        (pixel >> 24) as u8,
        (pixel >> 16) as u8,
        (pixel >> 8) as u8,
        pixel as u8,
    ]
}

/// Alpha channel of a packed pixel.
#[must_use]
pub const fn alpha(pixel: u32) -> u8 {
    unpack_argb(pixel)[0]
}

/// Clamp a channel value to `[0, 255]` and truncate toward zero.
///
/// NaN maps to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_truncate(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Clamp a channel value to `[0, 255]` and round to the nearest integer.
///
/// NaN maps to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_round(value: f32) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}
