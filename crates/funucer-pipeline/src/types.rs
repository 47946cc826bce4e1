//! Shared types for the funucer filter pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pixel::{self, TRANSPARENT};

/// Re-export `RgbaImage` so downstream crates can convert decoded images
/// without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A width x height grid of packed `0xAARRGGBB` pixels in row-major order.
///
/// Pixel `(x, y)` lives at index `x + y * width`. A `PixelBuffer` can only
/// be constructed with non-zero dimensions and exactly `width * height`
/// pixels, so every filter can treat it as well-formed.
///
/// Filters never mutate a buffer in place: each stage borrows its input
/// and returns a freshly allocated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    /// Wrap a packed ARGB pixel vector.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::ZeroDimension`] if either dimension is zero,
    /// [`FilterError::DimensionOverflow`] if `width * height` does not fit
    /// in `usize`, and [`FilterError::PixelCountMismatch`] if `pixels`
    /// does not hold exactly `width * height` values.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, FilterError> {
        let expected = checked_len(width, height)?;
        if pixels.len() != expected {
            return Err(FilterError::PixelCountMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A buffer with every pixel set to `argb`.
    ///
    /// # Errors
    ///
    /// Same dimension errors as [`PixelBuffer::new`].
    pub fn filled(width: u32, height: u32, argb: u32) -> Result<Self, FilterError> {
        let len = checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![argb; len],
        })
    }

    /// A buffer of transparent black pixels, the initial state of every
    /// filter's destination.
    ///
    /// # Errors
    ///
    /// Same dimension errors as [`PixelBuffer::new`].
    pub fn transparent(width: u32, height: u32) -> Result<Self, FilterError> {
        Self::filled(width, height, TRANSPARENT)
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    ///
    /// # Errors
    ///
    /// Same dimension errors as [`PixelBuffer::new`].
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> u32,
    ) -> Result<Self, FilterError> {
        let len = checked_len(width, height)?;
        let mut pixels = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a buffer from interleaved 8-bit RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::PixelCountMismatch`] if `bytes.len()` is not
    /// `4 * width * height`, plus the dimension errors of
    /// [`PixelBuffer::new`].
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, FilterError> {
        let expected = checked_len(width, height)?;
        if expected.checked_mul(4) != Some(bytes.len()) {
            return Err(FilterError::PixelCountMismatch {
                width,
                height,
                expected,
                actual: bytes.len() / 4,
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| pixel::pack_argb(c[3], c[0], c[1], c[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Convert a decoded [`RgbaImage`].
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::ZeroDimension`] for an empty image.
    pub fn from_rgba_image(image: &RgbaImage) -> Result<Self, FilterError> {
        Self::from_rgba_bytes(image.width(), image.height(), image.as_raw())
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width and height together.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// The packed pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Consume the buffer and return its pixel vector.
    #[must_use]
    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// The pixel at `(x, y)`, or `None` outside the buffer.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    /// Interleaved 8-bit RGBA bytes, the layout image encoders expect.
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&p| {
                let [a, r, g, b] = pixel::unpack_argb(p);
                [r, g, b, a]
            })
            .collect()
    }

    /// Convert to an [`RgbaImage`] for encoding or display.
    #[must_use]
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let [a, r, g, b] = pixel::unpack_argb(self.pixels[self.index(x, y)]);
            image::Rgba([r, g, b, a])
        })
    }

    /// Row-major index of `(x, y)`. Callers guarantee the coordinate is
    /// inside the buffer.
    pub(crate) const fn index(&self, x: u32, y: u32) -> usize {
        x as usize + y as usize * self.width as usize
    }

    /// Construct from parts already known to be consistent.
    pub(crate) fn from_parts(dimensions: Dimensions, pixels: Vec<u32>) -> Self {
        debug_assert_eq!(
            pixels.len() as u64,
            dimensions.pixel_count(),
            "pixel count must match dimensions",
        );
        Self {
            width: dimensions.width,
            height: dimensions.height,
            pixels,
        }
    }
}

/// `width * height` as a `usize`, validating both dimensions.
fn checked_len(width: u32, height: u32) -> Result<usize, FilterError> {
    if width == 0 || height == 0 {
        return Err(FilterError::ZeroDimension { width, height });
    }
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .ok_or(FilterError::DimensionOverflow { width, height })
}

/// Serde-compatible proxy for `PixelBuffer`.
///
/// Deserialization goes through [`PixelBuffer::new`] so a malformed
/// payload cannot produce a buffer whose pixel count disagrees with its
/// dimensions.
#[derive(Serialize, Deserialize)]
struct PixelBufferProxy {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Serialize for PixelBuffer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PixelBufferProxy {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PixelBuffer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PixelBufferProxy::deserialize(deserializer)?;
        Self::new(proxy.width, proxy.height, proxy.pixels).map_err(serde::de::Error::custom)
    }
}

/// Snapshot of the user-controlled filter parameters.
///
/// Held by the UI layer and passed by value into every pipeline call;
/// the pipeline keeps no parameter state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    /// Sharpen intensity. Not clamped; the UI range is
    /// [`SHARPEN_MIN`](Self::SHARPEN_MIN)..=[`SHARPEN_MAX`](Self::SHARPEN_MAX).
    pub sharpen_factor: f32,

    /// Warm/cool shift. Positive values boost red and cut blue; the derived
    /// gains saturate at +/-100.
    pub temperature: f32,

    /// Saturation scale, clamped to `[0, 2]` by the filter. 0 is grayscale,
    /// 1 is the identity.
    pub saturation: f32,
}

impl FilterParameters {
    /// Default sharpen factor (the preview slider's starting value).
    pub const DEFAULT_SHARPEN_FACTOR: f32 = 5.0;
    /// Default temperature (neutral).
    pub const DEFAULT_TEMPERATURE: f32 = 0.0;
    /// Default saturation (identity).
    pub const DEFAULT_SATURATION: f32 = 1.0;

    /// Lower end of the sharpen slider.
    pub const SHARPEN_MIN: f32 = 0.0;
    /// Upper end of the sharpen slider.
    pub const SHARPEN_MAX: f32 = 10.0;
    /// Lower end of the temperature slider.
    pub const TEMPERATURE_MIN: f32 = -100.0;
    /// Upper end of the temperature slider.
    pub const TEMPERATURE_MAX: f32 = 100.0;
    /// Saturation lower clamp.
    pub const SATURATION_MIN: f32 = 0.0;
    /// Saturation upper clamp.
    pub const SATURATION_MAX: f32 = 2.0;

    /// Parameters that leave every pixel unchanged except for the sharpen
    /// stage's border.
    pub const NEUTRAL: Self = Self {
        sharpen_factor: 0.0,
        temperature: 0.0,
        saturation: 1.0,
    };

    /// Create a parameter snapshot.
    #[must_use]
    pub const fn new(sharpen_factor: f32, temperature: f32, saturation: f32) -> Self {
        Self {
            sharpen_factor,
            temperature,
            saturation,
        }
    }

    /// Reject non-finite values.
    ///
    /// Finite out-of-range values are accepted: the filters clamp what they
    /// need to clamp.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidParameter`] naming the first
    /// non-finite parameter.
    pub fn validate(&self) -> Result<(), FilterError> {
        let checks = [
            (Parameter::SharpenFactor, self.sharpen_factor),
            (Parameter::Temperature, self.temperature),
            (Parameter::Saturation, self.saturation),
        ];
        for (parameter, value) in checks {
            if !value.is_finite() {
                return Err(FilterError::InvalidParameter { parameter, value });
            }
        }
        Ok(())
    }
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            sharpen_factor: Self::DEFAULT_SHARPEN_FACTOR,
            temperature: Self::DEFAULT_TEMPERATURE,
            saturation: Self::DEFAULT_SATURATION,
        }
    }
}

/// Identifies one field of [`FilterParameters`] in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parameter {
    /// [`FilterParameters::sharpen_factor`].
    SharpenFactor,
    /// [`FilterParameters::temperature`].
    Temperature,
    /// [`FilterParameters::saturation`].
    Saturation,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SharpenFactor => "sharpen_factor",
            Self::Temperature => "temperature",
            Self::Saturation => "saturation",
        })
    }
}

/// Result of running the pipeline with every intermediate buffer kept.
///
/// Useful for stage-by-stage previews; callers that only need the final
/// frame should use [`crate::process`], which drops intermediates as soon
/// as the next stage has consumed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Stage 1: sharpened buffer.
    pub sharpened: PixelBuffer,
    /// Stage 2: temperature-shifted buffer.
    pub tempered: PixelBuffer,
    /// Stage 3: saturation-adjusted buffer (the pipeline output).
    pub saturated: PixelBuffer,
}

impl StagedResult {
    /// The final output buffer.
    #[must_use]
    pub const fn output(&self) -> &PixelBuffer {
        &self.saturated
    }

    /// Consume the result and keep only the final output buffer.
    #[must_use]
    pub fn into_output(self) -> PixelBuffer {
        self.saturated
    }
}

/// Errors raised at the pipeline boundary.
///
/// The filters themselves are infallible; these errors come from building
/// a [`PixelBuffer`] or validating [`FilterParameters`].
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum FilterError {
    /// Width or height is zero.
    #[error("invalid dimensions {width}x{height}: width and height must be non-zero")]
    ZeroDimension {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The pixel data does not match the stated dimensions.
    #[error("{width}x{height} buffer needs {expected} pixels, got {actual}")]
    PixelCountMismatch {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// `width * height`.
        expected: usize,
        /// Pixels actually supplied.
        actual: usize,
    },

    /// `width * height` does not fit in memory addressing.
    #[error("invalid dimensions {width}x{height}: pixel count overflows")]
    DimensionOverflow {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A filter parameter is NaN or infinite.
    #[error("invalid filter parameter {parameter}: {value} is not finite")]
    InvalidParameter {
        /// Which parameter was rejected.
        parameter: Parameter,
        /// The rejected value.
        value: f32,
    },
}
