//! funucer-pipeline: per-frame camera filter pipeline (sans-IO).
//!
//! Every preview frame and every captured photo goes through:
//! sharpen -> temperature -> saturation.
//!
//! This crate has **no I/O dependencies** and keeps no state between
//! calls: it operates on in-memory [`PixelBuffer`]s and a
//! [`FilterParameters`] snapshot passed by value. Frame delivery,
//! backpressure, and persistence live with the caller (see
//! `funucer-preview` for a keep-latest frame driver).

pub mod color_matrix;
pub mod diagnostics;
pub mod pipeline;
pub mod pixel;
pub mod saturation;
pub mod sharpen;
pub mod temperature;
pub mod types;

pub use color_matrix::ColorMatrix;
pub use pipeline::{ExecutionMode, FilterPipeline};
pub use saturation::apply_saturation;
pub use sharpen::{BorderPolicy, SharpenKernel, sharpen, sharpen_with_border};
pub use temperature::apply_temperature;
pub use types::{
    Dimensions, FilterError, FilterParameters, Parameter, PixelBuffer, RgbaImage, StagedResult,
};

/// Run the full filter pipeline with the default configuration.
///
/// Equivalent to
/// `apply_saturation(apply_temperature(sharpen(src, f), t), s)` with
/// [`BorderPolicy::Blank`] and one buffer per stage.
///
/// # Pipeline steps
///
/// 1. 3x3 sharpen with `params.sharpen_factor` (interior pixels only)
/// 2. Temperature shift with `params.temperature`
/// 3. Saturation scale with `params.saturation`
#[must_use = "returns the filtered buffer"]
pub fn process(src: &PixelBuffer, params: FilterParameters) -> PixelBuffer {
    FilterPipeline::default().process(src, params)
}

/// Run the full filter pipeline and keep every intermediate buffer.
#[must_use = "returns the staged result"]
pub fn process_staged(src: &PixelBuffer, params: FilterParameters) -> StagedResult {
    FilterPipeline::default().process_staged(src, params)
}
