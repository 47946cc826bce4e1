//! Filter pipeline: sharpen -> temperature -> saturation.
//!
//! The order is fixed. Sharpening runs on the raw frame so its
//! neighborhood math never sees color-graded values, and temperature runs
//! before saturation so saturation acts on the shifted hues.
//!
//! A [`FilterPipeline`] carries only configuration (border policy and
//! execution mode). Filter parameters arrive with every call, so one
//! pipeline can be shared freely between preview and capture threads.
//!
//! # Execution modes
//!
//! [`ExecutionMode::Staged`] materializes one buffer per stage.
//! [`ExecutionMode::Fused`] walks the source once and runs all three
//! stages per pixel into a single output allocation. Both modes perform
//! the same arithmetic in the same order and produce byte-identical
//! output.

use serde::{Deserialize, Serialize};

use crate::color_matrix::ColorMatrix;
use crate::saturation::apply_saturation;
use crate::sharpen::{BorderPolicy, Sharpen};
use crate::temperature::apply_temperature;
use crate::types::{FilterParameters, PixelBuffer, StagedResult};

/// How the pipeline lays out its work in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// One freshly allocated buffer per stage.
    #[default]
    Staged,
    /// A single pass and a single allocation for all three stages.
    Fused,
}

/// Configured sharpen -> temperature -> saturation pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPipeline {
    /// Border handling for the sharpen stage.
    pub border: BorderPolicy,
    /// Staged or fused execution.
    pub mode: ExecutionMode,
}

impl FilterPipeline {
    /// A pipeline with the given border policy and execution mode.
    #[must_use]
    pub const fn new(border: BorderPolicy, mode: ExecutionMode) -> Self {
        Self { border, mode }
    }

    /// Same pipeline with a different border policy.
    #[must_use]
    pub const fn with_border(self, border: BorderPolicy) -> Self {
        Self { border, ..self }
    }

    /// Same pipeline with a different execution mode.
    #[must_use]
    pub const fn with_mode(self, mode: ExecutionMode) -> Self {
        Self { mode, ..self }
    }

    /// Filter one frame.
    ///
    /// `src` is only read; the returned buffer is newly allocated and has
    /// the same dimensions.
    #[must_use = "returns the filtered buffer"]
    pub fn process(&self, src: &PixelBuffer, params: FilterParameters) -> PixelBuffer {
        tracing::trace!(
            dimensions = %src.dimensions(),
            sharpen_factor = params.sharpen_factor,
            temperature = params.temperature,
            saturation = params.saturation,
            mode = ?self.mode,
            border = ?self.border,
            "filtering frame",
        );
        match self.mode {
            ExecutionMode::Staged => self.process_staged(src, params).into_output(),
            ExecutionMode::Fused => self.process_fused(src, params),
        }
    }

    /// Filter one frame and keep every intermediate buffer.
    ///
    /// Always runs stage by stage, regardless of [`mode`](Self::mode).
    #[must_use = "returns the staged result"]
    pub fn process_staged(&self, src: &PixelBuffer, params: FilterParameters) -> StagedResult {
        let sharpened = self.sharpen(src, params);
        let tempered = apply_temperature(&sharpened, params.temperature);
        let saturated = apply_saturation(&tempered, params.saturation);
        StagedResult {
            sharpened,
            tempered,
            saturated,
        }
    }

    /// The sharpen stage on its own, using this pipeline's border policy.
    #[must_use = "returns the sharpened buffer"]
    pub fn sharpen(&self, src: &PixelBuffer, params: FilterParameters) -> PixelBuffer {
        Sharpen::new(params.sharpen_factor, self.border).apply(src)
    }

    fn process_fused(&self, src: &PixelBuffer, params: FilterParameters) -> PixelBuffer {
        let sharpen = Sharpen::new(params.sharpen_factor, self.border);
        let temperature = ColorMatrix::temperature(params.temperature);
        let saturation = ColorMatrix::saturation(params.saturation);

        let mut out = Vec::with_capacity(src.pixels().len());
        for y in 0..src.height() {
            for x in 0..src.width() {
                let sharpened = sharpen.pixel_at(src, x, y);
                out.push(saturation.apply(temperature.apply(sharpened)));
            }
        }
        PixelBuffer::from_parts(src.dimensions(), out)
    }
}
