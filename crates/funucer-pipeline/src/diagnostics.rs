//! Pipeline diagnostics: per-stage timing and pixel statistics.
//!
//! Intended for parameter experimentation and for judging whether a
//! device keeps up with the preview frame rate. Time is read through the
//! [`Clock`] trait so this crate never touches a platform clock itself;
//! callers supply one (the bench CLI wraps [`std::time::Instant`]).
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{ExecutionMode, FilterPipeline};
use crate::pixel::{self, TRANSPARENT};
use crate::saturation::apply_saturation;
use crate::sharpen::BorderPolicy;
use crate::temperature::apply_temperature;
use crate::types::{FilterParameters, PixelBuffer};

/// Source of monotonic time for stage measurements.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from one pipeline run.
///
/// In fused mode the three stages share a single pass, so only
/// [`fused`](Self::fused) is populated and the per-stage fields are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Parameters the run used.
    pub parameters: FilterParameters,
    /// Border policy of the sharpen stage.
    pub border: BorderPolicy,
    /// Execution mode.
    pub mode: ExecutionMode,
    /// Stage 1: sharpen (staged mode only).
    pub sharpen: Option<StageDiagnostics>,
    /// Stage 2: temperature (staged mode only).
    pub temperature: Option<StageDiagnostics>,
    /// Stage 3: saturation (staged mode only).
    pub saturation: Option<StageDiagnostics>,
    /// All three stages in one pass (fused mode only).
    pub fused: Option<StageDiagnostics>,
    /// Total wall-clock duration (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary of the output frame.
    pub summary: FrameSummary,
}

/// Diagnostics for one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Pixels whose value differs from the stage input.
    pub changed_pixels: u64,
    /// Transparent black pixels in the stage output.
    pub blank_pixels: u64,
}

/// High-level summary of the filtered frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Mean of the output's R, G, and B channels.
    pub mean_rgb: [f64; 3],
    /// Output pixels with alpha below 0xFF.
    pub non_opaque_pixels: u64,
}

/// Run `pipeline` on `src`, timing each stage.
///
/// Produces the same output buffer as [`FilterPipeline::process`].
#[must_use = "returns the filtered buffer and its diagnostics"]
pub fn process_with_diagnostics<C: Clock>(
    src: &PixelBuffer,
    params: FilterParameters,
    pipeline: &FilterPipeline,
    clock: &C,
) -> (PixelBuffer, PipelineDiagnostics) {
    let total_start = clock.now();

    let (output, sharpen, temperature, saturation, fused) = match pipeline.mode {
        ExecutionMode::Staged => {
            let start = clock.now();
            let sharpened = pipeline.sharpen(src, params);
            let sharpen = stage(src, &sharpened, clock.elapsed(&start));

            let start = clock.now();
            let tempered = apply_temperature(&sharpened, params.temperature);
            let temperature = stage(&sharpened, &tempered, clock.elapsed(&start));

            let start = clock.now();
            let saturated = apply_saturation(&tempered, params.saturation);
            let saturation = stage(&tempered, &saturated, clock.elapsed(&start));

            (saturated, Some(sharpen), Some(temperature), Some(saturation), None)
        }
        ExecutionMode::Fused => {
            let start = clock.now();
            let output = pipeline.process(src, params);
            let fused = stage(src, &output, clock.elapsed(&start));
            (output, None, None, None, Some(fused))
        }
    };

    let total_duration = clock.elapsed(&total_start);
    let summary = summarize(&output);

    let diagnostics = PipelineDiagnostics {
        parameters: params,
        border: pipeline.border,
        mode: pipeline.mode,
        sharpen,
        temperature,
        saturation,
        fused,
        total_duration,
        summary,
    };
    (output, diagnostics)
}

fn stage(input: &PixelBuffer, output: &PixelBuffer, duration: Duration) -> StageDiagnostics {
    let changed_pixels = input
        .pixels()
        .iter()
        .zip(output.pixels())
        .filter(|(a, b)| a != b)
        .count() as u64;
    let blank_pixels = output.pixels().iter().filter(|&&p| p == TRANSPARENT).count() as u64;
    StageDiagnostics {
        duration,
        changed_pixels,
        blank_pixels,
    }
}

#[allow(clippy::cast_precision_loss)]
fn summarize(output: &PixelBuffer) -> FrameSummary {
    let mut sums = [0_u64; 3];
    let mut non_opaque_pixels = 0;
    for &p in output.pixels() {
        let [a, r, g, b] = pixel::unpack_argb(p);
        sums[0] += u64::from(r);
        sums[1] += u64::from(g);
        sums[2] += u64::from(b);
        if a != pixel::OPAQUE {
            non_opaque_pixels += 1;
        }
    }
    let pixel_count = output.dimensions().pixel_count();
    let mean_rgb = sums.map(|s| s as f64 / pixel_count as f64);
    FrameSummary {
        width: output.width(),
        height: output.height(),
        pixel_count,
        mean_rgb,
        non_opaque_pixels,
    }
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Filter Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Frame: {}x{} ({} pixels)",
            self.summary.width, self.summary.height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Parameters: sharpen={:.2} temperature={:.1} saturation={:.2}",
            self.parameters.sharpen_factor, self.parameters.temperature, self.parameters.saturation,
        ));
        lines.push(format!("Mode: {:?}  Border: {:?}", self.mode, self.border));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Sharpen", self.sharpen.as_ref()),
            ("Temperature", self.temperature.as_ref()),
            ("Saturation", self.saturation.as_ref()),
            ("Fused", self.fused.as_ref()),
        ];
        for (name, diag) in stages {
            let Some(diag) = diag else { continue };
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "{name:<16} {ms:>8.3}ms {pct:>9.1}%  changed={} blank={}",
                diag.changed_pixels, diag.blank_pixels,
            ));
        }

        lines.push(String::new());
        let [r, g, b] = self.summary.mean_rgb;
        lines.push(format!(
            "Mean RGB: ({r:.1}, {g:.1}, {b:.1})  |  Non-opaque pixels: {}",
            self.summary.non_opaque_pixels,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::pixel::pack_rgb;

    /// Deterministic clock that advances one millisecond per reading.
    struct StepClock {
        ticks: Cell<u64>,
    }

    impl StepClock {
        const fn new() -> Self {
            Self {
                ticks: Cell::new(0),
            }
        }
    }

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn gray(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::filled(width, height, pack_rgb(128, 128, 128)).unwrap()
    }

    #[test]
    fn staged_diagnostics_match_process_output() {
        let src = gray(6, 6);
        let params = FilterParameters::new(5.0, 30.0, 0.5);
        let pipeline = FilterPipeline::default();
        let (out, diag) = process_with_diagnostics(&src, params, &pipeline, &StepClock::new());
        assert_eq!(out, pipeline.process(&src, params));
        assert!(diag.sharpen.is_some());
        assert!(diag.temperature.is_some());
        assert!(diag.saturation.is_some());
        assert!(diag.fused.is_none());
    }

    #[test]
    fn fused_diagnostics_have_single_stage() {
        let src = gray(5, 5);
        let pipeline = FilterPipeline::default().with_mode(ExecutionMode::Fused);
        let (_, diag) = process_with_diagnostics(
            &src,
            FilterParameters::default(),
            &pipeline,
            &StepClock::new(),
        );
        assert!(diag.fused.is_some());
        assert!(diag.sharpen.is_none());
    }

    #[test]
    fn sharpen_stage_counts_blank_border() {
        let src = gray(4, 4);
        let (_, diag) = process_with_diagnostics(
            &src,
            FilterParameters::default(),
            &FilterPipeline::default(),
            &StepClock::new(),
        );
        let sharpen = diag.sharpen.unwrap();
        // 16 pixels, 4 interior: 12 border pixels become blank.
        assert_eq!(sharpen.blank_pixels, 12);
        assert_eq!(sharpen.changed_pixels, 12);
        assert_eq!(diag.summary.non_opaque_pixels, 12);
    }

    #[test]
    fn durations_come_from_clock() {
        let (_, diag) = process_with_diagnostics(
            &gray(3, 3),
            FilterParameters::default(),
            &FilterPipeline::default(),
            &StepClock::new(),
        );
        assert_eq!(diag.sharpen.unwrap().duration, Duration::from_millis(1));
        assert!(diag.total_duration >= Duration::from_millis(3));
    }

    #[test]
    fn summary_means() {
        let src = PixelBuffer::filled(2, 2, pack_rgb(10, 20, 30)).unwrap();
        let summary = summarize(&src);
        assert_eq!(summary.pixel_count, 4);
        assert!((summary.mean_rgb[0] - 10.0).abs() < 1e-9);
        assert!((summary.mean_rgb[2] - 30.0).abs() < 1e-9);
        assert_eq!(summary.non_opaque_pixels, 0);
    }

    #[test]
    fn report_produces_nonempty_string() {
        let (_, diag) = process_with_diagnostics(
            &gray(5, 5),
            FilterParameters::default(),
            &FilterPipeline::default(),
            &StepClock::new(),
        );
        let report = diag.report();
        assert!(report.contains("Sharpen"));
        assert!(report.contains("Saturation"));
        assert!(!report.contains("Fused "));
    }

    #[test]
    fn diagnostics_serialize_to_json() {
        let (_, diag) = process_with_diagnostics(
            &gray(3, 3),
            FilterParameters::default(),
            &FilterPipeline::default(),
            &StepClock::new(),
        );
        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.pixel_count, 9);
        assert_eq!(back.sharpen.unwrap().duration, Duration::from_millis(1));
    }
}
