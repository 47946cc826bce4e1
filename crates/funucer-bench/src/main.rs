//! funucer-bench: CLI tool for filter parameter experimentation and diagnostics.
//!
//! Decodes an image file, runs the filter pipeline on it with configurable
//! parameters, and prints per-stage diagnostics. Useful for:
//!
//! - Previewing how sharpen, temperature, and saturation values look on a
//!   real photo before wiring them to sliders
//! - Comparing staged and fused execution timings
//! - Comparing the blank and replicated sharpen borders
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin funucer-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use funucer_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use funucer_pipeline::{
    BorderPolicy, ExecutionMode, FilterParameters, FilterPipeline, PixelBuffer,
};
use image::ImageEncoder;

/// JPEG quality used when saving filtered photos.
const JPEG_QUALITY: u8 = 90;

/// Filter parameter experimentation and diagnostics for funucer.
///
/// Runs the filter pipeline on a given image with configurable parameters
/// and prints per-stage timing and pixel diagnostics.
#[derive(Parser)]
#[command(name = "funucer-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Sharpen intensity.
    #[arg(long, allow_negative_numbers = true, default_value_t = FilterParameters::DEFAULT_SHARPEN_FACTOR)]
    sharpen: f32,

    /// Temperature shift (-100 cool to 100 warm).
    #[arg(long, allow_negative_numbers = true, default_value_t = FilterParameters::DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Saturation scale (0 grayscale, 1 unchanged, 2 double).
    #[arg(long, allow_negative_numbers = true, default_value_t = FilterParameters::DEFAULT_SATURATION)]
    saturation: f32,

    /// Sharpen border handling.
    #[arg(long, value_enum, default_value_t = Border::Blank)]
    border: Border,

    /// Run all stages in a single pass.
    #[arg(long)]
    fused: bool,

    /// Write the filtered image to this path (JPEG quality 90 for
    /// .jpg/.jpeg, otherwise format chosen by extension).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full filter parameters as a JSON string.
    ///
    /// When provided, --sharpen, --temperature, and --saturation are
    /// ignored. Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Sharpen border policy selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Border {
    /// Leave the one-pixel frame transparent.
    Blank,
    /// Replicate edge pixels for out-of-image neighbors.
    Replicate,
}

impl From<Border> for BorderPolicy {
    fn from(border: Border) -> Self {
        match border {
            Border::Blank => Self::Blank,
            Border::Replicate => Self::Replicate,
        }
    }
}

/// Build [`FilterParameters`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn params_from_cli(cli: &Cli) -> Result<FilterParameters, String> {
    let params = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        FilterParameters::new(cli.sharpen, cli.temperature, cli.saturation)
    };
    params.validate().map_err(|e| format!("Error: {e}"))?;
    Ok(params)
}

/// Build the [`FilterPipeline`] configuration from CLI arguments.
fn pipeline_from_cli(cli: &Cli) -> FilterPipeline {
    let mode = if cli.fused {
        ExecutionMode::Fused
    } else {
        ExecutionMode::Staged
    };
    FilterPipeline::new(cli.border.into(), mode)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let params = match params_from_cli(&cli) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let pipeline = pipeline_from_cli(&cli);

    let src = match load_frame(&cli.image_path) {
        Ok(frame) => frame,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({})",
        cli.image_path.display(),
        src.dimensions()
    );
    eprintln!("Parameters: {params:#?}");
    eprintln!("Pipeline: {pipeline:?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (output, diagnostics) = funucer_pipeline::diagnostics::process_with_diagnostics(
            &src, params, &pipeline, &StdClock,
        );
        tracing::debug!(run, total = ?diagnostics.total_duration, "Run finished");

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        // Write the filtered image on the first run only.
        if run == 0
            && let Some(ref output_path) = cli.output
        {
            match save_frame(&output, output_path) {
                Ok(()) => eprintln!("Filtered image written to {}", output_path.display()),
                Err(msg) => {
                    eprintln!("{msg}");
                    return ExitCode::FAILURE;
                }
            }
        }

        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Read and decode an image file into a [`PixelBuffer`].
fn load_frame(path: &Path) -> Result<PixelBuffer, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| format!("Error decoding {}: {e}", path.display()))?;
    PixelBuffer::from_rgba_image(&decoded.to_rgba8())
        .map_err(|e| format!("Error converting {}: {e}", path.display()))
}

/// Whether `path` should be written as JPEG.
fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

/// Encode a filtered frame to `path`.
fn save_frame(frame: &PixelBuffer, path: &Path) -> Result<(), String> {
    let rgba = frame.to_rgba_image();
    let err = |e: &dyn std::fmt::Display| format!("Error writing {}: {e}", path.display());

    if is_jpeg(path) {
        // JPEG has no alpha channel.
        let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
        let file = File::create(path).map_err(|e| err(&e))?;
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
        encoder
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| err(&e))
    } else {
        rgba.save(path).map_err(|e| err(&e))
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Option<Duration>;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<16} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(32));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Sharpen", |d| d.sharpen.as_ref().map(|s| s.duration)),
        ("Temperature", |d| d.temperature.as_ref().map(|s| s.duration)),
        ("Saturation", |d| d.saturation.as_ref().map(|s| s.duration)),
        ("Fused", |d| d.fused.as_ref().map(|s| s.duration)),
    ];

    for (name, extractor) in stage_extractors {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(extractor)
            .map(|dur| dur.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<16} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("funucer-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_filter_parameters() {
        let cli = parse(&["photo.png"]);
        assert_eq!(params_from_cli(&cli).unwrap(), FilterParameters::default());
        assert_eq!(pipeline_from_cli(&cli), FilterPipeline::default());
    }

    #[test]
    fn individual_flags_build_parameters() {
        let cli = parse(&[
            "photo.png",
            "--sharpen",
            "2.5",
            "--temperature",
            "-40",
            "--saturation",
            "0.5",
            "--border",
            "replicate",
            "--fused",
        ]);
        assert_eq!(
            params_from_cli(&cli).unwrap(),
            FilterParameters::new(2.5, -40.0, 0.5)
        );
        assert_eq!(
            pipeline_from_cli(&cli),
            FilterPipeline::new(BorderPolicy::Replicate, ExecutionMode::Fused)
        );
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "photo.png",
            "--temperature",
            "10",
            "--config-json",
            r#"{"temperature": 70.0}"#,
        ]);
        let params = params_from_cli(&cli).unwrap();
        assert!((params.temperature - 70.0).abs() < f32::EPSILON);
        assert!((params.saturation - FilterParameters::DEFAULT_SATURATION).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_config_json_is_reported() {
        let cli = parse(&["photo.png", "--config-json", "{not json"]);
        assert!(params_from_cli(&cli).unwrap_err().contains("--config-json"));
    }

    #[test]
    fn zero_runs_rejected() {
        let result = Cli::try_parse_from(["funucer-bench", "photo.png", "--runs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn jpeg_detection_by_extension() {
        assert!(is_jpeg(Path::new("out.jpg")));
        assert!(is_jpeg(Path::new("out.JPEG")));
        assert!(!is_jpeg(Path::new("out.png")));
        assert!(!is_jpeg(Path::new("out")));
    }
}
