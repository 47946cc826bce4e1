//! funucer-preview: keep-latest frame worker for the filter pipeline.
//!
//! The filter pipeline in `funucer-pipeline` is a pure function. This crate
//! supplies the surrounding frame driver a camera preview needs: a
//! dedicated worker thread, one frame in flight, newer frames replacing
//! pending ones, and re-filtering of the last frame when the user moves a
//! slider.

mod processor;
pub mod slot;
mod types;

pub use processor::LatestFrameProcessor;
pub use slot::FrameSlot;
pub use types::{PreviewConfig, PreviewError, ProcessedFrame, ProcessorStats};
