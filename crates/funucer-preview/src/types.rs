//! Shared types for the preview frame worker.

use funucer_pipeline::{FilterError, FilterParameters, FilterPipeline, PixelBuffer};
use serde::{Deserialize, Serialize};

/// Configuration for a [`LatestFrameProcessor`](crate::LatestFrameProcessor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Worker thread name, also used in log events.
    pub name: String,

    /// Pipeline configuration applied to every frame.
    pub pipeline: FilterPipeline,

    /// Re-filter the most recent frame when the parameters change, so a
    /// slider move is visible even if the camera has stopped delivering.
    pub reprocess_on_change: bool,
}

impl PreviewConfig {
    /// Default worker thread name.
    pub const DEFAULT_NAME: &'static str = "funucer-preview";
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_owned(),
            pipeline: FilterPipeline::default(),
            reprocess_on_change: true,
        }
    }
}

/// A filtered frame delivered to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFrame {
    /// Sequence number assigned to the source frame by
    /// [`submit`](crate::LatestFrameProcessor::submit).
    pub sequence: u64,

    /// `true` when this output re-filters an already delivered frame after
    /// a parameter change.
    pub reprocessed: bool,

    /// The parameter snapshot the frame was filtered with.
    pub parameters: FilterParameters,

    /// The filtered frame.
    pub buffer: PixelBuffer,
}

/// Counters describing the worker's throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStats {
    /// Frames accepted by `submit`.
    pub submitted: u64,
    /// Outputs handed to the sink (reprocessed frames included).
    pub processed: u64,
    /// Pending work replaced by newer frames before it was filtered.
    pub dropped: u64,
}

/// Errors from the preview frame worker.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// The worker thread could not be spawned.
    #[error("failed to spawn frame worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker has been stopped and accepts no more frames.
    #[error("frame worker has been stopped")]
    Stopped,

    /// Invalid filter parameters.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use funucer_pipeline::{BorderPolicy, ExecutionMode};

    use super::*;

    #[test]
    fn default_config_reprocesses() {
        let config = PreviewConfig::default();
        assert!(config.reprocess_on_change);
        assert_eq!(config.name, PreviewConfig::DEFAULT_NAME);
        assert_eq!(config.pipeline, FilterPipeline::default());
    }

    #[test]
    fn config_from_partial_json() {
        let config: PreviewConfig = serde_json::from_str(
            r#"{"pipeline": {"border": "Replicate", "mode": "Fused"}, "reprocess_on_change": false}"#,
        )
        .unwrap();
        assert_eq!(config.name, PreviewConfig::DEFAULT_NAME);
        assert_eq!(config.pipeline.border, BorderPolicy::Replicate);
        assert_eq!(config.pipeline.mode, ExecutionMode::Fused);
        assert!(!config.reprocess_on_change);
    }

    #[test]
    fn filter_error_is_transparent() {
        let err = PreviewError::from(FilterError::ZeroDimension {
            width: 0,
            height: 0,
        });
        assert!(err.to_string().starts_with("invalid dimensions"));
    }
}
