//! Keep-latest frame worker.
//!
//! The camera delivers frames faster than a slow device can filter them.
//! Instead of queueing, the worker holds at most one pending frame: a
//! newer frame replaces a pending one, so the preview always shows the
//! most recent image and latency never grows.
//!
//! ```text
//! submit(frame) ──► FrameSlot (1 pending) ──► worker thread ──► sink
//!                         ▲                        │
//! set_parameters ─────────┘ (re-queue last frame)  └─ process(frame, params)
//! ```
//!
//! Parameters are read when a frame is dequeued, so a frame filtered
//! after a slider move always uses the newest values.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use funucer_pipeline::{FilterParameters, FilterPipeline, PixelBuffer};
use tracing::{debug, info, trace, warn};

use crate::slot::FrameSlot;
use crate::types::{PreviewConfig, PreviewError, ProcessedFrame, ProcessorStats};

/// One unit of work for the worker.
#[derive(Debug)]
struct Job {
    sequence: u64,
    frame: Arc<PixelBuffer>,
    reprocessed: bool,
}

/// Mutable state shared between the handle and the worker thread.
#[derive(Debug)]
struct State {
    slot: FrameSlot<Job>,
    params: FilterParameters,
    /// Most recently submitted frame, kept for re-filtering.
    last: Option<(u64, Arc<PixelBuffer>)>,
    next_sequence: u64,
    submitted: u64,
    processed: u64,
    stopping: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    wake: Condvar,
}

impl Shared {
    /// Lock the state. A panic in the sink cannot leave `State`
    /// half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a running keep-latest frame worker.
///
/// Dropping the handle stops the worker and joins its thread.
///
/// # Example
///
/// ```no_run
/// # use funucer_pipeline::{FilterParameters, PixelBuffer};
/// # use funucer_preview::{LatestFrameProcessor, PreviewConfig, PreviewError};
/// # fn run(frame: PixelBuffer) -> Result<(), PreviewError> {
/// let mut processor = LatestFrameProcessor::start(
///     PreviewConfig::default(),
///     FilterParameters::default(),
///     |out| println!("frame {} filtered", out.sequence),
/// )?;
///
/// processor.submit(frame)?;
/// processor.set_parameters(FilterParameters::new(5.0, 30.0, 1.2))?;
/// processor.stop();
/// # Ok(())
/// # }
/// ```
pub struct LatestFrameProcessor {
    shared: Arc<Shared>,
    thread_handle: Option<JoinHandle<()>>,
    config: PreviewConfig,
}

impl LatestFrameProcessor {
    /// Spawn the worker thread.
    ///
    /// `sink` runs on the worker thread once per filtered frame.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::Filter`] if `params` contains a non-finite
    /// value and [`PreviewError::Spawn`] if the thread cannot be created.
    pub fn start<F>(
        config: PreviewConfig,
        params: FilterParameters,
        sink: F,
    ) -> Result<Self, PreviewError>
    where
        F: FnMut(ProcessedFrame) + Send + 'static,
    {
        params.validate()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                slot: FrameSlot::new(),
                params,
                last: None,
                next_sequence: 0,
                submitted: 0,
                processed: 0,
                stopping: false,
            }),
            wake: Condvar::new(),
        });

        info!(name = %config.name, pipeline = ?config.pipeline, "Starting frame worker");

        let worker_shared = Arc::clone(&shared);
        let worker_name = config.name.clone();
        let pipeline = config.pipeline;
        let thread_handle = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || run_worker(&worker_name, &worker_shared, pipeline, sink))?;

        Ok(Self {
            shared,
            thread_handle: Some(thread_handle),
            config,
        })
    }

    /// Offer a frame for filtering and return its sequence number.
    ///
    /// If an earlier frame is still waiting, it is dropped in favor of
    /// this one.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::Stopped`] once the worker has been stopped.
    pub fn submit(&self, frame: PixelBuffer) -> Result<u64, PreviewError> {
        let mut state = self.shared.lock();
        if state.stopping {
            return Err(PreviewError::Stopped);
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.submitted += 1;

        let frame = Arc::new(frame);
        state.last = Some((sequence, Arc::clone(&frame)));
        if let Some(displaced) = state.slot.offer(Job {
            sequence,
            frame,
            reprocessed: false,
        }) {
            trace!(
                name = %self.config.name,
                dropped = displaced.sequence,
                replacement = sequence,
                "Dropped pending frame",
            );
        }
        drop(state);

        self.shared.wake.notify_one();
        Ok(sequence)
    }

    /// Replace the parameter snapshot.
    ///
    /// With [`PreviewConfig::reprocess_on_change`] enabled and no frame
    /// pending, the most recent frame is queued again so the new values
    /// show up without waiting for the camera.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::Filter`] for non-finite parameters and
    /// [`PreviewError::Stopped`] once the worker has been stopped.
    pub fn set_parameters(&self, params: FilterParameters) -> Result<(), PreviewError> {
        params.validate()?;

        let mut state = self.shared.lock();
        if state.stopping {
            return Err(PreviewError::Stopped);
        }
        state.params = params;

        if self.config.reprocess_on_change
            && state.slot.is_empty()
            && let Some((sequence, frame)) = state.last.clone()
        {
            debug!(name = %self.config.name, sequence, "Re-filtering last frame with new parameters");
            state.slot.offer(Job {
                sequence,
                frame,
                reprocessed: true,
            });
            drop(state);
            self.shared.wake.notify_one();
        }
        Ok(())
    }

    /// The current parameter snapshot.
    #[must_use]
    pub fn parameters(&self) -> FilterParameters {
        self.shared.lock().params
    }

    /// Throughput counters so far.
    #[must_use]
    pub fn stats(&self) -> ProcessorStats {
        let state = self.shared.lock();
        ProcessorStats {
            submitted: state.submitted,
            processed: state.processed,
            dropped: state.slot.dropped(),
        }
    }

    /// The configuration the worker was started with.
    #[must_use]
    pub const fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Whether the worker thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Signal the worker to stop without waiting for it.
    ///
    /// A frame still pending is discarded; a frame being filtered is
    /// finished and delivered.
    pub fn request_stop(&self) {
        debug!(name = %self.config.name, "Requesting frame worker stop");
        self.shared.lock().stopping = true;
        self.shared.wake.notify_all();
    }

    /// Stop the worker and wait for its thread to finish.
    pub fn stop(&mut self) {
        self.request_stop();
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.config.name, "Waiting for frame worker to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.config.name, "Frame worker panicked: {:?}", e);
            } else {
                debug!(name = %self.config.name, "Frame worker finished");
            }
        }
    }
}

impl Drop for LatestFrameProcessor {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.config.name, "LatestFrameProcessor dropped, stopping worker");
            self.stop();
        }
    }
}

fn run_worker<F>(name: &str, shared: &Shared, pipeline: FilterPipeline, mut sink: F)
where
    F: FnMut(ProcessedFrame),
{
    debug!(name = %name, "Frame worker thread started");

    while let Some((job, params)) = next_job(shared) {
        let buffer = pipeline.process(&job.frame, params);
        sink(ProcessedFrame {
            sequence: job.sequence,
            reprocessed: job.reprocessed,
            parameters: params,
            buffer,
        });
        shared.lock().processed += 1;
    }

    info!(name = %name, "Frame worker thread exiting");
}

/// Block until a job is pending or a stop is requested.
fn next_job(shared: &Shared) -> Option<(Job, FilterParameters)> {
    let mut state = shared.lock();
    loop {
        if state.stopping {
            return None;
        }
        if let Some(job) = state.slot.take() {
            return Some((job, state.params));
        }
        state = shared
            .wake
            .wait(state)
            .unwrap_or_else(PoisonError::into_inner);
    }
}
