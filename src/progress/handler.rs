//! Progress handler trait and events

use std::path::PathBuf;
use std::time::Duration;

/// Events emitted while analyzing mockups and composing requirements
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Health check answered (or failed to)
    HealthChecked { endpoint: String, healthy: bool },

    /// A requested model is not installed locally
    ModelMissing { model: String },

    /// Model download started
    PullStarted { model: String },

    /// One streamed status line of a model download
    PullProgress {
        model: String,
        status: String,
        completed: Option<u64>,
        total: Option<u64>,
    },

    /// Model download finished
    PullComplete { model: String, duration: Duration },

    /// Model download failed
    PullFailed { model: String, error: String },

    /// Vision analysis of one image started
    ImageAnalysisStarted { image: String, model: String },

    /// Vision analysis of one image finished
    ImageAnalysisComplete { image: String, duration: Duration },

    /// The chat-style image call failed and the generate-style call is tried
    FallbackInvoked { model: String, error: String },

    /// Batch analysis started
    BatchStarted { total: usize },

    /// Batch item started (1-based index)
    BatchItemStarted {
        index: usize,
        total: usize,
        image: String,
    },

    /// Batch item failed and was recorded as an error entry
    BatchItemFailed {
        index: usize,
        image: String,
        error: String,
    },

    /// Frames were sampled from a video
    FramesExtracted {
        video: String,
        total_frames: usize,
        retained: usize,
    },

    /// Requirements generation started
    RequirementsStarted { model: String, screens: usize },

    /// Requirements generation finished
    RequirementsComplete { model: String, duration: Duration },

    /// Refinement from feedback started
    RefinementStarted { model: String },

    /// Refinement from feedback finished
    RefinementComplete { model: String, duration: Duration },

    /// A template was not found and the default structure is used
    TemplateFallback { name: String },

    /// Requirements were written to disk
    OutputSaved { path: PathBuf },
}

/// Trait for handling progress events
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
