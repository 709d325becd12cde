//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::HealthChecked { endpoint, healthy } => {
                if *healthy {
                    debug!(endpoint = %endpoint, "Model service is healthy");
                } else {
                    warn!(endpoint = %endpoint, "Model service is not reachable");
                }
            }
            ProgressEvent::ModelMissing { model } => {
                warn!(model = %model, "Model not found locally, pulling");
            }
            ProgressEvent::PullStarted { model } => {
                info!(model = %model, "Pulling model");
            }
            ProgressEvent::PullProgress {
                model,
                status,
                completed,
                total,
            } => {
                debug!(
                    model = %model,
                    status = %status,
                    completed = completed.unwrap_or(0),
                    total = total.unwrap_or(0),
                    "Pull progress"
                );
            }
            ProgressEvent::PullComplete { model, duration } => {
                info!(
                    model = %model,
                    duration_ms = duration.as_millis(),
                    "Model ready"
                );
            }
            ProgressEvent::PullFailed { model, error } => {
                warn!(model = %model, error = %error, "Model pull failed");
            }
            ProgressEvent::ImageAnalysisStarted { image, model } => {
                info!(image = %image, model = %model, "Analyzing image");
            }
            ProgressEvent::ImageAnalysisComplete { image, duration } => {
                info!(
                    image = %image,
                    duration_ms = duration.as_millis(),
                    "Vision analysis complete"
                );
            }
            ProgressEvent::FallbackInvoked { model, error } => {
                warn!(
                    model = %model,
                    error = %error,
                    "Chat-style image call failed, retrying with generate"
                );
            }
            ProgressEvent::BatchStarted { total } => {
                info!(total, "Analyzing images");
            }
            ProgressEvent::BatchItemStarted {
                index,
                total,
                image,
            } => {
                info!(
                    image = %image,
                    progress = format!("{}/{}", index, total),
                    "Batch item"
                );
            }
            ProgressEvent::BatchItemFailed {
                index,
                image,
                error,
            } => {
                warn!(index, image = %image, error = %error, "Image analysis failed");
            }
            ProgressEvent::FramesExtracted {
                video,
                total_frames,
                retained,
            } => {
                info!(
                    video = %video,
                    total_frames,
                    retained,
                    "Extracted frames"
                );
            }
            ProgressEvent::RequirementsStarted { model, screens } => {
                info!(model = %model, screens, "Generating requirements");
            }
            ProgressEvent::RequirementsComplete { model, duration } => {
                info!(
                    model = %model,
                    duration_ms = duration.as_millis(),
                    "Requirements generated"
                );
            }
            ProgressEvent::RefinementStarted { model } => {
                info!(model = %model, "Refining requirements based on feedback");
            }
            ProgressEvent::RefinementComplete { model, duration } => {
                info!(
                    model = %model,
                    duration_ms = duration.as_millis(),
                    "Requirements refined"
                );
            }
            ProgressEvent::TemplateFallback { name } => {
                warn!(template = %name, "Template not found, using default structure");
            }
            ProgressEvent::OutputSaved { path } => {
                info!(path = %path.display(), "Requirements saved");
            }
        }
    }
}
