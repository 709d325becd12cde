use super::error::AnalyzerError;
use super::parser::parse_components;
use super::prompt::VISION_PROMPT;
use super::types::{display_name, AnalysisResult, BatchEntry, VideoAnalysisResult};
use super::video::{extract_frames, FfmpegFrameSource, FrameScratch, FrameSource};
use crate::gateway::ModelGateway;
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Image extensions accepted by [`MockupAnalyzer::analyze_image`]
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Turns mockup images and videos into [`AnalysisResult`]s
pub struct MockupAnalyzer {
    gateway: Arc<ModelGateway>,
    progress: Arc<dyn ProgressHandler>,
    scratch_root: PathBuf,
}

impl MockupAnalyzer {
    pub fn new(gateway: Arc<ModelGateway>) -> Self {
        Self {
            gateway,
            progress: Arc::new(NoOpHandler),
            scratch_root: std::env::temp_dir(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// Directory under which per-video scratch directories are created
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    /// Analyzes one image
    ///
    /// The path and extension are checked before the gateway is touched.
    /// `custom_prompt` replaces [`VISION_PROMPT`] when present and non-empty.
    pub async fn analyze_image(
        &self,
        image_path: &Path,
        model: &str,
        custom_prompt: Option<&str>,
    ) -> Result<AnalysisResult, AnalyzerError> {
        validate_image(image_path)?;

        let prompt = custom_prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(VISION_PROMPT);
        let image = display_name(image_path);
        let start = Instant::now();

        self.progress.on_progress(&ProgressEvent::ImageAnalysisStarted {
            image: image.clone(),
            model: model.to_string(),
        });

        let raw = self.gateway.analyze_image(image_path, model, prompt).await?;
        let parsed = parse_components(&raw);
        debug!(
            image = %image,
            components = parsed.total(),
            "Parsed vision output"
        );

        self.progress.on_progress(&ProgressEvent::ImageAnalysisComplete {
            image,
            duration: start.elapsed(),
        });

        Ok(AnalysisResult::new(image_path, model, raw, parsed))
    }

    /// Analyzes images one at a time, in order
    ///
    /// A failing image becomes a [`BatchEntry::Failed`] in its slot; the rest
    /// of the batch still runs.
    pub async fn analyze_batch(&self, image_paths: &[PathBuf], model: &str) -> Vec<BatchEntry> {
        let total = image_paths.len();
        self.progress
            .on_progress(&ProgressEvent::BatchStarted { total });

        let mut entries = Vec::with_capacity(total);
        for (idx, path) in image_paths.iter().enumerate() {
            let index = idx + 1;
            self.progress.on_progress(&ProgressEvent::BatchItemStarted {
                index,
                total,
                image: display_name(path),
            });

            match self.analyze_image(path, model, None).await {
                Ok(result) => entries.push(BatchEntry::Analyzed(result)),
                Err(e) => {
                    warn!("Error analyzing {}: {}", path.display(), e);
                    self.progress.on_progress(&ProgressEvent::BatchItemFailed {
                        index,
                        image: display_name(path),
                        error: e.to_string(),
                    });
                    entries.push(BatchEntry::Failed {
                        image_path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        entries
    }

    /// Samples every `frame_interval`th frame of a video and analyzes them
    pub async fn analyze_video(
        &self,
        video_path: &Path,
        frame_interval: usize,
        model: &str,
    ) -> Result<VideoAnalysisResult, AnalyzerError> {
        if frame_interval == 0 {
            return Err(AnalyzerError::InvalidFrameInterval {
                interval: frame_interval,
            });
        }
        if !video_path.is_file() {
            return Err(AnalyzerError::NotFound {
                path: video_path.to_path_buf(),
            });
        }

        info!("Extracting frames from {}", display_name(video_path));
        let path = video_path.to_path_buf();
        let source = tokio::task::spawn_blocking(move || FfmpegFrameSource::open(&path))
            .await
            .map_err(|e| AnalyzerError::decode(video_path, format!("decoder task failed: {e}")))??;
        self.analyze_frames(source, video_path, frame_interval, model)
            .await
    }

    /// Same as [`analyze_video`](Self::analyze_video) over an arbitrary frame source
    ///
    /// Decoding and frame writes run on the blocking thread pool.
    pub async fn analyze_frames<S>(
        &self,
        mut source: S,
        video_path: &Path,
        frame_interval: usize,
        model: &str,
    ) -> Result<VideoAnalysisResult, AnalyzerError>
    where
        S: FrameSource + 'static,
    {
        if frame_interval == 0 {
            return Err(AnalyzerError::InvalidFrameInterval {
                interval: frame_interval,
            });
        }

        let root = self.scratch_root.clone();
        let path = video_path.to_path_buf();
        let (scratch, total_frames) = tokio::task::spawn_blocking(move || {
            let mut scratch = FrameScratch::create(&root, &path)?;
            let total = extract_frames(&mut source, frame_interval, &mut scratch)?;
            Ok::<_, AnalyzerError>((scratch, total))
        })
        .await
        .map_err(|e| {
            AnalyzerError::decode(video_path, format!("frame extraction task failed: {e}"))
        })??;
        let frames = scratch.frames().to_vec();

        self.progress.on_progress(&ProgressEvent::FramesExtracted {
            video: display_name(video_path),
            total_frames,
            retained: frames.len(),
        });

        let frame_analyses = self.analyze_batch(&frames, model).await;
        drop(scratch);

        Ok(VideoAnalysisResult {
            video_path: video_path.to_path_buf(),
            video_name: display_name(video_path),
            total_frames,
            analyzed_frames: frames.len(),
            frame_interval,
            model_used: model.to_string(),
            frame_analyses,
        })
    }
}

impl std::fmt::Debug for MockupAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockupAnalyzer")
            .field("gateway", &self.gateway)
            .field("scratch_root", &self.scratch_root)
            .finish()
    }
}

/// Checks that `path` exists and has a supported image extension
pub fn validate_image(path: &Path) -> Result<(), AnalyzerError> {
    if !path.is_file() {
        return Err(AnalyzerError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AnalyzerError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: format!(".{}", extension),
        });
    }
    Ok(())
}
