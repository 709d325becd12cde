//! Mockup analyzer
//!
//! Sends mockup images (or sampled video frames) to a vision model through
//! the [`ModelGateway`](crate::gateway::ModelGateway) and buckets the free
//! text that comes back into [`ParsedComponents`].

mod error;
mod mockup;
mod parser;
mod prompt;
mod types;
mod video;

pub use error::AnalyzerError;
pub use mockup::{validate_image, MockupAnalyzer, SUPPORTED_IMAGE_EXTENSIONS};
pub use parser::{classify_header, parse_components};
pub use prompt::VISION_PROMPT;
pub use types::{
    AnalysisResult, BatchEntry, ComponentCategory, ParsedComponents, VideoAnalysisResult,
};
pub use video::{
    extract_frames, is_video, FfmpegFrameSource, FrameScratch, FrameSource,
    DEFAULT_FRAME_INTERVAL, VIDEO_EXTENSIONS,
};
