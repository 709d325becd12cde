//! feature-gen - turn UI mockups into software requirements with local models
//!
//! This library drives a locally hosted vision/language model service
//! (Ollama) to describe mockup images, wireframes and screen recordings, and
//! then to write a requirements document from those descriptions. No
//! inference happens here; the crate shapes prompts and lightly parses the
//! free text that comes back.
//!
//! # Core Concepts
//!
//! - **Model Gateway**: text-in/text-out contract over the model service,
//!   hiding its response-shape differences and pulling models on demand
//! - **Mockup Analyzer**: sends an image (or sampled video frames) to a
//!   vision model and buckets the answer into UI component categories
//! - **Requirements Composer**: combines analyses with a template into a
//!   prompt for a text model, refines documents from feedback and saves them
//!
//! # Example Usage
//!
//! ```no_run
//! use feature_gen::{FeatureGenConfig, MockupAnalyzer, OutputFormat, RequirementsComposer};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FeatureGenConfig::default();
//! let gateway = Arc::new(config.create_gateway()?);
//!
//! let analyzer = MockupAnalyzer::new(gateway.clone());
//! let analysis = analyzer
//!     .analyze_image(Path::new("login.png"), &config.vision_model, None)
//!     .await?;
//!
//! let composer = RequirementsComposer::new(gateway, config.template_store());
//! let document = composer
//!     .build_requirements(&analysis, "web_app", &config.llm_model, OutputFormat::Markdown)
//!     .await?;
//! composer.save_output(&document, Path::new("login-requirements"), "markdown")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`gateway`]: model service access and response normalization
//! - [`analyzer`]: image and video analysis, component parsing
//! - [`requirements`]: templates, prompt assembly, document output
//! - [`progress`]: injectable progress reporting

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod progress;
pub mod requirements;
pub mod util;

pub use analyzer::{
    AnalysisResult, AnalyzerError, BatchEntry, ComponentCategory, MockupAnalyzer,
    ParsedComponents, VideoAnalysisResult,
};
pub use config::{ConfigError, FeatureGenConfig};
pub use gateway::{GatewayError, ModelDescriptor, ModelGateway, ModelService, OllamaClient};
pub use progress::{NoOpHandler, ProgressEvent, ProgressHandler};
pub use requirements::{
    ComposerError, OutputFormat, RequirementsComposer, TemplateConfig, TemplateStore,
};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
