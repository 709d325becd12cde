//! Model gateway
//!
//! [`ModelGateway`] is the only thing the analyzer and composer talk to. It
//! wraps a [`ModelService`] and turns it into a text-in/text-out contract:
//!
//! - health and listing never fail; problems are logged and reported as
//!   `false` / empty
//! - generation ensures the model is installed first, pulling it on demand
//! - image analysis tries a chat-style call, then a generate-style call,
//!   and reports both causes if neither works

use super::error::GatewayError;
use super::service::ModelService;
use super::types::{
    normalize_model_name, ChatMessage, ChatRequest, GenerateRequest, ModelDescriptor, PullStatus,
};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Default timeout for [`ModelGateway::check_health`]
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default vision model
pub const DEFAULT_VISION_MODEL: &str = "llama3.2-vision:latest";

/// Default text model
pub const DEFAULT_LLM_MODEL: &str = "llama3:latest";

/// Vision and text models suggested during setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendedModels {
    pub vision: String,
    pub llm: String,
}

impl Default for RecommendedModels {
    fn default() -> Self {
        Self {
            vision: DEFAULT_VISION_MODEL.to_string(),
            llm: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}

pub struct ModelGateway {
    service: Arc<dyn ModelService>,
    progress: Arc<dyn ProgressHandler>,
    health_timeout: Duration,
    recommended: RecommendedModels,
}

impl ModelGateway {
    pub fn new(service: Arc<dyn ModelService>) -> Self {
        Self {
            service,
            progress: Arc::new(NoOpHandler),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            recommended: RecommendedModels::default(),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn with_recommended(mut self, recommended: RecommendedModels) -> Self {
        self.recommended = recommended;
        self
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn endpoint(&self) -> String {
        self.service
            .endpoint()
            .unwrap_or_else(|| self.service.name().to_string())
    }

    /// Models suggested for vision analysis and text generation
    pub fn recommended_models(&self) -> &RecommendedModels {
        &self.recommended
    }

    /// Returns `true` iff the service answers its status query in time
    pub async fn check_health(&self) -> bool {
        let check = self.service.health_check();
        let healthy = match tokio::time::timeout(self.health_timeout, check).await {
            Ok(Ok(healthy)) => healthy,
            Ok(Err(e)) => {
                warn!("Health check failed: {}", e);
                false
            }
            Err(_) => {
                warn!(
                    "Health check did not answer within {:?}",
                    self.health_timeout
                );
                false
            }
        };

        self.progress.on_progress(&ProgressEvent::HealthChecked {
            endpoint: self.endpoint(),
            healthy,
        });
        healthy
    }

    /// Lists installed models, empty on any failure
    pub async fn list_models(&self) -> Vec<ModelDescriptor> {
        match self.service.list_models().await {
            Ok(listing) => listing.into_models(),
            Err(e) => {
                error!("Error listing models: {}", e);
                Vec::new()
            }
        }
    }

    /// Checks whether `model` is installed; bare names are matched as `name:latest`
    pub async fn model_exists(&self, model: &str) -> bool {
        let wanted = normalize_model_name(model);
        self.list_models().await.iter().any(|m| m.name == wanted)
    }

    /// Pulls `model` unless it is already installed
    pub async fn ensure_model(&self, model: &str) -> bool {
        if self.model_exists(model).await {
            return true;
        }

        self.progress.on_progress(&ProgressEvent::ModelMissing {
            model: model.to_string(),
        });
        self.pull_model(model).await
    }

    /// Downloads `model`, streaming status to the progress handler
    pub async fn pull_model(&self, model: &str) -> bool {
        let start = Instant::now();
        let progress = Arc::clone(&self.progress);
        let model_name = model.to_string();

        progress.on_progress(&ProgressEvent::PullStarted {
            model: model_name.clone(),
        });

        let mut on_status = |status: PullStatus| {
            progress.on_progress(&ProgressEvent::PullProgress {
                model: model_name.clone(),
                status: status.status,
                completed: status.completed,
                total: status.total,
            });
        };

        match self.service.pull(model, &mut on_status).await {
            Ok(()) => {
                self.progress.on_progress(&ProgressEvent::PullComplete {
                    model: model.to_string(),
                    duration: start.elapsed(),
                });
                true
            }
            Err(e) => {
                error!("Error pulling model {}: {}", model, e);
                self.progress.on_progress(&ProgressEvent::PullFailed {
                    model: model.to_string(),
                    error: e.to_string(),
                });
                false
            }
        }
    }

    /// Describes an image with a vision model
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ModelUnavailable`] if the model is missing and cannot be pulled
    /// - [`GatewayError::ImageRead`] if the image cannot be read
    /// - [`GatewayError::Generation`] if both invocation styles fail
    pub async fn analyze_image(
        &self,
        image_path: &Path,
        model: &str,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        if !self.ensure_model(model).await {
            return Err(GatewayError::ModelUnavailable {
                model: model.to_string(),
            });
        }

        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|source| GatewayError::ImageRead {
                path: image_path.to_path_buf(),
                source,
            })?;
        let encoded = STANDARD.encode(&bytes);
        debug!(
            "Encoded {} ({} bytes) for {}",
            image_path.display(),
            bytes.len(),
            model
        );

        let chat = ChatRequest::new(
            model,
            vec![ChatMessage::user_with_image(prompt, encoded.clone())],
        );
        let primary = match self.service.chat(chat).await {
            Ok(reply) => return Ok(reply.into_text()),
            Err(e) => e,
        };

        self.progress.on_progress(&ProgressEvent::FallbackInvoked {
            model: model.to_string(),
            error: primary.to_string(),
        });

        let generate = GenerateRequest::new(model, prompt).with_image(encoded);
        match self.service.generate(generate).await {
            Ok(reply) => Ok(reply.into_text()),
            Err(fallback) => Err(GatewayError::Generation {
                model: model.to_string(),
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            }),
        }
    }

    /// Generates text with a chat call and an optional system instruction
    ///
    /// # Errors
    ///
    /// [`GatewayError::ModelUnavailable`] if the model cannot be obtained,
    /// otherwise [`GatewayError::TextGeneration`] wrapping the service failure.
    pub async fn generate_text(
        &self,
        prompt: &str,
        model: &str,
        system: Option<&str>,
    ) -> Result<String, GatewayError> {
        if !self.ensure_model(model).await {
            return Err(GatewayError::ModelUnavailable {
                model: model.to_string(),
            });
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        self.service
            .chat(ChatRequest::new(model, messages))
            .await
            .map(|reply| reply.into_text())
            .map_err(|source| GatewayError::TextGeneration {
                model: model.to_string(),
                source: Box::new(source),
            })
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("service", &self.service.name())
            .field("health_timeout", &self.health_timeout)
            .field("recommended", &self.recommended)
            .finish()
    }
}
