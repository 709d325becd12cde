//! Model gateway
//!
//! Everything that touches the model-serving endpoint lives here. Callers
//! use [`ModelGateway`]; the [`ModelService`] trait is the seam between the
//! gateway's policy and the wire ([`OllamaClient`] in production,
//! [`MockModelService`] in tests).

mod client;
mod error;
mod mock;
mod ollama;
mod service;
mod types;

pub use client::{
    ModelGateway, RecommendedModels, DEFAULT_HEALTH_TIMEOUT, DEFAULT_LLM_MODEL,
    DEFAULT_VISION_MODEL,
};
pub use error::GatewayError;
pub use mock::{MockModelService, MockReply, RecordedCall};
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_HOST};
pub use service::ModelService;
pub use types::{
    normalize_model_name, ChatMessage, ChatRequest, GenerateRequest, GenerationReply,
    MessageRole, ModelDescriptor, ModelListing, PullStatus, DEFAULT_MODEL_TAG,
};
