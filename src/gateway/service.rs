use super::error::GatewayError;
use super::types::{ChatRequest, GenerateRequest, GenerationReply, ModelListing, PullStatus};
use async_trait::async_trait;

/// Raw operations of a model-serving endpoint
///
/// Implementations only translate to and from the wire; policy (model
/// presence, fallbacks, error wrapping) lives in [`super::ModelGateway`].
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Lightweight status query
    async fn health_check(&self) -> Result<bool, GatewayError>;

    /// Lists locally available models
    async fn list_models(&self) -> Result<ModelListing, GatewayError>;

    /// Pulls a model, reporting each streamed status line to `on_status`
    async fn pull(
        &self,
        model: &str,
        on_status: &mut (dyn FnMut(PullStatus) + Send),
    ) -> Result<(), GatewayError>;

    /// Chat-style generation
    async fn chat(&self, request: ChatRequest) -> Result<GenerationReply, GatewayError>;

    /// Prompt-style generation
    async fn generate(&self, request: GenerateRequest) -> Result<GenerationReply, GatewayError>;

    fn name(&self) -> &str;

    fn endpoint(&self) -> Option<String> {
        None
    }
}
