//! Ollama HTTP client
//!
//! Speaks the Ollama REST API (`/api/tags`, `/api/pull`, `/api/chat`,
//! `/api/generate`) with `reqwest`. The client is deliberately thin: it
//! moves bytes and classifies HTTP failures, and leaves everything else to
//! the gateway.
//!
//! # Example
//!
//! ```no_run
//! use feature_gen::gateway::{ModelService, OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new("http://localhost:11434");
//!
//! if client.health_check().await? {
//!     let models = client.list_models().await?.into_models();
//!     println!("{} models installed", models.len());
//! }
//! # Ok(())
//! # }
//! ```

use super::error::GatewayError;
use super::service::ModelService;
use super::types::{
    ChatRequest, GenerateRequest, GenerationReply, ModelListing, PullRequest, PullStatus,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default endpoint of a local Ollama server
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Default timeout for the health check
const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

/// HTTP client for a local Ollama server
///
/// Generation and pull requests carry no timeout unless one is configured;
/// large models can take minutes to answer or download. The health check
/// always uses its own short timeout.
pub struct OllamaClient {
    /// Ollama API endpoint URL, without trailing slash
    endpoint: String,

    /// Shared HTTP client with connection pooling
    http_client: Client,

    /// Optional cap for generation and pull requests
    request_timeout: Option<Duration>,

    /// Timeout for the health check
    health_timeout: Duration,
}

impl OllamaClient {
    /// Creates a client without a request timeout
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: trim_endpoint(endpoint.into()),
            http_client: Client::new(),
            request_timeout: None,
            health_timeout: Duration::from_secs(DEFAULT_HEALTH_TIMEOUT_SECS),
        }
    }

    /// Creates a client with explicit timeouts
    pub fn with_timeouts(
        endpoint: impl Into<String>,
        request_timeout: Option<Duration>,
        health_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| GatewayError::Other {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            endpoint: trim_endpoint(endpoint.into()),
            http_client,
            request_timeout,
            health_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn timeout_secs(&self) -> u64 {
        self.request_timeout.map(|t| t.as_secs()).unwrap_or(0)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, GatewayError> {
        let url = self.url(path);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Ollama request to {} failed: {}", url, e);
                GatewayError::from_reqwest(e, &self.endpoint, self.timeout_secs())
            })?;

        check_status(response).await
    }

    async fn read_reply(&self, response: Response) -> Result<GenerationReply, GatewayError> {
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, &self.endpoint, self.timeout_secs()))?;
        GenerationReply::from_body(&body)
    }
}

fn trim_endpoint(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("Ollama API returned error status {}: {}", status, body);

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);

    Err(GatewayError::Api {
        status: Some(status.as_u16()),
        message,
    })
}

/// Splits complete lines off the front of `buffer`, leaving any partial line
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&line).trim().to_string();
        if !text.is_empty() {
            lines.push(text);
        }
    }
    lines
}

fn parse_pull_line(line: &str) -> Result<PullStatus, GatewayError> {
    let status: PullStatus =
        serde_json::from_str(line).map_err(|e| GatewayError::InvalidResponse {
            message: format!("Malformed pull status '{}': {}", line, e),
        })?;

    match status.error {
        Some(message) => Err(GatewayError::Api {
            status: None,
            message,
        }),
        None => Ok(status),
    }
}

#[async_trait]
impl ModelService for OllamaClient {
    async fn health_check(&self) -> Result<bool, GatewayError> {
        let url = self.url("/api/tags");
        debug!("Checking Ollama health at {}", url);

        match self
            .http_client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let is_healthy = response.status().is_success();
                if is_healthy {
                    info!("Ollama health check successful");
                } else {
                    warn!(
                        "Ollama health check failed with status: {}",
                        response.status()
                    );
                }
                Ok(is_healthy)
            }
            Err(e) => {
                if e.is_timeout() {
                    warn!("Ollama health check timed out");
                    Ok(false)
                } else if e.is_connect() {
                    warn!("Cannot connect to Ollama at {}", self.endpoint);
                    Ok(false)
                } else {
                    error!("Ollama health check error: {}", e);
                    Err(GatewayError::Network {
                        message: format!("Health check failed: {}", e),
                    })
                }
            }
        }
    }

    async fn list_models(&self) -> Result<ModelListing, GatewayError> {
        let url = self.url("/api/tags");
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, &self.endpoint, self.timeout_secs()))?;
        let response = check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, &self.endpoint, self.timeout_secs()))?;

        serde_json::from_str(&body).map_err(|e| GatewayError::InvalidResponse {
            message: format!("Failed to parse model listing: {}", e),
        })
    }

    async fn pull(
        &self,
        model: &str,
        on_status: &mut (dyn FnMut(PullStatus) + Send),
    ) -> Result<(), GatewayError> {
        let start = Instant::now();
        let mut response = self
            .post_json("/api/pull", &PullRequest { model, stream: true })
            .await?;

        let mut buffer = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, &self.endpoint, self.timeout_secs()))?
        {
            buffer.extend_from_slice(&chunk);
            for line in drain_lines(&mut buffer) {
                on_status(parse_pull_line(&line)?);
            }
        }

        let rest = String::from_utf8_lossy(&buffer).trim().to_string();
        if !rest.is_empty() {
            on_status(parse_pull_line(&rest)?);
        }

        info!(
            "Ollama pull of {} finished in {:.2}s",
            model,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    async fn chat(&self, request: ChatRequest) -> Result<GenerationReply, GatewayError> {
        debug!(
            "Sending chat request to Ollama: model={}, messages={}",
            request.model,
            request.messages.len()
        );
        let start = Instant::now();

        let response = self.post_json("/api/chat", &request).await?;
        let reply = self.read_reply(response).await?;

        info!(
            "Ollama chat completed in {:.2}s (model={})",
            start.elapsed().as_secs_f64(),
            request.model
        );
        Ok(reply)
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerationReply, GatewayError> {
        debug!(
            "Sending generate request to Ollama: model={}, prompt_length={}, images={}",
            request.model,
            request.prompt.len(),
            request.images.len()
        );
        let start = Instant::now();

        let response = self.post_json("/api/generate", &request).await?;
        let reply = self.read_reply(response).await?;

        info!(
            "Ollama generation completed in {:.2}s (model={})",
            start.elapsed().as_secs_f64(),
            request.model
        );
        Ok(reply)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn endpoint(&self) -> Option<String> {
        Some(self.endpoint.clone())
    }
}

impl fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaClient")
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .field("health_timeout", &self.health_timeout)
            .finish()
    }
}
