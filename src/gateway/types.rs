//! Model service wire types
//!
//! Request structs serialize straight into the Ollama HTTP API format. The
//! response side is where the service's shape variability lives: listings
//! arrive either wrapped in a `models` field or as a bare array, and text
//! replies come back chat-shaped, generate-shaped, or as a plain body. Both
//! are normalized here so nothing above the gateway has to care.

use super::error::GatewayError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag appended to model names that carry none
pub const DEFAULT_MODEL_TAG: &str = "latest";

/// Appends the default tag to bare model names
///
/// ```
/// use feature_gen::gateway::normalize_model_name;
///
/// assert_eq!(normalize_model_name("llama3"), "llama3:latest");
/// assert_eq!(normalize_model_name("llava:13b"), "llava:13b");
/// ```
pub fn normalize_model_name(name: &str) -> String {
    if name.contains(':') {
        name.to_string()
    } else {
        format!("{}:{}", name, DEFAULT_MODEL_TAG)
    }
}

/// A locally available model as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Name including tag, e.g. `llava:latest`
    #[serde(alias = "model")]
    pub name: String,

    /// Size on disk in bytes
    #[serde(default)]
    pub size: u64,

    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified_at: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Size in GiB for display
    pub fn size_gb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

/// Listing payload in either of the shapes the service produces
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModelListing {
    /// `{ "models": [ ... ] }`
    Wrapped { models: Vec<ModelDescriptor> },
    /// `[ ... ]`
    Bare(Vec<ModelDescriptor>),
}

impl ModelListing {
    pub fn into_models(self) -> Vec<ModelDescriptor> {
        match self {
            ModelListing::Wrapped { models } => models,
            ModelListing::Bare(models) => models,
        }
    }
}

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A chat message, optionally carrying base64 encoded images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn user_with_image(content: impl Into<String>, image_base64: String) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            images: vec![image_base64],
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
        }
    }
}

/// Body of `POST /api/generate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            images: Vec::new(),
            system: None,
            stream: false,
        }
    }

    pub fn with_image(mut self, image_base64: String) -> Self {
        self.images.push(image_base64);
        self
    }
}

/// Body of `POST /api/pull`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PullRequest<'a> {
    pub model: &'a str,
    pub stream: bool,
}

/// One line of the streamed pull progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PullStatus {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplyPayload {
    Chat { message: ReplyMessage },
    Generate { response: String },
    Failure { error: String },
}

/// A text reply in one of the shapes the service produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationReply {
    /// `{ "message": { "content": ... } }`
    Chat(String),
    /// `{ "response": ... }`
    Generate(String),
    /// A plain, non-JSON body
    Text(String),
}

impl GenerationReply {
    /// Classifies a raw response body
    pub fn from_body(body: &str) -> Result<Self, GatewayError> {
        match serde_json::from_str::<ReplyPayload>(body) {
            Ok(ReplyPayload::Chat { message }) => Ok(GenerationReply::Chat(message.content)),
            Ok(ReplyPayload::Generate { response }) => Ok(GenerationReply::Generate(response)),
            Ok(ReplyPayload::Failure { error }) => Err(GatewayError::Api {
                status: None,
                message: error,
            }),
            Err(_) if serde_json::from_str::<serde_json::Value>(body).is_ok() => {
                Err(GatewayError::InvalidResponse {
                    message: format!(
                        "unrecognized reply shape: {}",
                        body.chars().take(200).collect::<String>()
                    ),
                })
            }
            Err(_) => Ok(GenerationReply::Text(body.trim().to_string())),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            GenerationReply::Chat(text)
            | GenerationReply::Generate(text)
            | GenerationReply::Text(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_model_name() {
        assert_eq!(normalize_model_name("llama3"), "llama3:latest");
        assert_eq!(normalize_model_name("llama3:latest"), "llama3:latest");
        assert_eq!(normalize_model_name("qwen2.5:7b"), "qwen2.5:7b");
    }

    #[test]
    fn test_listing_wrapped_shape() {
        let json = r#"{
            "models": [
                {"name": "llava:latest", "size": 4700000000, "modified_at": "2024-05-01T10:00:00.123456789-07:00"},
                {"name": "llama3:latest", "size": 123}
            ]
        }"#;

        let models = serde_json::from_str::<ModelListing>(json)
            .unwrap()
            .into_models();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "llava:latest");
        assert!(models[0].modified_at.is_some());
        assert_eq!(models[1].size, 123);
        assert!(models[1].modified_at.is_none());
    }

    #[test]
    fn test_listing_bare_shape_with_model_key() {
        let json = r#"[{"model": "llama3:latest"}]"#;

        let models = serde_json::from_str::<ModelListing>(json)
            .unwrap()
            .into_models();
        assert_eq!(models, vec![ModelDescriptor::new("llama3:latest")]);
    }

    #[test]
    fn test_reply_shapes() {
        let chat = GenerationReply::from_body(
            r#"{"model":"llava","message":{"role":"assistant","content":"a login form"},"done":true}"#,
        )
        .unwrap();
        assert_eq!(chat, GenerationReply::Chat("a login form".to_string()));

        let generate =
            GenerationReply::from_body(r#"{"model":"llava","response":"a navbar","done":true}"#)
                .unwrap();
        assert_eq!(generate.into_text(), "a navbar");

        let text = GenerationReply::from_body("  just words\n").unwrap();
        assert_eq!(text, GenerationReply::Text("just words".to_string()));
    }

    #[test]
    fn test_reply_error_payload() {
        let err = GenerationReply::from_body(r#"{"error":"model does not support images"}"#)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Api { .. }));
        assert!(err.to_string().contains("does not support images"));
    }

    #[test]
    fn test_reply_unknown_json_shape() {
        let err = GenerationReply::from_body(r#"{"unexpected": 1}"#).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse { .. }));
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest::new(
            "llava:latest",
            vec![
                ChatMessage::system("be terse"),
                ChatMessage::user_with_image("describe", "aGVsbG8=".to_string()),
            ],
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0].get("images").is_none());
        assert_eq!(json["messages"][1]["images"][0], "aGVsbG8=");
    }

    #[test]
    fn test_generate_request_serialization() {
        let request = GenerateRequest::new("llava:latest", "describe")
            .with_image("aGVsbG8=".to_string());

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"prompt\":\"describe\""));
        assert!(json.contains("\"images\":[\"aGVsbG8=\"]"));
        assert!(!json.contains("system"));
    }

    #[test]
    fn test_pull_status_deserialization() {
        let status: PullStatus = serde_json::from_str(
            r#"{"status":"pulling abc","digest":"sha256:abc","total":100,"completed":40}"#,
        )
        .unwrap();
        assert_eq!(status.total, Some(100));
        assert_eq!(status.completed, Some(40));
        assert!(status.error.is_none());
    }
}
