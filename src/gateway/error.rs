//! Gateway error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the model service
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service could not be reached
    #[error("Network error: {message}")]
    Network { message: String },

    /// Request timed out after the specified duration (in seconds)
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The service answered with an error status or an error payload
    #[error("{}", format_api_error(.status, .message))]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// The response body could not be interpreted
    #[error("Invalid response from model service: {message}")]
    InvalidResponse { message: String },

    /// The model is not present locally and could not be pulled
    #[error("Failed to ensure model {model} is available")]
    ModelUnavailable { model: String },

    /// The image handed to a vision model could not be read
    #[error("Failed to read image {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Both the chat-style and the generate-style image invocation failed
    #[error("Error analyzing image with {model}: chat call failed ({primary}); generate fallback failed ({fallback})")]
    Generation {
        model: String,
        primary: String,
        fallback: String,
    },

    /// Text generation failed
    #[error("Error generating text with {model}: {source}")]
    TextGeneration {
        model: String,
        #[source]
        source: Box<GatewayError>,
    },

    #[error("{message}")]
    Other { message: String },
}

fn format_api_error(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("API error ({}): {}", code, message),
        None => format!("API error: {}", message),
    }
}

impl GatewayError {
    pub(crate) fn from_reqwest(err: reqwest::Error, endpoint: &str, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout {
                seconds: timeout_secs,
            }
        } else if err.is_connect() {
            GatewayError::Network {
                message: format!("Cannot connect to {}: {}", endpoint, err),
            }
        } else {
            GatewayError::Network {
                message: format!("Request failed: {}", err),
            }
        }
    }
}
