use crate::gateway::GatewayError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Unsupported image format: {extension}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Frame interval must be at least 1, got {interval}")]
    InvalidFrameInterval { interval: usize },

    #[error("Failed to decode video {}: {message}", .path.display())]
    FrameDecode { path: PathBuf, message: String },

    #[error("Failed to write frame {}: {message}", .path.display())]
    FrameWrite { path: PathBuf, message: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AnalyzerError {
    pub(crate) fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AnalyzerError::FrameDecode {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_names_extension() {
        let err = AnalyzerError::UnsupportedFormat {
            path: PathBuf::from("mock.gif"),
            extension: ".gif".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported image format: .gif");
    }

    #[test]
    fn test_gateway_error_is_transparent() {
        let err: AnalyzerError = GatewayError::ModelUnavailable {
            model: "llava:latest".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            GatewayError::ModelUnavailable {
                model: "llava:latest".to_string()
            }
            .to_string()
        );
    }
}
