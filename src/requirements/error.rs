use crate::gateway::GatewayError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("Malformed template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No successful analyses to build requirements from")]
    NoAnalyses,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
