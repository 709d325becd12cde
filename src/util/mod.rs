//! Utility modules for feature-gen

pub mod logging;

pub use logging::{init_from_env, init_logging, resolve_level, LoggingConfig};
