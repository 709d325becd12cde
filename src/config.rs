//! Configuration management for feature-gen
//!
//! Settings are read from environment variables with fallback defaults.
//! Command-line flags override individual values after loading.
//!
//! # Environment Variables
//!
//! - `FEATURE_GEN_OLLAMA_HOST`: model service endpoint, then `OLLAMA_HOST` -
//!   default: "http://localhost:11434"
//! - `FEATURE_GEN_VISION_MODEL`: vision model - default: "llama3.2-vision:latest"
//! - `FEATURE_GEN_LLM_MODEL`: text model - default: "llama3:latest"
//! - `FEATURE_GEN_HEALTH_TIMEOUT`: health check timeout in seconds - default: "5"
//! - `FEATURE_GEN_REQUEST_TIMEOUT`: cap for generation and pull requests in
//!   seconds - default: none
//! - `FEATURE_GEN_TEMPLATES_DIR`: directory searched first for templates
//! - `FEATURE_GEN_FRAME_INTERVAL`: video sampling stride - default: "30"
//! - `FEATURE_GEN_LOG_LEVEL`: logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use feature_gen::FeatureGenConfig;
//!
//! let config = FeatureGenConfig::default();
//! config.validate().expect("Invalid configuration");
//! let gateway = config.create_gateway().expect("HTTP client");
//! ```

use crate::analyzer::DEFAULT_FRAME_INTERVAL;
use crate::gateway::{
    GatewayError, ModelGateway, OllamaClient, RecommendedModels, DEFAULT_LLM_MODEL,
    DEFAULT_OLLAMA_HOST, DEFAULT_VISION_MODEL,
};
use crate::requirements::TemplateStore;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;
const MAX_HEALTH_TIMEOUT_SECS: u64 = 60;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Gateway initialization failed: {0}")]
    GatewayInit(#[from] GatewayError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureGenConfig {
    /// Model service endpoint
    pub ollama_host: String,

    pub vision_model: String,

    pub llm_model: String,

    pub health_timeout_secs: u64,

    /// `None` leaves generation and pull requests unbounded
    pub request_timeout_secs: Option<u64>,

    /// Extra template directory searched before the user config dir
    pub templates_dir: Option<PathBuf>,

    pub frame_interval: usize,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for FeatureGenConfig {
    /// Loads from `FEATURE_GEN_*` variables, falling back to defaults
    ///
    /// Values that fail to parse fall back silently; use
    /// [`FeatureGenConfig::from_env`] to surface them.
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|_| Self::builtin())
    }
}

impl FeatureGenConfig {
    /// Built-in defaults without consulting the environment
    pub fn builtin() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            health_timeout_secs: DEFAULT_HEALTH_TIMEOUT_SECS,
            request_timeout_secs: None,
            templates_dir: None,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Loads from the environment, failing on values that do not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::builtin();

        let ollama_host = non_empty_var("FEATURE_GEN_OLLAMA_HOST")
            .or_else(|| non_empty_var("OLLAMA_HOST"))
            .map(|h| normalize_host(&h))
            .unwrap_or(defaults.ollama_host);

        let vision_model = non_empty_var("FEATURE_GEN_VISION_MODEL")
            .unwrap_or(defaults.vision_model);
        let llm_model = non_empty_var("FEATURE_GEN_LLM_MODEL")
            .unwrap_or(defaults.llm_model);

        let health_timeout_secs = parse_var("FEATURE_GEN_HEALTH_TIMEOUT")?
            .unwrap_or(defaults.health_timeout_secs);
        let request_timeout_secs = parse_var("FEATURE_GEN_REQUEST_TIMEOUT")?;
        let frame_interval = parse_var("FEATURE_GEN_FRAME_INTERVAL")?
            .unwrap_or(defaults.frame_interval);

        let templates_dir = non_empty_var("FEATURE_GEN_TEMPLATES_DIR").map(PathBuf::from);

        let log_level = non_empty_var("FEATURE_GEN_LOG_LEVEL")
            .unwrap_or(defaults.log_level)
            .to_lowercase();

        Ok(Self {
            ollama_host,
            vision_model,
            llm_model,
            health_timeout_secs,
            request_timeout_secs,
            templates_dir,
            frame_interval,
            log_level,
        })
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` naming the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama_host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Ollama host cannot be empty".to_string(),
            ));
        }

        if self.health_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Health timeout must be at least 1 second".to_string(),
            ));
        }
        if self.health_timeout_secs > MAX_HEALTH_TIMEOUT_SECS {
            return Err(ConfigError::ValidationFailed(format!(
                "Health timeout cannot exceed {} seconds",
                MAX_HEALTH_TIMEOUT_SECS
            )));
        }

        if let Some(timeout) = self.request_timeout_secs {
            if timeout == 0 || timeout > MAX_REQUEST_TIMEOUT_SECS {
                return Err(ConfigError::ValidationFailed(format!(
                    "Request timeout must be between 1 and {} seconds",
                    MAX_REQUEST_TIMEOUT_SECS
                )));
            }
        }

        if self.frame_interval == 0 {
            return Err(ConfigError::ValidationFailed(
                "Frame interval must be at least 1".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn recommended_models(&self) -> RecommendedModels {
        RecommendedModels {
            vision: self.vision_model.clone(),
            llm: self.llm_model.clone(),
        }
    }

    /// Builds a gateway over an [`OllamaClient`] for the configured endpoint
    pub fn create_gateway(&self) -> Result<ModelGateway, ConfigError> {
        let client = OllamaClient::with_timeouts(
            self.ollama_host.clone(),
            self.request_timeout(),
            self.health_timeout(),
        )?;

        Ok(ModelGateway::new(Arc::new(client))
            .with_health_timeout(self.health_timeout())
            .with_recommended(self.recommended_models()))
    }

    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::with_override(self.templates_dir.clone())
    }
}

impl fmt::Display for FeatureGenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "feature-gen Configuration:")?;
        writeln!(f, "  Ollama Host: {}", self.ollama_host)?;
        writeln!(f, "  Vision Model: {}", self.vision_model)?;
        writeln!(f, "  LLM Model: {}", self.llm_model)?;
        writeln!(f, "  Health Timeout: {}s", self.health_timeout_secs)?;
        match self.request_timeout_secs {
            Some(secs) => writeln!(f, "  Request Timeout: {}s", secs)?,
            None => writeln!(f, "  Request Timeout: none")?,
        }
        if let Some(ref dir) = self.templates_dir {
            writeln!(f, "  Templates Dir: {}", dir.display())?;
        }
        writeln!(f, "  Frame Interval: {}", self.frame_interval)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match non_empty_var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
    }
}

/// `OLLAMA_HOST` is often set as `host:port`; give it a scheme
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "FEATURE_GEN_OLLAMA_HOST",
        "OLLAMA_HOST",
        "FEATURE_GEN_VISION_MODEL",
        "FEATURE_GEN_LLM_MODEL",
        "FEATURE_GEN_HEALTH_TIMEOUT",
        "FEATURE_GEN_REQUEST_TIMEOUT",
        "FEATURE_GEN_TEMPLATES_DIR",
        "FEATURE_GEN_FRAME_INTERVAL",
        "FEATURE_GEN_LOG_LEVEL",
    ];

    /// Sets or clears an environment variable, restoring it on drop
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn clean_env() -> Vec<EnvGuard> {
        VARS.iter().map(|k| EnvGuard::unset(k)).collect()
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = clean_env();

        let config = FeatureGenConfig::default();

        assert_eq!(config, FeatureGenConfig::builtin());
        assert_eq!(config.ollama_host, "http://localhost:11434");
        assert_eq!(config.vision_model, "llama3.2-vision:latest");
        assert_eq!(config.llm_model, "llama3:latest");
        assert_eq!(config.health_timeout_secs, 5);
        assert_eq!(config.request_timeout_secs, None);
        assert_eq!(config.frame_interval, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _clean = clean_env();
        let _guards = vec![
            EnvGuard::set("FEATURE_GEN_OLLAMA_HOST", "http://gpu-box:11434/"),
            EnvGuard::set("FEATURE_GEN_VISION_MODEL", "llava:13b"),
            EnvGuard::set("FEATURE_GEN_LLM_MODEL", "mistral"),
            EnvGuard::set("FEATURE_GEN_HEALTH_TIMEOUT", "2"),
            EnvGuard::set("FEATURE_GEN_REQUEST_TIMEOUT", "600"),
            EnvGuard::set("FEATURE_GEN_TEMPLATES_DIR", "/srv/templates"),
            EnvGuard::set("FEATURE_GEN_FRAME_INTERVAL", "10"),
            EnvGuard::set("FEATURE_GEN_LOG_LEVEL", "DEBUG"),
        ];

        let config = FeatureGenConfig::from_env().unwrap();

        assert_eq!(config.ollama_host, "http://gpu-box:11434/");
        assert_eq!(config.vision_model, "llava:13b");
        assert_eq!(config.llm_model, "mistral");
        assert_eq!(config.health_timeout(), Duration::from_secs(2));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.templates_dir, Some(PathBuf::from("/srv/templates")));
        assert_eq!(config.frame_interval, 10);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_ollama_host_fallback_gets_scheme() {
        let _clean = clean_env();
        let _host = EnvGuard::set("OLLAMA_HOST", "0.0.0.0:11434");

        let config = FeatureGenConfig::default();
        assert_eq!(config.ollama_host, "http://0.0.0.0:11434");
    }

    #[test]
    #[serial]
    fn test_unparseable_value_is_reported() {
        let _clean = clean_env();
        let _bad = EnvGuard::set("FEATURE_GEN_FRAME_INTERVAL", "often");

        let err = FeatureGenConfig::from_env().unwrap_err();
        match err {
            ConfigError::ParseError { field, .. } => {
                assert_eq!(field, "FEATURE_GEN_FRAME_INTERVAL")
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
        assert_eq!(FeatureGenConfig::default().frame_interval, 30);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = FeatureGenConfig::builtin();
        config.health_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = FeatureGenConfig::builtin();
        config.request_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = FeatureGenConfig::builtin();
        config.request_timeout_secs = Some(7200);
        assert!(config.validate().is_err());

        let mut config = FeatureGenConfig::builtin();
        config.frame_interval = 0;
        assert!(config.validate().is_err());

        let mut config = FeatureGenConfig::builtin();
        config.ollama_host = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = FeatureGenConfig::builtin();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_create_gateway_uses_configured_models() {
        let mut config = FeatureGenConfig::builtin();
        config.vision_model = "llava:7b".to_string();

        let gateway = config.create_gateway().unwrap();
        assert_eq!(gateway.recommended_models().vision, "llava:7b");
        assert_eq!(gateway.endpoint(), "http://localhost:11434");
    }

    #[test]
    fn test_config_display() {
        let display = FeatureGenConfig::builtin().to_string();
        assert!(display.contains("feature-gen Configuration:"));
        assert!(display.contains("Request Timeout: none"));
    }
}
