//! Requirements templates
//!
//! A template is a YAML document with `name`, `description`, `sections`
//! and `tech_stack_defaults`. Lookup walks the configured directories in
//! order and then the templates compiled into the binary.

use super::error::ComposerError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("dashboard", include_str!("../../templates/dashboard.yaml")),
    (
        "mobile_app",
        include_str!("../../templates/mobile_app.yaml"),
    ),
    ("web_app", include_str!("../../templates/web_app.yaml")),
];

/// Template used when none is requested
pub const DEFAULT_TEMPLATE: &str = "web_app";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub tech_stack_defaults: Vec<String>,
}

impl TemplateConfig {
    /// Four generic sections, no tech stack
    pub fn default_structure() -> Self {
        Self {
            name: "Default Template".to_string(),
            description: "Basic requirements structure".to_string(),
            sections: vec![
                "UI Components Overview".to_string(),
                "Functional Requirements".to_string(),
                "Technical Recommendations".to_string(),
                "Implementation Guide".to_string(),
            ],
            tech_stack_defaults: Vec::new(),
        }
    }
}

/// Where a template was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "path")]
pub enum TemplateOrigin {
    File(PathBuf),
    Builtin,
}

/// Listing entry for `feature-gen templates`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSummary {
    pub key: String,
    pub name: String,
    pub description: String,
    pub origin: TemplateOrigin,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    search_dirs: Vec<PathBuf>,
}

impl TemplateStore {
    /// Store searching `search_dirs` in order, then the built-ins
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Store with the override directory (if any) followed by
    /// `<config_dir>/feature-gen/templates`
    pub fn with_override(override_dir: Option<PathBuf>) -> Self {
        let mut search_dirs: Vec<PathBuf> = override_dir.into_iter().collect();
        if let Some(config_dir) = dirs::config_dir() {
            search_dirs.push(config_dir.join("feature-gen").join("templates"));
        }
        Self::new(search_dirs)
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Loads the template named `key`
    ///
    /// Returns `Ok(None)` when no directory and no built-in provides it. A
    /// file that exists but does not parse is an error.
    pub fn load(&self, key: &str) -> Result<Option<TemplateConfig>, ComposerError> {
        if is_plain_key(key) {
            for dir in &self.search_dirs {
                if let Some(path) = template_file(dir, key) {
                    debug!("Loading template {} from {}", key, path.display());
                    return parse_file(&path).map(Some);
                }
            }
        }

        Ok(builtin(key).map(|(_, config)| config))
    }

    /// All reachable templates, sorted by key; earlier sources shadow later ones
    pub fn list(&self) -> Vec<TemplateSummary> {
        let mut seen = HashSet::new();
        let mut summaries = Vec::new();

        for dir in &self.search_dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            let mut paths: Vec<PathBuf> = entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| is_yaml(p))
                .collect();
            paths.sort();

            for path in paths {
                let Some(stem) = path.file_stem() else {
                    continue;
                };
                let key = stem.to_string_lossy().into_owned();
                if seen.contains(&key) {
                    continue;
                }
                match parse_file(&path) {
                    Ok(config) => {
                        seen.insert(key.clone());
                        summaries.push(TemplateSummary {
                            key,
                            name: config.name,
                            description: config.description,
                            origin: TemplateOrigin::File(path),
                        });
                    }
                    Err(e) => warn!("Skipping template: {}", e),
                }
            }
        }

        for (key, _) in BUILTIN_TEMPLATES {
            if seen.contains(key) {
                continue;
            }
            if let Some((_, config)) = builtin(key) {
                seen.insert(key.to_string());
                summaries.push(TemplateSummary {
                    key: key.to_string(),
                    name: config.name,
                    description: config.description,
                    origin: TemplateOrigin::Builtin,
                });
            }
        }

        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        summaries
    }
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['/', '\\']) && key != "." && key != ".."
}

fn is_yaml(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
}

fn template_file(dir: &Path, key: &str) -> Option<PathBuf> {
    ["yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", key, ext)))
        .find(|p| p.is_file())
}

fn parse_file(path: &Path) -> Result<TemplateConfig, ComposerError> {
    let content = fs::read_to_string(path).map_err(|source| ComposerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ComposerError::Template {
        path: path.to_path_buf(),
        source,
    })
}

fn builtin(key: &str) -> Option<(&'static str, TemplateConfig)> {
    let (name, content) = BUILTIN_TEMPLATES.into_iter().find(|(k, _)| *k == key)?;
    match serde_yaml::from_str(content) {
        Ok(config) => Some((name, config)),
        Err(e) => {
            warn!("Built-in template {} is invalid: {}", name, e);
            None
        }
    }
}
