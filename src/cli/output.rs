//! Output formatting for listings
//!
//! Renders model and template listings as JSON, YAML or a human-readable
//! table. Requirements documents are written verbatim and never pass
//! through here.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::gateway::ModelDescriptor;
use crate::requirements::{TemplateOrigin, TemplateSummary};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Listing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Json,
    Yaml,
    Human,
}

#[derive(Serialize)]
struct ModelRow<'a> {
    name: &'a str,
    size: u64,
    size_gb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_at: Option<String>,
}

pub struct OutputFormatter {
    format: ListFormat,
}

impl OutputFormatter {
    pub fn new(format: ListFormat) -> Self {
        Self { format }
    }

    /// Formats installed models
    pub fn format_models(&self, models: &[ModelDescriptor]) -> Result<String> {
        let rows: Vec<ModelRow<'_>> = models
            .iter()
            .map(|m| ModelRow {
                name: &m.name,
                size: m.size,
                size_gb: (m.size_gb() * 100.0).round() / 100.0,
                modified_at: m.modified_at.map(|t| t.to_rfc3339()),
            })
            .collect();

        match self.format {
            ListFormat::Json => {
                serde_json::to_string_pretty(&rows).context("Failed to serialize models to JSON")
            }
            ListFormat::Yaml => {
                serde_yaml::to_string(&rows).context("Failed to serialize models to YAML")
            }
            ListFormat::Human => Ok(format_models_human(models)),
        }
    }

    /// Formats the template listing
    pub fn format_templates(&self, templates: &[TemplateSummary]) -> Result<String> {
        match self.format {
            ListFormat::Json => serde_json::to_string_pretty(templates)
                .context("Failed to serialize templates to JSON"),
            ListFormat::Yaml => {
                serde_yaml::to_string(templates).context("Failed to serialize templates to YAML")
            }
            ListFormat::Human => Ok(format_templates_human(templates)),
        }
    }
}

fn format_models_human(models: &[ModelDescriptor]) -> String {
    if models.is_empty() {
        return "No models installed\n".to_string();
    }

    let width = models
        .iter()
        .map(|m| m.name.len())
        .max()
        .unwrap_or(0)
        .max("Model".len());

    let mut output = String::new();
    output.push_str("Installed Models\n");
    output.push_str(RULE);
    output.push('\n');
    output.push_str(&format!(
        "{:<width$}  {:>9}  {}\n",
        "Model",
        "Size",
        "Modified",
        width = width
    ));
    for model in models {
        let modified = model
            .modified_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "{:<width$}  {:>6.2} GB  {}\n",
            model.name,
            model.size_gb(),
            modified,
            width = width
        ));
    }
    output
}

fn format_templates_human(templates: &[TemplateSummary]) -> String {
    let mut output = String::new();
    output.push_str("Available Templates\n");
    output.push_str(RULE);
    output.push_str("\n\n");

    for (i, template) in templates.iter().enumerate() {
        let is_last = i == templates.len() - 1;
        let connector = if is_last { "\u{2514}" } else { "\u{251C}" };
        let origin = match &template.origin {
            TemplateOrigin::Builtin => "built-in".to_string(),
            TemplateOrigin::File(path) => path.display().to_string(),
        };
        output.push_str(&format!(
            "{}\u{2500} {} ({})\n",
            connector, template.key, template.name
        ));
        let gutter = if is_last { " " } else { "\u{2502}" };
        if !template.description.is_empty() {
            output.push_str(&format!("{}    {}\n", gutter, template.description));
        }
        output.push_str(&format!("{}    source: {}\n", gutter, origin));
    }
    output
}
