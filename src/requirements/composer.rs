use super::error::ComposerError;
use super::format::{extension_for_hint, OutputFormat};
use super::prompt::{multi_screen_prompt, refine_prompt, requirements_prompt, SYSTEM_PROMPT};
use super::template::{TemplateConfig, TemplateStore};
use crate::analyzer::{AnalysisResult, BatchEntry};
use crate::gateway::ModelGateway;
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Builds requirements documents from analyses with a text model
pub struct RequirementsComposer {
    gateway: Arc<ModelGateway>,
    templates: TemplateStore,
    progress: Arc<dyn ProgressHandler>,
}

impl RequirementsComposer {
    pub fn new(gateway: Arc<ModelGateway>, templates: TemplateStore) -> Self {
        Self {
            gateway,
            templates,
            progress: Arc::new(NoOpHandler),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Loads `name`, falling back to [`TemplateConfig::default_structure`]
    /// when no source provides it
    pub fn load_template(&self, name: &str) -> Result<TemplateConfig, ComposerError> {
        match self.templates.load(name)? {
            Some(template) => Ok(template),
            None => {
                warn!("Template {} not found, using default structure", name);
                self.progress.on_progress(&ProgressEvent::TemplateFallback {
                    name: name.to_string(),
                });
                Ok(TemplateConfig::default_structure())
            }
        }
    }

    /// Requirements for a single screen
    pub async fn build_requirements(
        &self,
        analysis: &AnalysisResult,
        template: &str,
        model: &str,
        format: OutputFormat,
    ) -> Result<String, ComposerError> {
        let template = self.load_template(template)?;
        let prompt = requirements_prompt(analysis, &template, format);
        self.generate(&prompt, model, 1).await
    }

    /// Requirements spanning every successful entry of a batch
    ///
    /// Failed entries are skipped. Fails with [`ComposerError::NoAnalyses`]
    /// when nothing succeeded.
    pub async fn build_multi_screen_requirements(
        &self,
        entries: &[BatchEntry],
        template: &str,
        model: &str,
    ) -> Result<String, ComposerError> {
        let analyses: Vec<&AnalysisResult> =
            entries.iter().filter_map(BatchEntry::analysis).collect();
        let skipped = entries.len() - analyses.len();
        if skipped > 0 {
            warn!("Skipping {} failed analyses", skipped);
        }
        if analyses.is_empty() {
            return Err(ComposerError::NoAnalyses);
        }

        // Resolved for its errors and fallback reporting only
        self.load_template(template)?;
        let prompt = multi_screen_prompt(&analyses);
        self.generate(&prompt, model, analyses.len()).await
    }

    /// Revises an existing document according to free-text feedback
    pub async fn refine_requirements(
        &self,
        requirements: &str,
        feedback: &str,
        model: &str,
    ) -> Result<String, ComposerError> {
        let start = Instant::now();
        self.progress.on_progress(&ProgressEvent::RefinementStarted {
            model: model.to_string(),
        });

        let prompt = refine_prompt(requirements, feedback);
        let refined = self
            .gateway
            .generate_text(&prompt, model, Some(SYSTEM_PROMPT))
            .await?;

        self.progress.on_progress(&ProgressEvent::RefinementComplete {
            model: model.to_string(),
            duration: start.elapsed(),
        });
        Ok(refined)
    }

    /// Writes `content` to `path`
    ///
    /// A path without an extension gets the one implied by `format_hint`.
    /// Returns the path actually written.
    pub fn save_output(
        &self,
        content: &str,
        path: &Path,
        format_hint: &str,
    ) -> Result<PathBuf, ComposerError> {
        let path = if path.extension().is_none() {
            path.with_extension(extension_for_hint(format_hint))
        } else {
            path.to_path_buf()
        };

        std::fs::write(&path, content).map_err(|source| ComposerError::Io {
            path: path.clone(),
            source,
        })?;
        info!("Requirements saved to: {}", path.display());
        self.progress
            .on_progress(&ProgressEvent::OutputSaved { path: path.clone() });
        Ok(path)
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        screens: usize,
    ) -> Result<String, ComposerError> {
        let start = Instant::now();
        self.progress.on_progress(&ProgressEvent::RequirementsStarted {
            model: model.to_string(),
            screens,
        });
        debug!(
            prompt_len = prompt.len(),
            screens,
            "Requesting requirements"
        );

        let document = self
            .gateway
            .generate_text(prompt, model, Some(SYSTEM_PROMPT))
            .await?;

        self.progress.on_progress(&ProgressEvent::RequirementsComplete {
            model: model.to_string(),
            duration: start.elapsed(),
        });
        Ok(document)
    }
}

impl std::fmt::Debug for RequirementsComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequirementsComposer")
            .field("gateway", &self.gateway)
            .field("templates", &self.templates)
            .finish()
    }
}
