//! Requirements composer
//!
//! Assembles prompts from analyses and templates, asks the text model for
//! the document and persists the result.

mod composer;
mod error;
mod format;
mod prompt;
mod template;

pub use composer::RequirementsComposer;
pub use error::ComposerError;
pub use format::{extension_for_hint, OutputFormat};
pub use prompt::{multi_screen_prompt, refine_prompt, requirements_prompt, SYSTEM_PROMPT};
pub use template::{
    TemplateConfig, TemplateOrigin, TemplateStore, TemplateSummary, DEFAULT_TEMPLATE,
};
