//! Analysis result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Category of an extracted UI fragment, in classifier priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentCategory {
    UiElements,
    Layout,
    TextContent,
    Interactions,
    StylingNotes,
    DataRequirements,
}

impl ComponentCategory {
    /// All categories, highest priority first
    pub const ALL: [ComponentCategory; 6] = [
        ComponentCategory::UiElements,
        ComponentCategory::Layout,
        ComponentCategory::TextContent,
        ComponentCategory::Interactions,
        ComponentCategory::StylingNotes,
        ComponentCategory::DataRequirements,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ComponentCategory::UiElements => "ui_elements",
            ComponentCategory::Layout => "layout",
            ComponentCategory::TextContent => "text_content",
            ComponentCategory::Interactions => "interactions",
            ComponentCategory::StylingNotes => "styling_notes",
            ComponentCategory::DataRequirements => "data_requirements",
        }
    }

    /// Heading used when the category is rendered into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            ComponentCategory::UiElements => "Ui Elements",
            ComponentCategory::Layout => "Layout",
            ComponentCategory::TextContent => "Text Content",
            ComponentCategory::Interactions => "Interactions",
            ComponentCategory::StylingNotes => "Styling Notes",
            ComponentCategory::DataRequirements => "Data Requirements",
        }
    }

    /// Lowercase substrings that switch the parser into this category
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ComponentCategory::UiElements => &["component", "element"],
            ComponentCategory::Layout => &["layout", "structure"],
            ComponentCategory::TextContent => &["text", "content"],
            ComponentCategory::Interactions => &["interaction", "action"],
            ComponentCategory::StylingNotes => &["style", "visual"],
            ComponentCategory::DataRequirements => &["data"],
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Fragments of the raw analysis bucketed by category
///
/// Each list keeps the order in which fragments appeared in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedComponents {
    pub ui_elements: Vec<String>,
    pub layout: Vec<String>,
    pub text_content: Vec<String>,
    pub interactions: Vec<String>,
    pub styling_notes: Vec<String>,
    pub data_requirements: Vec<String>,
}

impl ParsedComponents {
    pub fn get(&self, category: ComponentCategory) -> &[String] {
        match category {
            ComponentCategory::UiElements => &self.ui_elements,
            ComponentCategory::Layout => &self.layout,
            ComponentCategory::TextContent => &self.text_content,
            ComponentCategory::Interactions => &self.interactions,
            ComponentCategory::StylingNotes => &self.styling_notes,
            ComponentCategory::DataRequirements => &self.data_requirements,
        }
    }

    pub(crate) fn push(&mut self, category: ComponentCategory, item: String) {
        let list = match category {
            ComponentCategory::UiElements => &mut self.ui_elements,
            ComponentCategory::Layout => &mut self.layout,
            ComponentCategory::TextContent => &mut self.text_content,
            ComponentCategory::Interactions => &mut self.interactions,
            ComponentCategory::StylingNotes => &mut self.styling_notes,
            ComponentCategory::DataRequirements => &mut self.data_requirements,
        };
        list.push(item);
    }

    /// Categories with their fragments, in fixed category order
    pub fn iter(&self) -> impl Iterator<Item = (ComponentCategory, &[String])> + '_ {
        ComponentCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, items)| items.is_empty())
    }

    pub fn total(&self) -> usize {
        self.iter().map(|(_, items)| items.len()).sum()
    }
}

/// Outcome of analyzing one mockup image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub image_path: PathBuf,
    pub image_name: String,
    pub model_used: String,
    pub raw_analysis: String,
    pub parsed_components: ParsedComponents,
}

impl AnalysisResult {
    pub fn new(
        image_path: &Path,
        model_used: impl Into<String>,
        raw_analysis: impl Into<String>,
        parsed_components: ParsedComponents,
    ) -> Self {
        Self {
            image_path: image_path.to_path_buf(),
            image_name: display_name(image_path),
            model_used: model_used.into(),
            raw_analysis: raw_analysis.into(),
            parsed_components,
        }
    }
}

/// One slot of a batch: either an analysis or the error that replaced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Analyzed(AnalysisResult),
    Failed { image_path: PathBuf, error: String },
}

impl BatchEntry {
    pub fn is_error(&self) -> bool {
        matches!(self, BatchEntry::Failed { .. })
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            BatchEntry::Analyzed(result) => Some(result),
            BatchEntry::Failed { .. } => None,
        }
    }

    pub fn into_analysis(self) -> Option<AnalysisResult> {
        match self {
            BatchEntry::Analyzed(result) => Some(result),
            BatchEntry::Failed { .. } => None,
        }
    }

    pub fn image_path(&self) -> &Path {
        match self {
            BatchEntry::Analyzed(result) => &result.image_path,
            BatchEntry::Failed { image_path, .. } => image_path,
        }
    }
}

/// Outcome of analyzing sampled frames of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysisResult {
    pub video_path: PathBuf,
    pub video_name: String,
    /// Frames decoded from the video
    pub total_frames: usize,
    /// Frames retained and sent for analysis
    pub analyzed_frames: usize,
    pub frame_interval: usize,
    pub model_used: String,
    pub frame_analyses: Vec<BatchEntry>,
}

impl VideoAnalysisResult {
    pub fn successful(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.frame_analyses.iter().filter_map(BatchEntry::analysis)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
