//! Prompt assembly for the text model

use super::format::OutputFormat;
use super::template::TemplateConfig;
use crate::analyzer::AnalysisResult;
use std::fmt::Write as _;

/// System instruction sent with every requirements request
pub const SYSTEM_PROMPT: &str = "\
You are an expert software requirements analyst and technical writer.
Your task is to convert UI mockup analysis into clear, actionable requirements and implementation guidance.
Be specific, structured, and focus on both functional and technical aspects.";

/// Prompt for a single analyzed screen
pub fn requirements_prompt(
    analysis: &AnalysisResult,
    template: &TemplateConfig,
    format: OutputFormat,
) -> String {
    let format = format.prompt_name();
    let mut prompt = format!(
        "Convert this UI mockup analysis into structured {format} requirements.\n\n\
         **Image Analyzed**: {}\n\n\
         **Vision Analysis**:\n{}\n\n\
         **Extracted Components**:\n",
        analysis.image_name, analysis.raw_analysis
    );

    for (category, items) in analysis.parsed_components.iter() {
        if items.is_empty() {
            continue;
        }
        let _ = write!(prompt, "\n{}:\n", category.label());
        for item in items {
            let _ = writeln!(prompt, "- {}", item);
        }
    }

    push_output_structure(&mut prompt, template);

    let _ = write!(
        prompt,
        "\n\nGenerate clear, actionable requirements that a developer can use to implement this UI.\n\
         Include specific details about:\n\
         1. What components need to be built\n\
         2. How they should behave\n\
         3. What data they need\n\
         4. Any important UX considerations\n\n\
         Format the output as well-structured {format}."
    );
    prompt
}

/// Prompt covering several screens, numbered from 1; always markdown
///
/// The structure is fixed: templates only shape single-screen prompts.
pub fn multi_screen_prompt(analyses: &[&AnalysisResult]) -> String {
    let mut prompt = format!(
        "Convert these {} UI mockup analyses into comprehensive requirements for a multi-screen application.\n\n\
         **Screens Analyzed**:\n",
        analyses.len()
    );

    for (idx, analysis) in analyses.iter().enumerate() {
        let _ = write!(
            prompt,
            "\n### Screen {}: {}\n{}\n",
            idx + 1,
            analysis.image_name,
            analysis.raw_analysis
        );
    }

    prompt.push_str(
        "\n\nPlease generate comprehensive requirements that:\n\
         1. Cover all screens and their relationships\n\
         2. Identify shared components and patterns\n\
         3. Define navigation and user flows\n\
         4. Specify data requirements across screens\n\
         5. Suggest overall architecture and tech stack\n\n\
         Format as well-structured markdown with clear sections.",
    );
    prompt
}

/// Prompt asking the model to revise `requirements` according to `feedback`
pub fn refine_prompt(requirements: &str, feedback: &str) -> String {
    format!(
        "Here are the current requirements:\n\n{requirements}\n\n\
         The user has provided this feedback:\n{feedback}\n\n\
         Please update the requirements to incorporate this feedback. \
         Maintain the same structure and format."
    )
}

fn push_output_structure(prompt: &mut String, template: &TemplateConfig) {
    let _ = write!(
        prompt,
        "\n\n**Output Structure** (use {} format):\n\
         Please organize the requirements into these sections:\n",
        template.name
    );
    for section in &template.sections {
        let _ = writeln!(prompt, "- {}", section);
    }

    if !template.tech_stack_defaults.is_empty() {
        prompt.push_str("\n**Recommended Tech Stack**:\n");
        for tech in &template.tech_stack_defaults {
            let _ = writeln!(prompt, "- {}", tech);
        }
    }
}
