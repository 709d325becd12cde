//! Heuristic classifier for free-text vision output
//!
//! Walks the text line by line with a "current category" pointer. A line
//! whose lowercase form contains a category keyword moves the pointer
//! (first matching category in [`ComponentCategory::ALL`] wins). Otherwise,
//! a bulleted line is stripped of its marker and appended to the current
//! category. Everything else is ignored.

use super::types::{ComponentCategory, ParsedComponents};

/// Characters accepted as list markers
const BULLETS: [char; 4] = ['-', '•', '*', '–'];

/// Returns the highest-priority category whose keyword appears in `line`
pub fn classify_header(line: &str) -> Option<ComponentCategory> {
    let lower = line.to_lowercase();
    ComponentCategory::ALL
        .into_iter()
        .find(|category| category.keywords().iter().any(|kw| lower.contains(kw)))
}

/// Buckets bulleted lines of `analysis_text` under the nearest header
pub fn parse_components(analysis_text: &str) -> ParsedComponents {
    let mut components = ParsedComponents::default();
    let mut current: Option<ComponentCategory> = None;

    for line in analysis_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(category) = classify_header(line) {
            current = Some(category);
            continue;
        }

        if let Some(category) = current {
            if line.starts_with(BULLETS) {
                let item = line
                    .trim_start_matches(|c: char| BULLETS.contains(&c) || c == ' ')
                    .trim();
                if !item.is_empty() {
                    components.push(category, item.to_string());
                }
            }
        }
    }

    components
}
