/// Default instruction sent with every mockup image
///
/// The numbered headings line up with the parser's category keywords, so a
/// model that follows the outline produces text [`super::parse_components`]
/// can bucket.
pub const VISION_PROMPT: &str = "\
Analyze this UI mockup or wireframe image in detail. Extract the following information:

1. **UI Components**: List all visible UI elements (buttons, forms, navigation bars, cards, etc.)
2. **Layout Structure**: Describe the overall layout and hierarchy (header, main content, footer, sidebars, etc.)
3. **Text Content**: Extract all visible text, labels, and headings
4. **User Interactions**: Identify interactive elements and potential user actions
5. **Visual Style**: Note any styling patterns (colors, spacing, typography hints)
6. **Data Elements**: Identify areas that would need dynamic data (lists, tables, user profiles, etc.)

Provide the analysis in a structured format with clear sections.
Be specific and detailed. If this is a hand-drawn sketch, interpret it as best as possible.";
