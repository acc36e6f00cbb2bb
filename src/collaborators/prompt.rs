use std::fmt::Write as _;

use crate::model::SectionNode;
use crate::similarity::excerpt;
use crate::tree::preorder;

const STRUCTURE_INSTRUCTION: &str = "\
Analyze the following thesis document content and identify its structure.

1. Identify chapters and sections with their hierarchy
2. Assess the academic quality of each section (0-100)
3. Count the words in each section

Return the structure as a Markdown outline: one heading per section, with
`#` for chapters, `##` for sections and `###` for subsections. Write each
heading as `Title: short description`. Under a heading you may add the lines
`Quality: <0-100>`, `Word count: <n>` and `Status: not_started|in_progress|complete`.
Alternatively return a JSON array of sections with the fields id, type, title,
content_preview, word_count, quality_score, status and children.";

const ADVISOR_INSTRUCTION: &str = "\
You are an expert academic writing advisor. Analyze the following thesis
structure and provide specific optimization suggestions.";

const ADVISOR_FORMAT: &str = "\
Based on this analysis, provide 3-5 specific, actionable recommendations that address:
1. Structural improvements for better academic flow and logic
2. Compliance with university/academic standards
3. Content organization and completeness
4. Missing sections or components that should be added
5. Cross-referencing and linking between sections

Format each recommendation as:
- ID: [unique identifier]
- Type: [reorganization|content_placement|flow_improvement|compliance|cross_reference]
- Title: [brief recommendation title]
- Description: [detailed explanation of the issue]
- Suggested Changes: [action -> target section id: content]
- Priority: [high|medium|low]
- Confidence Score: [0-100]
- Estimated Time: [in minutes]
- Effectiveness Estimate: [0-100]

Be specific and actionable, referring to actual section ids in the structure.";

pub fn build_structure_prompt(document_text: &str, excerpt_chars: usize) -> String {
    format!(
        "{STRUCTURE_INSTRUCTION}\n\nDocument content:\n{}",
        excerpt(document_text, excerpt_chars)
    )
}

/// Indented listing of the forest, two spaces per level, one block per node.
pub fn format_structure(forest: &[SectionNode], preview_chars: usize) -> String {
    let mut formatted = String::new();
    for (depth, node) in preorder(forest) {
        let indent = "  ".repeat(depth);
        let _ = writeln!(
            formatted,
            "{indent}{}: {}",
            node.kind.label().to_uppercase(),
            node.title
        );
        let _ = writeln!(formatted, "{indent}  ID: {}", node.id);
        let _ = writeln!(
            formatted,
            "{indent}  Content Preview: {}",
            excerpt(&node.content_preview, preview_chars)
        );
        let _ = writeln!(formatted, "{indent}  Quality: {}/100", node.quality_score);
        let _ = writeln!(formatted, "{indent}  Status: {}", node.status.as_str());
        let _ = writeln!(formatted, "{indent}  Word Count: {}", node.word_count);
    }
    formatted
}

pub fn build_advisor_prompt(
    forest: &[SectionNode],
    flow_score: u8,
    compliance_score: u8,
    document_text: &str,
    excerpt_chars: usize,
    preview_chars: usize,
) -> String {
    format!(
        "{ADVISOR_INSTRUCTION}\n\nCurrent Structure:\n{}\nScores:\n- Flow Score: {flow_score}/100\n- Compliance Score: {compliance_score}/100\n\nContent Preview:\n{}\n\n{ADVISOR_FORMAT}",
        format_structure(forest, preview_chars),
        excerpt(document_text, excerpt_chars)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SectionKind, SectionStatus};

    #[test]
    fn structure_prompt_includes_only_the_excerpt() {
        let text = format!("{}{}", "a".repeat(10), "b".repeat(10));
        let prompt = build_structure_prompt(&text, 10);
        assert!(prompt.ends_with(&"a".repeat(10)));
        assert!(!prompt.contains('b'));
    }

    #[test]
    fn structure_listing_is_indented_by_depth() {
        let forest = vec![
            SectionNode::new("ch1", SectionKind::CHAPTER, "Introduction")
                .with_preview("This chapter introduces the study and its motivation.")
                .with_word_count(1200)
                .with_quality(88)
                .with_status(SectionStatus::InProgress)
                .with_children(vec![SectionNode::new(
                    "ch1-1",
                    SectionKind::SECTION,
                    "Background",
                )]),
        ];

        let listing = format_structure(&forest, 12);
        let lines = listing.lines().collect::<Vec<&str>>();
        assert_eq!(lines[0], "CHAPTER: Introduction");
        assert_eq!(lines[1], "  ID: ch1");
        assert_eq!(lines[2], "  Content Preview: This chapter");
        assert_eq!(lines[3], "  Quality: 88/100");
        assert_eq!(lines[4], "  Status: in_progress");
        assert_eq!(lines[5], "  Word Count: 1200");
        assert_eq!(lines[6], "  SECTION: Background");
        assert_eq!(lines[7], "    ID: ch1-1");
    }

    #[test]
    fn advisor_prompt_carries_scores_and_excerpt() {
        let forest = vec![SectionNode::new("ch1", SectionKind::CHAPTER, "Introduction")];
        let prompt = build_advisor_prompt(&forest, 64, 70, "Thesis body text", 6, 100);
        assert!(prompt.contains("- Flow Score: 64/100"));
        assert!(prompt.contains("- Compliance Score: 70/100"));
        assert!(prompt.contains("Content Preview:\nThesis\n"));
        assert!(prompt.contains("CHAPTER: Introduction"));
    }
}
