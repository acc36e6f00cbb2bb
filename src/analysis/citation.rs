use crate::model::{CitationCrossReference, CitationRecord, SectionNode, UsageQuality};
use crate::tree::fold_preorder;

/// Maps each citation to the sections whose preview mentions it. Every
/// citation gets exactly one entry, in input order; citations found nowhere
/// are reported as `missing` with no section ids.
pub fn build_citation_refs(
    forest: &[SectionNode],
    citations: &[CitationRecord],
) -> Vec<CitationCrossReference> {
    citations
        .iter()
        .map(|citation| {
            let referenced_in_section_ids = match citation_needle(citation) {
                Some(needle) => matching_section_ids(forest, &needle),
                None => Vec::new(),
            };
            let usage_quality = if referenced_in_section_ids.is_empty() {
                UsageQuality::Missing
            } else {
                UsageQuality::Adequate
            };

            CitationCrossReference {
                citation_id: citation.id.clone(),
                citation_text: citation_text(citation),
                referenced_in_section_ids,
                usage_quality,
            }
        })
        .collect()
}

fn citation_needle(citation: &CitationRecord) -> Option<String> {
    non_blank(citation.title.as_deref())
        .or_else(|| non_blank(citation.content.as_deref()))
        .map(str::to_lowercase)
}

fn citation_text(citation: &CitationRecord) -> String {
    non_blank(citation.content.as_deref())
        .or_else(|| non_blank(citation.title.as_deref()))
        .unwrap_or_default()
        .to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn matching_section_ids(forest: &[SectionNode], needle: &str) -> Vec<String> {
    fold_preorder(forest, Vec::new(), |mut ids, node, _| {
        if node.content_preview.to_lowercase().contains(needle) {
            ids.push(node.id.clone());
        }
        ids
    })
}
