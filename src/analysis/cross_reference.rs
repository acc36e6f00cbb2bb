use tracing::{debug, warn};

use super::classifier::classify;
use crate::model::{RelationshipEdge, SectionNode};
use crate::tree::flatten;

pub const DEFAULT_MAX_CROSS_REFERENCE_SECTIONS: usize = 500;

/// Classifies every ordered pair of distinct sections and keeps the edges
/// that carry a relation. Edges are ordered by source, then target, in
/// pre-order.
pub fn build_cross_references(forest: &[SectionNode]) -> Vec<RelationshipEdge> {
    let sections = flatten(forest);
    if sections.len() > DEFAULT_MAX_CROSS_REFERENCE_SECTIONS {
        warn!(
            section_count = sections.len(),
            max_sections = DEFAULT_MAX_CROSS_REFERENCE_SECTIONS,
            "cross-reference build is quadratic in section count; input exceeds recommended size"
        );
    }

    let mut edges = Vec::new();
    for (source_index, source) in sections.iter().enumerate() {
        for (target_index, target) in sections.iter().enumerate() {
            if source_index == target_index {
                continue;
            }

            let classification = classify(source, target);
            if classification.relation_type.is_none() {
                continue;
            }

            edges.push(RelationshipEdge {
                source_id: source.id.clone(),
                target_id: target.id.clone(),
                relation_type: classification.relation_type,
                strength: classification.strength,
                description: classification.description,
            });
        }
    }

    debug!(
        section_count = sections.len(),
        edge_count = edges.len(),
        "cross-references built"
    );

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RelationType, SectionKind};

    fn thesis() -> Vec<SectionNode> {
        vec![
            SectionNode::new("ch1", SectionKind::CHAPTER, "Introduction").with_children(vec![
                SectionNode::new("ch1-1", SectionKind::SECTION, "Research Objectives"),
            ]),
            SectionNode::new("ch2", SectionKind::CHAPTER, "Literature Review"),
            SectionNode::new("ch3", SectionKind::CHAPTER, "Methodology"),
            SectionNode::new("ch4", SectionKind::CHAPTER, "Results"),
            SectionNode::new("ch5", SectionKind::CHAPTER, "Discussion"),
        ]
    }

    #[test]
    fn graph_never_contains_none_edges() {
        let edges = build_cross_references(&thesis());
        assert!(!edges.is_empty());
        assert!(
            edges
                .iter()
                .all(|edge| edge.relation_type != RelationType::None)
        );
        assert!(edges.iter().all(|edge| edge.source_id != edge.target_id));
    }

    #[test]
    fn nested_sections_participate_in_the_graph() {
        let edges = build_cross_references(&thesis());
        let methodology_to_objectives = edges
            .iter()
            .find(|edge| edge.source_id == "ch3" && edge.target_id == "ch1-1")
            .expect("methodology should address objectives");
        assert_eq!(methodology_to_objectives.relation_type, RelationType::Addresses);
    }

    #[test]
    fn both_directions_are_kept_with_distinct_types() {
        let edges = build_cross_references(&thesis());
        let forward = edges
            .iter()
            .find(|edge| edge.source_id == "ch3" && edge.target_id == "ch2")
            .expect("methodology -> literature edge");
        let backward = edges
            .iter()
            .find(|edge| edge.source_id == "ch2" && edge.target_id == "ch3")
            .expect("literature -> methodology edge");
        assert_eq!(forward.relation_type, RelationType::BuildsOn);
        assert_eq!(backward.relation_type, RelationType::Informs);
    }

    #[test]
    fn rebuilding_yields_identical_graph() {
        let forest = thesis();
        assert_eq!(build_cross_references(&forest), build_cross_references(&forest));
    }

    #[test]
    fn empty_forest_has_no_edges() {
        assert!(build_cross_references(&[]).is_empty());
    }
}
