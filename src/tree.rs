use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::InputValidationError;
use crate::model::{SectionKind, SectionNode, SectionStatus};

pub const DEFAULT_QUALITY_SCORE: u8 = 70;

pub struct Preorder<'a> {
    stack: Vec<(usize, &'a SectionNode)>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = (usize, &'a SectionNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}

pub fn preorder(forest: &[SectionNode]) -> Preorder<'_> {
    Preorder {
        stack: forest.iter().rev().map(|node| (0, node)).collect(),
    }
}

pub fn fold_preorder<'a, A, F>(forest: &'a [SectionNode], init: A, mut step: F) -> A
where
    F: FnMut(A, &'a SectionNode, usize) -> A,
{
    preorder(forest).fold(init, |acc, (depth, node)| step(acc, node, depth))
}

pub fn flatten(forest: &[SectionNode]) -> Vec<&SectionNode> {
    fold_preorder(forest, Vec::new(), |mut acc, node, _| {
        acc.push(node);
        acc
    })
}

pub fn count_nodes(forest: &[SectionNode]) -> usize {
    preorder(forest).count()
}

pub fn all_titles(forest: &[SectionNode]) -> Vec<&str> {
    fold_preorder(forest, Vec::new(), |mut acc, node, _| {
        acc.push(node.title.as_str());
        acc
    })
}

// Integer fields are wide and signed so out-of-range values surface as
// validation errors rather than serde failures.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SectionNodeInput {
    pub id: String,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "contentPreview")]
    pub content_preview: String,
    #[serde(default, alias = "wordCount")]
    pub word_count: i64,
    #[serde(default, alias = "academicScore")]
    pub quality_score: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub children: Vec<SectionNodeInput>,
}

/// Missing kinds are inferred from nesting depth.
pub fn ingest_forest(
    inputs: &[SectionNodeInput],
    max_sections: usize,
) -> Result<Vec<SectionNode>, InputValidationError> {
    let forest = inputs
        .iter()
        .map(|input| convert_node(input, None))
        .collect::<Result<Vec<_>, _>>()?;
    validate_forest(&forest, max_sections)?;
    Ok(forest)
}

fn convert_node(
    input: &SectionNodeInput,
    parent: Option<SectionKind>,
) -> Result<SectionNode, InputValidationError> {
    let id = input.id.trim().to_string();
    if id.is_empty() {
        return Err(InputValidationError::EmptyId {
            title: input.title.clone(),
        });
    }

    let kind = match input.kind.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => SectionKind::parse(raw).ok_or_else(|| InputValidationError::InvalidKind {
            id: id.clone(),
            kind: raw.to_string(),
        })?,
        None => parent
            .map(|value| SectionKind::from_rank(value.rank() + 1))
            .unwrap_or(SectionKind::CHAPTER),
    };

    let status = match input.status.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => SectionStatus::parse(raw).ok_or_else(|| InputValidationError::InvalidStatus {
            id: id.clone(),
            status: raw.to_string(),
        })?,
        None => SectionStatus::NotStarted,
    };

    if input.word_count < 0 {
        return Err(InputValidationError::NegativeWordCount {
            id,
            word_count: input.word_count,
        });
    }
    let Ok(word_count) = u32::try_from(input.word_count) else {
        return Err(InputValidationError::WordCountTooLarge {
            id,
            word_count: input.word_count,
            max: u32::MAX,
        });
    };

    let quality_score = match input.quality_score {
        Some(score) if (0..=100).contains(&score) => score as u8,
        Some(score) => return Err(InputValidationError::ScoreOutOfRange { id, score }),
        None => DEFAULT_QUALITY_SCORE,
    };

    let children = input
        .children
        .iter()
        .map(|child| convert_node(child, Some(kind)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SectionNode {
        id,
        kind,
        title: input.title.trim().to_string(),
        content_preview: input.content_preview.clone(),
        word_count,
        quality_score,
        status,
        children,
    })
}

pub fn validate_forest(
    forest: &[SectionNode],
    max_sections: usize,
) -> Result<(), InputValidationError> {
    let count = count_nodes(forest);
    if count > max_sections {
        return Err(InputValidationError::TooManySections {
            count,
            max: max_sections,
        });
    }

    let mut seen = HashSet::<&str>::with_capacity(count);
    validate_siblings(forest, None, &mut seen)
}

fn validate_siblings<'a>(
    siblings: &'a [SectionNode],
    parent: Option<&'a SectionNode>,
    seen: &mut HashSet<&'a str>,
) -> Result<(), InputValidationError> {
    let expected_rank = siblings.first().map(|node| node.kind.rank());

    for node in siblings {
        if node.id.trim().is_empty() {
            return Err(InputValidationError::EmptyId {
                title: node.title.clone(),
            });
        }
        if !seen.insert(node.id.as_str()) {
            return Err(InputValidationError::DuplicateId {
                id: node.id.clone(),
            });
        }
        if node.quality_score > 100 {
            return Err(InputValidationError::ScoreOutOfRange {
                id: node.id.clone(),
                score: i64::from(node.quality_score),
            });
        }

        let rank = node.kind.rank();
        if let Some(expected) = expected_rank.filter(|expected| *expected != rank) {
            return Err(InputValidationError::SiblingRankMismatch {
                id: node.id.clone(),
                rank,
                expected,
            });
        }
        if let Some(parent) = parent.filter(|parent| rank <= parent.kind.rank()) {
            return Err(InputValidationError::RankOrder {
                id: node.id.clone(),
                rank,
                parent_id: parent.id.clone(),
                parent_rank: parent.kind.rank(),
            });
        }

        validate_siblings(&node.children, Some(node), seen)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_forest() -> Vec<SectionNode> {
        vec![
            SectionNode::new("ch1", SectionKind::CHAPTER, "Introduction").with_children(vec![
                SectionNode::new("ch1-1", SectionKind::SECTION, "Background").with_children(vec![
                    SectionNode::new("ch1-1-1", SectionKind::SUBSECTION, "Context"),
                ]),
                SectionNode::new("ch1-2", SectionKind::SECTION, "Objectives"),
            ]),
            SectionNode::new("ch2", SectionKind::CHAPTER, "Literature Review"),
        ]
    }

    #[test]
    fn preorder_visits_parents_before_children_in_sibling_order() {
        let forest = sample_forest();
        let visited = preorder(&forest)
            .map(|(depth, node)| (depth, node.id.as_str()))
            .collect::<Vec<_>>();

        assert_eq!(
            visited,
            vec![
                (0, "ch1"),
                (1, "ch1-1"),
                (2, "ch1-1-1"),
                (1, "ch1-2"),
                (0, "ch2"),
            ]
        );
    }

    #[test]
    fn fold_preorder_accumulates_across_all_depths() {
        let forest = sample_forest();
        let deepest = fold_preorder(&forest, 0usize, |acc, _, depth| acc.max(depth));
        assert_eq!(deepest, 2);
        assert_eq!(count_nodes(&forest), 5);
        assert_eq!(all_titles(&forest)[2], "Context");
    }

    #[test]
    fn ingest_infers_missing_kinds_from_depth() {
        let inputs: Vec<SectionNodeInput> = serde_json::from_value(serde_json::json!([
            {
                "id": "ch1",
                "title": "Introduction",
                "wordCount": 1200,
                "academicScore": 92,
                "status": "complete",
                "children": [{ "id": "ch1-1", "title": "Background" }]
            }
        ]))
        .expect("input should deserialize");

        let forest = ingest_forest(&inputs, 500).expect("input should validate");
        assert_eq!(forest[0].kind, SectionKind::CHAPTER);
        assert_eq!(forest[0].status, SectionStatus::Complete);
        assert_eq!(forest[0].quality_score, 92);
        assert_eq!(forest[0].children[0].kind, SectionKind::SECTION);
        assert_eq!(forest[0].children[0].quality_score, DEFAULT_QUALITY_SCORE);
    }

    #[test]
    fn ingest_rejects_negative_word_count() {
        let inputs = vec![SectionNodeInput {
            id: "ch1".to_string(),
            title: "Introduction".to_string(),
            word_count: -5,
            ..SectionNodeInput::default()
        }];

        let error = ingest_forest(&inputs, 500).expect_err("negative count should fail");
        assert!(matches!(
            error,
            InputValidationError::NegativeWordCount { word_count: -5, .. }
        ));
    }

    #[test]
    fn ingest_rejects_word_count_beyond_u32() {
        let inputs = vec![SectionNodeInput {
            id: "ch1".to_string(),
            title: "Introduction".to_string(),
            word_count: i64::from(u32::MAX) + 1,
            ..SectionNodeInput::default()
        }];

        let error = ingest_forest(&inputs, 500).expect_err("oversized count should fail");
        assert_eq!(
            error,
            InputValidationError::WordCountTooLarge {
                id: "ch1".to_string(),
                word_count: i64::from(u32::MAX) + 1,
                max: u32::MAX
            }
        );
    }

    #[test]
    fn ingest_rejects_out_of_range_score() {
        let inputs = vec![SectionNodeInput {
            id: "ch1".to_string(),
            quality_score: Some(140),
            ..SectionNodeInput::default()
        }];

        let error = ingest_forest(&inputs, 500).expect_err("score above 100 should fail");
        assert_eq!(
            error,
            InputValidationError::ScoreOutOfRange {
                id: "ch1".to_string(),
                score: 140
            }
        );
    }

    #[test]
    fn validate_rejects_repeated_ids() {
        let forest = vec![
            SectionNode::new("ch1", SectionKind::CHAPTER, "Introduction")
                .with_children(vec![SectionNode::new("ch1", SectionKind::SECTION, "Loop")]),
        ];

        let error = validate_forest(&forest, 500).expect_err("repeated id should fail");
        assert_eq!(
            error,
            InputValidationError::DuplicateId {
                id: "ch1".to_string()
            }
        );
    }

    #[test]
    fn validate_rejects_child_ranked_at_parent_level() {
        let forest = vec![
            SectionNode::new("ch1", SectionKind::CHAPTER, "Introduction")
                .with_children(vec![SectionNode::new("ch1-1", SectionKind::CHAPTER, "Nested")]),
        ];

        let error = validate_forest(&forest, 500).expect_err("rank order should fail");
        assert!(matches!(error, InputValidationError::RankOrder { .. }));
    }

    #[test]
    fn validate_rejects_mixed_sibling_ranks() {
        let forest = vec![
            SectionNode::new("ch1", SectionKind::CHAPTER, "Introduction"),
            SectionNode::new("s1", SectionKind::SECTION, "Stray section"),
        ];

        let error = validate_forest(&forest, 500).expect_err("sibling ranks should match");
        assert!(matches!(
            error,
            InputValidationError::SiblingRankMismatch { expected: 0, .. }
        ));
    }

    #[test]
    fn validate_enforces_section_limit() {
        let forest = sample_forest();
        let error = validate_forest(&forest, 4).expect_err("limit should apply");
        assert_eq!(
            error,
            InputValidationError::TooManySections { count: 5, max: 4 }
        );
        assert!(validate_forest(&forest, 5).is_ok());
    }
}
