use crate::model::SectionNode;
use crate::tree::fold_preorder;

const COMPLIANCE_BASE: i64 = 50;
const CHAPTER_COUNT_BONUS: i64 = 20;
const ARCHETYPE_BONUS: i64 = 30;
const MIN_CHAPTERS_FOR_BONUS: usize = 3;

const INTRODUCTION_BIT: u8 = 1 << 0;
const LITERATURE_BIT: u8 = 1 << 1;
const METHODOLOGY_BIT: u8 = 1 << 2;
const RESULTS_BIT: u8 = 1 << 3;
const CONCLUSION_BIT: u8 = 1 << 4;
const ALL_ARCHETYPES: u8 =
    INTRODUCTION_BIT | LITERATURE_BIT | METHODOLOGY_BIT | RESULTS_BIT | CONCLUSION_BIT;

const CHAPTER_ARCHETYPES: &[(u8, &[&str])] = &[
    (INTRODUCTION_BIT, &["introduction"]),
    (LITERATURE_BIT, &["literature", "review"]),
    (METHODOLOGY_BIT, &["methodology", "method"]),
    (RESULTS_BIT, &["results", "findings"]),
    (CONCLUSION_BIT, &["conclusion", "discussion"]),
];

/// `avg * 0.8 + 10` over per-section quality; not a coherence measure.
pub fn evaluate_flow(forest: &[SectionNode]) -> u8 {
    let average = average_quality(forest);
    clamp_score((average * 0.8 + 10.0).round() as i64)
}

/// Compliance score: a base of 50, +20 for at least three top-level
/// chapters, +30 when every canonical chapter archetype appears among the
/// top-level chapter titles.
pub fn evaluate_compliance(forest: &[SectionNode]) -> u8 {
    let mut score = COMPLIANCE_BASE;
    if forest.len() >= MIN_CHAPTERS_FOR_BONUS {
        score += CHAPTER_COUNT_BONUS;
    }
    if chapter_archetype_mask(forest) == ALL_ARCHETYPES {
        score += ARCHETYPE_BONUS;
    }
    clamp_score(score)
}

pub fn chapter_archetype_mask(forest: &[SectionNode]) -> u8 {
    forest
        .iter()
        .filter(|node| node.kind.is_chapter())
        .fold(0u8, |mask, node| {
            let title = node.title.to_lowercase();
            CHAPTER_ARCHETYPES
                .iter()
                .filter(|(_, keywords)| keywords.iter().any(|keyword| title.contains(keyword)))
                .fold(mask, |mask, (bit, _)| mask | bit)
        })
}

pub fn average_quality(forest: &[SectionNode]) -> f64 {
    let (total, count) = fold_preorder(forest, (0u64, 0u64), |(total, count), node, _| {
        (total + u64::from(node.quality_score), count + 1)
    });
    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}

fn clamp_score(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}
