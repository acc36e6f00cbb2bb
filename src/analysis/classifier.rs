use crate::model::{Classification, RelationType, SectionNode};
use crate::similarity::similarity;

pub const RELATED_CONTENT_THRESHOLD: f64 = 0.6;
const RELATED_CONTENT_STRENGTH_SCALE: f64 = 80.0;

const METHODOLOGY: &[&str] = &["methodology", "method"];
const LITERATURE: &[&str] = &["literature", "review"];
const RESULTS: &[&str] = &["results", "findings"];
const RESEARCH_QUESTIONS: &[&str] = &["research question", "objective"];
const GAP: &[&str] = &["gap"];
const PROBLEM_STATEMENT: &[&str] = &["problem", "statement"];

#[derive(Debug, Clone, Copy)]
pub enum Keywords {
    AnyOf(&'static [&'static str]),
    /// Matches when any keyword of the first list occurs, or every keyword
    /// of the second list occurs.
    AnyOfOrAllOf(&'static [&'static str], &'static [&'static str]),
}

impl Keywords {
    pub fn matches(self, title: &str) -> bool {
        match self {
            Self::AnyOf(any) => any.iter().any(|keyword| title.contains(keyword)),
            Self::AnyOfOrAllOf(any, all) => {
                any.iter().any(|keyword| title.contains(keyword))
                    || all.iter().all(|keyword| title.contains(keyword))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TitleRule {
    pub source: Keywords,
    pub target: Keywords,
    pub relation_type: RelationType,
    pub strength: u8,
    pub description: &'static str,
}

/// Evaluated top to bottom; the first rule whose source and target keywords
/// both match the lower-cased titles decides the relation.
pub const TITLE_RULES: &[TitleRule] = &[
    TitleRule {
        source: Keywords::AnyOf(METHODOLOGY),
        target: Keywords::AnyOf(RESEARCH_QUESTIONS),
        relation_type: RelationType::Addresses,
        strength: 95,
        description: "Methodology addresses the research questions/objectives",
    },
    TitleRule {
        source: Keywords::AnyOf(METHODOLOGY),
        target: Keywords::AnyOf(LITERATURE),
        relation_type: RelationType::BuildsOn,
        strength: 80,
        description: "Methodology builds on literature review",
    },
    TitleRule {
        source: Keywords::AnyOf(LITERATURE),
        target: Keywords::AnyOfOrAllOf(GAP, PROBLEM_STATEMENT),
        relation_type: RelationType::IdentifiesGapFor,
        strength: 85,
        description: "Literature review identifies research gap addressed by the study",
    },
    TitleRule {
        source: Keywords::AnyOf(LITERATURE),
        target: Keywords::AnyOf(METHODOLOGY),
        relation_type: RelationType::Informs,
        strength: 88,
        description: "Literature review informs the chosen methodology",
    },
    TitleRule {
        source: Keywords::AnyOf(RESULTS),
        target: Keywords::AnyOf(LITERATURE),
        relation_type: RelationType::SupportsOrContrasts,
        strength: 90,
        description: "Results either support or contrast with literature findings",
    },
    TitleRule {
        source: Keywords::AnyOf(RESULTS),
        target: Keywords::AnyOf(&["hypothesis"]),
        relation_type: RelationType::ValidatesOrRefutes,
        strength: 85,
        description: "Results validate or refute earlier hypotheses",
    },
    TitleRule {
        source: Keywords::AnyOf(&["discussion"]),
        target: Keywords::AnyOf(RESULTS),
        relation_type: RelationType::Interprets,
        strength: 95,
        description: "Discussion interprets the results and findings",
    },
    TitleRule {
        source: Keywords::AnyOf(&["discussion"]),
        target: Keywords::AnyOf(LITERATURE),
        relation_type: RelationType::ConnectsTo,
        strength: 80,
        description: "Discussion connects results to existing literature",
    },
    TitleRule {
        source: Keywords::AnyOf(&["conclusion"]),
        target: Keywords::AnyOf(RESEARCH_QUESTIONS),
        relation_type: RelationType::Addresses,
        strength: 90,
        description: "Conclusion addresses whether research questions/objectives were met",
    },
    TitleRule {
        source: Keywords::AnyOf(&["conclusion"]),
        target: Keywords::AnyOf(RESULTS),
        relation_type: RelationType::Summarizes,
        strength: 95,
        description: "Conclusion summarizes results and findings",
    },
    TitleRule {
        source: Keywords::AnyOf(&["introduction"]),
        target: Keywords::AnyOf(RESEARCH_QUESTIONS),
        relation_type: RelationType::Establishes,
        strength: 95,
        description: "Introduction establishes the research questions/objectives",
    },
    TitleRule {
        source: Keywords::AnyOf(&["introduction"]),
        target: Keywords::AnyOf(&["significance"]),
        relation_type: RelationType::EstablishesSignificance,
        strength: 85,
        description: "Introduction establishes the significance of the study",
    },
];

/// Decides how `source` relates to `target`. The result is directional:
/// swapping the arguments generally yields a different classification.
pub fn classify(source: &SectionNode, target: &SectionNode) -> Classification {
    let source_title = source.title.to_lowercase();
    let target_title = target.title.to_lowercase();

    if let Some(rule) = match_title_rule(&source_title, &target_title) {
        return Classification {
            relation_type: rule.relation_type,
            strength: rule.strength,
            description: rule.description.to_string(),
        };
    }

    let content_similarity = similarity(&source.content_preview, &target.content_preview);
    if content_similarity >= RELATED_CONTENT_THRESHOLD {
        let strength = (content_similarity * RELATED_CONTENT_STRENGTH_SCALE).floor() as u8;
        return Classification {
            relation_type: RelationType::RelatedTo,
            strength,
            description: "Sections have related content/themes".to_string(),
        };
    }

    Classification::none()
}

pub fn match_title_rule(source_title: &str, target_title: &str) -> Option<&'static TitleRule> {
    TITLE_RULES
        .iter()
        .find(|rule| rule.source.matches(source_title) && rule.target.matches(target_title))
}
