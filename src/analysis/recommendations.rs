use std::collections::HashSet;

use tracing::{debug, warn};

use crate::model::{
    ChangeAction, Priority, Recommendation, RecommendationSource, RecommendationType, SectionNode,
    SuggestedChange,
};
use crate::tree::{all_titles, preorder};

pub const FLOW_THRESHOLD: u8 = 70;
pub const COMPLIANCE_THRESHOLD: u8 = 80;
pub const MIN_CHAPTER_WORDS: u32 = 500;
pub const QUALITY_THRESHOLD: u8 = 70;
pub const LOW_QUALITY_THRESHOLD: u8 = 60;

pub const TARGET_ALL_SECTIONS: &str = "all_sections";
pub const TARGET_DOCUMENT_ROOT: &str = "document_root";
pub const TARGET_BEFORE_FIRST_CHAPTER: &str = "before_first_chapter";
pub const TARGET_AFTER_INTRODUCTION: &str = "after_introduction";

/// Returns the assistant's suggestions when at least one of them is usable,
/// otherwise the deterministic local recommendations.
pub fn generate_recommendations(
    forest: &[SectionNode],
    flow_score: u8,
    compliance_score: u8,
    ai_suggestions: Option<&[Recommendation]>,
) -> Vec<Recommendation> {
    generate_recommendations_with_source(forest, flow_score, compliance_score, ai_suggestions).0
}

pub fn generate_recommendations_with_source(
    forest: &[SectionNode],
    flow_score: u8,
    compliance_score: u8,
    ai_suggestions: Option<&[Recommendation]>,
) -> (Vec<Recommendation>, RecommendationSource) {
    if let Some(suggestions) = ai_suggestions {
        let accepted = accept_suggestions(suggestions);
        if !accepted.is_empty() {
            debug!(
                offered = suggestions.len(),
                accepted = accepted.len(),
                "using assistant recommendations"
            );
            return (accepted, RecommendationSource::Assistant);
        }
        warn!(
            offered = suggestions.len(),
            "no usable assistant recommendations; using local fallback"
        );
    }

    (
        generate_local_recommendations(forest, flow_score, compliance_score),
        RecommendationSource::LocalFallback,
    )
}

/// Keeps the suggestions that pass [`check_suggestion`], renaming repeated
/// ids with a numeric suffix.
pub fn accept_suggestions(suggestions: &[Recommendation]) -> Vec<Recommendation> {
    let mut seen_ids = HashSet::<String>::new();
    let mut accepted = Vec::with_capacity(suggestions.len());

    for suggestion in suggestions {
        if let Err(reason) = check_suggestion(suggestion) {
            warn!(id = %suggestion.id, reason = %reason, "dropping assistant recommendation");
            continue;
        }

        let mut suggestion = suggestion.clone();
        let base_id = suggestion.id.trim().to_string();
        let mut candidate = base_id.clone();
        let mut suffix = 2;
        while seen_ids.contains(&candidate) {
            candidate = format!("{base_id}-{suffix}");
            suffix += 1;
        }
        seen_ids.insert(candidate.clone());
        suggestion.id = candidate;
        accepted.push(suggestion);
    }

    accepted
}

pub fn check_suggestion(suggestion: &Recommendation) -> Result<(), String> {
    if suggestion.id.trim().is_empty() {
        return Err("missing id".to_string());
    }
    if suggestion.title.trim().is_empty() {
        return Err("missing title".to_string());
    }
    if suggestion.suggested_changes.is_empty() {
        return Err("no suggested changes".to_string());
    }
    if let Some(change) = suggestion
        .suggested_changes
        .iter()
        .find(|change| change.target_location.trim().is_empty() || change.content.trim().is_empty())
    {
        return Err(format!(
            "suggested change {} lacks a target location or content",
            change.action.as_str()
        ));
    }
    if suggestion.confidence_score > 100 || suggestion.effectiveness_estimate > 100 {
        return Err("score outside 0..=100".to_string());
    }
    if suggestion.estimated_time_minutes == 0 {
        return Err("estimated time must be positive".to_string());
    }
    Ok(())
}

/// Deterministic recommendations derived from the scores and the tree. All
/// rules apply independently, so one tree can trigger many of them.
pub fn generate_local_recommendations(
    forest: &[SectionNode],
    flow_score: u8,
    compliance_score: u8,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if flow_score < FLOW_THRESHOLD {
        recommendations.push(flow_recommendation());
    }
    if compliance_score < COMPLIANCE_THRESHOLD {
        recommendations.push(compliance_recommendation());
    }

    for (_, node) in preorder(forest) {
        if node.kind.is_chapter() && node.word_count < MIN_CHAPTER_WORDS {
            recommendations.push(expansion_recommendation(node));
        }
        if node.quality_score < QUALITY_THRESHOLD {
            recommendations.push(quality_recommendation(node));
        }
    }

    let titles = all_titles(forest)
        .into_iter()
        .map(str::to_lowercase)
        .collect::<Vec<String>>();
    let has_introduction = titles.iter().any(|title| title.contains("introduction"));
    let has_literature = titles
        .iter()
        .any(|title| title.contains("literature") || title.contains("review"));

    if !has_introduction {
        recommendations.push(missing_introduction_recommendation());
    }
    if !has_literature {
        recommendations.push(missing_literature_recommendation());
    }

    recommendations
}

fn flow_recommendation() -> Recommendation {
    Recommendation {
        id: "sug-flow".to_string(),
        recommendation_type: RecommendationType::FlowImprovement,
        title: "Improve Document Flow & Transitions".to_string(),
        description: "The document structure could benefit from better logical progression and transitions between sections".to_string(),
        suggested_changes: vec![SuggestedChange {
            action: ChangeAction::AddTransitions,
            target_location: TARGET_ALL_SECTIONS.to_string(),
            content: "Add linking sentences between chapters, for example: \"Building on the literature review, this chapter describes the methodology used to address the research questions identified in Chapter 1.\"".to_string(),
            reason: "Better coherence for readers transitioning between major sections".to_string(),
        }],
        priority: Priority::High,
        confidence_score: 85,
        estimated_time_minutes: 25,
        effectiveness_estimate: 75,
    }
}

fn compliance_recommendation() -> Recommendation {
    Recommendation {
        id: "sug-compliance".to_string(),
        recommendation_type: RecommendationType::Compliance,
        title: "Address Compliance Issues".to_string(),
        description: "Several academic standards are not fully met according to common university requirements".to_string(),
        suggested_changes: vec![SuggestedChange {
            action: ChangeAction::AddMissingElements,
            target_location: TARGET_DOCUMENT_ROOT.to_string(),
            content: "Add missing formal elements such as an abstract, acknowledgements, a table of contents, or appendices as required by your university".to_string(),
            reason: "Meet university formatting requirements".to_string(),
        }],
        priority: Priority::High,
        confidence_score: 90,
        estimated_time_minutes: 30,
        effectiveness_estimate: 80,
    }
}

fn expansion_recommendation(node: &SectionNode) -> Recommendation {
    Recommendation {
        id: format!("sug-{}-length", node.id),
        recommendation_type: RecommendationType::ContentExpansion,
        title: format!("Expand Chapter: {}", node.title),
        description: format!(
            "This chapter appears to have limited content ({} words) for an academic thesis chapter",
            node.word_count
        ),
        suggested_changes: vec![SuggestedChange {
            action: ChangeAction::ExpandContent,
            target_location: node.id.clone(),
            content: "Expand this chapter to provide more comprehensive coverage of the topic. Thesis chapters typically contain 1,000-3,000 words depending on university requirements.".to_string(),
            reason: "Insufficient word count for academic standards".to_string(),
        }],
        priority: Priority::High,
        confidence_score: 95,
        estimated_time_minutes: 120,
        effectiveness_estimate: 85,
    }
}

fn quality_recommendation(node: &SectionNode) -> Recommendation {
    let severe = node.quality_score < LOW_QUALITY_THRESHOLD;
    Recommendation {
        id: format!("sug-{}-quality", node.id),
        recommendation_type: RecommendationType::ContentImprovement,
        title: format!("Improve Section Quality: {}", node.title),
        description: format!(
            "This section needs improvement in academic quality (current score: {}/100)",
            node.quality_score
        ),
        suggested_changes: vec![SuggestedChange {
            action: ChangeAction::ReviseAcademicTone,
            target_location: node.id.clone(),
            content: "Review this section for academic tone, proper citations, clear argument structure, and logical flow. Consider how it connects to your research questions/objectives.".to_string(),
            reason: "Low academic quality score indicates need for improvement".to_string(),
        }],
        priority: if severe { Priority::High } else { Priority::Medium },
        confidence_score: 80,
        estimated_time_minutes: 45,
        effectiveness_estimate: if severe { 90 } else { 60 },
    }
}

fn missing_introduction_recommendation() -> Recommendation {
    Recommendation {
        id: "sug-missing-introduction".to_string(),
        recommendation_type: RecommendationType::StructuralMissing,
        title: "Add Introduction Chapter".to_string(),
        description: "The thesis appears to be missing an introduction chapter, which is critical for academic theses".to_string(),
        suggested_changes: vec![SuggestedChange {
            action: ChangeAction::AddChapter,
            target_location: TARGET_BEFORE_FIRST_CHAPTER.to_string(),
            content: "Chapter 1: Introduction - background, problem statement, objectives, significance, scope, and methodology overview".to_string(),
            reason: "Academic theses require a proper introduction to orient readers".to_string(),
        }],
        priority: Priority::High,
        confidence_score: 100,
        estimated_time_minutes: 60,
        effectiveness_estimate: 95,
    }
}

fn missing_literature_recommendation() -> Recommendation {
    Recommendation {
        id: "sug-missing-literature".to_string(),
        recommendation_type: RecommendationType::StructuralMissing,
        title: "Add Literature Review Chapter".to_string(),
        description: "The thesis appears to be missing a literature review chapter, which is critical for establishing theoretical foundation".to_string(),
        suggested_changes: vec![SuggestedChange {
            action: ChangeAction::AddChapter,
            target_location: TARGET_AFTER_INTRODUCTION.to_string(),
            content: "Chapter 2: Literature Review - theoretical framework, related studies, and gap analysis".to_string(),
            reason: "Establishes foundation and identifies research gaps".to_string(),
        }],
        priority: Priority::High,
        confidence_score: 100,
        estimated_time_minutes: 60,
        effectiveness_estimate: 90,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SectionKind;

    fn strong_chapter(id: &str, title: &str) -> SectionNode {
        SectionNode::new(id, SectionKind::CHAPTER, title)
            .with_word_count(2000)
            .with_quality(90)
    }

    fn by_type(
        recommendations: &[Recommendation],
        recommendation_type: RecommendationType,
    ) -> Vec<&Recommendation> {
        recommendations
            .iter()
            .filter(|value| value.recommendation_type == recommendation_type)
            .collect()
    }

    #[test]
    fn short_chapter_gets_expansion_targeting_it() {
        let forest = vec![
            strong_chapter("ch1", "Introduction"),
            strong_chapter("ch2", "Literature Review").with_word_count(300),
        ];

        let recommendations = generate_recommendations(&forest, 90, 90, None);
        let expansions = by_type(&recommendations, RecommendationType::ContentExpansion);
        assert_eq!(expansions.len(), 1);
        assert_eq!(expansions[0].suggested_changes[0].target_location, "ch2");
        assert_eq!(expansions[0].confidence_score, 95);
        assert_eq!(expansions[0].priority, Priority::High);
    }

    #[test]
    fn short_nested_sections_are_not_expansion_candidates() {
        let forest = vec![strong_chapter("ch1", "Introduction").with_children(vec![
            SectionNode::new("s1", SectionKind::SECTION, "Literature Review")
                .with_word_count(100)
                .with_quality(90),
        ])];

        let recommendations = generate_local_recommendations(&forest, 90, 90);
        assert!(recommendations.is_empty(), "unexpected: {recommendations:?}");
    }

    #[test]
    fn missing_introduction_is_reported_once_before_first_chapter() {
        let forest = vec![
            strong_chapter("ch1", "Literature Review"),
            strong_chapter("ch2", "Methodology"),
        ];

        let recommendations = generate_recommendations(&forest, 90, 90, None);
        let missing = by_type(&recommendations, RecommendationType::StructuralMissing);
        assert_eq!(missing.len(), 1);
        assert_eq!(
            missing[0].suggested_changes[0].target_location,
            TARGET_BEFORE_FIRST_CHAPTER
        );
        assert_eq!(missing[0].confidence_score, 100);
        assert_eq!(missing[0].effectiveness_estimate, 95);
    }

    #[test]
    fn missing_literature_targets_after_introduction() {
        let forest = vec![strong_chapter("ch1", "Introduction")];

        let recommendations = generate_local_recommendations(&forest, 90, 90);
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].id, "sug-missing-literature");
        assert_eq!(
            recommendations[0].suggested_changes[0].target_location,
            TARGET_AFTER_INTRODUCTION
        );
        assert_eq!(recommendations[0].effectiveness_estimate, 90);
    }

    #[test]
    fn quality_priority_and_effectiveness_follow_severity() {
        let forest = vec![
            strong_chapter("ch1", "Introduction").with_quality(55),
            strong_chapter("ch2", "Literature Review").with_quality(65),
        ];

        let recommendations = generate_local_recommendations(&forest, 90, 90);
        let improvements = by_type(&recommendations, RecommendationType::ContentImprovement);
        assert_eq!(improvements.len(), 2);
        assert_eq!(improvements[0].priority, Priority::High);
        assert_eq!(improvements[0].effectiveness_estimate, 90);
        assert_eq!(improvements[1].priority, Priority::Medium);
        assert_eq!(improvements[1].effectiveness_estimate, 60);
    }

    #[test]
    fn low_scores_trigger_flow_and_compliance_items() {
        let forest = vec![
            strong_chapter("ch1", "Introduction"),
            strong_chapter("ch2", "Literature Review"),
        ];

        let recommendations = generate_local_recommendations(&forest, 69, 79);
        let ids = recommendations
            .iter()
            .map(|value| value.id.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(ids, vec!["sug-flow", "sug-compliance"]);
        assert_eq!(
            recommendations[1].suggested_changes[0].target_location,
            TARGET_DOCUMENT_ROOT
        );
    }

    #[test]
    fn local_recommendations_are_well_formed_and_unique() {
        let forest = vec![
            SectionNode::new("ch1", SectionKind::CHAPTER, "Background")
                .with_word_count(100)
                .with_quality(40)
                .with_children(vec![SectionNode::new("s1", SectionKind::SECTION, "Notes")]),
        ];

        let recommendations = generate_local_recommendations(&forest, 10, 10);
        let ids = recommendations
            .iter()
            .map(|value| value.id.clone())
            .collect::<HashSet<String>>();
        assert_eq!(ids.len(), recommendations.len());
        for recommendation in &recommendations {
            assert!(check_suggestion(recommendation).is_ok(), "{recommendation:?}");
        }
        assert_eq!(
            recommendations,
            generate_local_recommendations(&forest, 10, 10)
        );
    }

    #[test]
    fn valid_assistant_suggestions_replace_local_ones() {
        let forest = vec![strong_chapter("ch1", "Methods")];
        let mut suggestion = flow_recommendation();
        suggestion.id = "ai-1".to_string();
        let mut duplicate = suggestion.clone();
        duplicate.title = "Second".to_string();
        let mut invalid = suggestion.clone();
        invalid.suggested_changes.clear();

        let offered = vec![suggestion, duplicate, invalid];

        let (recommendations, source) =
            generate_recommendations_with_source(&forest, 40, 40, Some(offered.as_slice()));

        assert_eq!(source, RecommendationSource::Assistant);
        let ids = recommendations
            .iter()
            .map(|value| value.id.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(ids, vec!["ai-1", "ai-1-2"]);
    }

    #[test]
    fn unusable_assistant_suggestions_fall_back_to_local() {
        let forest = vec![strong_chapter("ch1", "Introduction")];
        let mut invalid = flow_recommendation();
        invalid.estimated_time_minutes = 0;

        let offered = vec![invalid];

        let (recommendations, source) =
            generate_recommendations_with_source(&forest, 90, 90, Some(offered.as_slice()));

        assert_eq!(source, RecommendationSource::LocalFallback);
        assert_eq!(recommendations, generate_local_recommendations(&forest, 90, 90));
    }
}
