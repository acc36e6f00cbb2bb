use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::strip_code_fence;
use crate::analysis::recommendations::TARGET_DOCUMENT_ROOT;
use crate::error::RecommendationGenerationError;
use crate::model::{ChangeAction, Priority, Recommendation, RecommendationType, SuggestedChange};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SuggestionInput {
    id: String,
    #[serde(rename = "type", alias = "recommendation_type")]
    recommendation_type: String,
    title: String,
    description: String,
    #[serde(alias = "suggestedChanges")]
    suggested_changes: Vec<ChangeInput>,
    priority: String,
    #[serde(alias = "confidenceScore")]
    confidence_score: i64,
    #[serde(alias = "estimated_time", alias = "estimatedTime")]
    estimated_time_minutes: i64,
    #[serde(alias = "effectivenessEstimate")]
    effectiveness_estimate: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChangeInput {
    action: String,
    #[serde(alias = "targetLocation")]
    target_location: String,
    content: String,
    reason: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionPayload {
    List(Vec<SuggestionInput>),
    Wrapped {
        #[serde(alias = "suggestions")]
        recommendations: Vec<SuggestionInput>,
    },
}

/// Items with an unknown type are skipped; other fields are validated on
/// acceptance.
pub fn parse_suggestions(
    response: &str,
) -> Result<Vec<Recommendation>, RecommendationGenerationError> {
    let body = strip_code_fence(response);
    if body.is_empty() {
        return Err(RecommendationGenerationError::Unparsable(
            "response was empty".to_string(),
        ));
    }

    let inputs = if body.starts_with('[') || body.starts_with('{') {
        let payload: SuggestionPayload = serde_json::from_str(body)
            .map_err(|err| RecommendationGenerationError::Unparsable(err.to_string()))?;
        match payload {
            SuggestionPayload::List(inputs) => inputs,
            SuggestionPayload::Wrapped { recommendations } => recommendations,
        }
    } else {
        parse_field_blocks(body)?
    };

    let offered = inputs.len();
    let recommendations = inputs
        .into_iter()
        .filter_map(convert_suggestion)
        .collect::<Vec<Recommendation>>();

    if recommendations.is_empty() {
        return Err(RecommendationGenerationError::NoValidSuggestions);
    }

    debug!(
        offered,
        parsed = recommendations.len(),
        "advisor suggestions parsed"
    );
    Ok(recommendations)
}

fn parse_field_blocks(body: &str) -> Result<Vec<SuggestionInput>, RecommendationGenerationError> {
    let mut blocks = Vec::<SuggestionInput>::new();
    let mut last_field: Option<String> = None;

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(captures) = block_field_regex().captures(trimmed) {
            let field = captures
                .get(1)
                .map(|value| value.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            let value = captures
                .get(2)
                .map(|value| value.as_str().trim().trim_matches('*').trim())
                .unwrap_or_default();

            if field == "id" || blocks.is_empty() {
                blocks.push(SuggestionInput::default());
            }
            let Some(current) = blocks.last_mut() else {
                continue;
            };
            apply_field(current, &field, value);
            last_field = Some(field);
            continue;
        }

        let (Some(current), Some(field)) = (blocks.last_mut(), last_field.as_deref()) else {
            continue;
        };
        match field {
            "suggested changes" => current.suggested_changes.push(parse_change_line(trimmed)),
            "description" => {
                current.description.push(' ');
                current.description.push_str(trimmed);
            }
            _ => {}
        }
    }

    if blocks.is_empty() {
        return Err(RecommendationGenerationError::Unparsable(
            "no recommendation blocks found".to_string(),
        ));
    }
    Ok(blocks)
}

fn apply_field(current: &mut SuggestionInput, field: &str, value: &str) {
    match field {
        "id" => current.id = value.to_string(),
        "type" => current.recommendation_type = value.to_string(),
        "title" => current.title = value.to_string(),
        "description" => current.description = value.to_string(),
        "suggested changes" => {
            if !value.is_empty() {
                current.suggested_changes.push(parse_change_line(value));
            }
        }
        "priority" => current.priority = value.to_string(),
        "confidence score" => current.confidence_score = first_integer(value),
        "estimated time" => current.estimated_time_minutes = first_integer(value),
        "effectiveness estimate" => current.effectiveness_estimate = first_integer(value),
        _ => {}
    }
}

fn parse_change_line(line: &str) -> ChangeInput {
    let line = line.trim_start_matches(['-', '*']).trim();
    match change_regex().captures(line) {
        Some(captures) => ChangeInput {
            action: capture_text(&captures, 1),
            target_location: capture_text(&captures, 2),
            content: capture_text(&captures, 3),
            reason: String::new(),
        },
        None => ChangeInput {
            content: line.to_string(),
            ..ChangeInput::default()
        },
    }
}

fn capture_text(captures: &regex::Captures<'_>, index: usize) -> String {
    captures
        .get(index)
        .map(|value| value.as_str().trim().to_string())
        .unwrap_or_default()
}

fn convert_suggestion(input: SuggestionInput) -> Option<Recommendation> {
    let Some(recommendation_type) = RecommendationType::parse(&input.recommendation_type) else {
        warn!(
            id = %input.id,
            recommendation_type = %input.recommendation_type,
            "skipping advisor suggestion with unknown type"
        );
        return None;
    };

    let suggested_changes = input
        .suggested_changes
        .into_iter()
        .map(|change| SuggestedChange {
            action: ChangeAction::parse(&change.action)
                .unwrap_or_else(|| default_action(recommendation_type)),
            target_location: if change.target_location.trim().is_empty() {
                TARGET_DOCUMENT_ROOT.to_string()
            } else {
                change.target_location.trim().to_string()
            },
            content: change.content.trim().to_string(),
            reason: if change.reason.trim().is_empty() {
                input.description.trim().to_string()
            } else {
                change.reason.trim().to_string()
            },
        })
        .collect();

    Some(Recommendation {
        id: input.id.trim().to_string(),
        recommendation_type,
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        suggested_changes,
        priority: Priority::parse(&input.priority).unwrap_or(Priority::Medium),
        confidence_score: saturating_u8(input.confidence_score),
        estimated_time_minutes: input.estimated_time_minutes.clamp(0, i64::from(u32::MAX)) as u32,
        effectiveness_estimate: saturating_u8(input.effectiveness_estimate),
    })
}

fn default_action(recommendation_type: RecommendationType) -> ChangeAction {
    match recommendation_type {
        RecommendationType::Reorganization => ChangeAction::Move,
        RecommendationType::ContentPlacement | RecommendationType::CrossReference => {
            ChangeAction::Insert
        }
        RecommendationType::FlowImprovement => ChangeAction::AddTransitions,
        RecommendationType::Compliance => ChangeAction::AddMissingElements,
        RecommendationType::ContentExpansion => ChangeAction::ExpandContent,
        RecommendationType::ContentImprovement => ChangeAction::ReviseAcademicTone,
        RecommendationType::StructuralMissing => ChangeAction::AddChapter,
    }
}

fn saturating_u8(value: i64) -> u8 {
    value.clamp(0, i64::from(u8::MAX)) as u8
}

fn first_integer(value: &str) -> i64 {
    integer_regex()
        .find(value)
        .and_then(|found| found.as_str().parse::<i64>().ok())
        .unwrap_or(0)
}

fn block_field_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:\d+[.)]\s*)?[-*]*\s*\**(id|type|title|description|suggested changes|priority|confidence score|estimated time|effectiveness estimate)\**\s*:\s*\**(.*)$",
        )
        .expect("block field regex is valid")
    })
}

fn change_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^([A-Za-z_ ]+?)\s*->\s*([^:]+?)\s*:\s*(.+)$").expect("change regex is valid")
    })
}

fn integer_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"-?\d+").expect("integer regex is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: &str = "
Here are my recommendations:

- ID: ai-flow
- Type: flow_improvement
- Title: Link the methodology to the research questions
- Description: Chapter 3 does not refer back to the questions in Chapter 1.
- Suggested Changes: add_transitions -> ch3: Open the chapter by restating the research questions.
- Priority: high
- Confidence Score: 82
- Estimated Time: 30 minutes
- Effectiveness Estimate: 70

- ID: ai-appendix
- Type: compliance
- Title: Add appendices
- Description: Survey instruments are referenced but not included.
- Suggested Changes:
  - Attach the survey questionnaire as Appendix A
- Priority: medium
- Confidence Score: 75
- Estimated Time: 20
- Effectiveness Estimate: 55
";

    #[test]
    fn field_blocks_become_recommendations() {
        let parsed = parse_suggestions(BLOCKS).expect("blocks should parse");
        assert_eq!(parsed.len(), 2);

        let first = &parsed[0];
        assert_eq!(first.id, "ai-flow");
        assert_eq!(first.recommendation_type, RecommendationType::FlowImprovement);
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.estimated_time_minutes, 30);
        assert_eq!(first.suggested_changes[0].action, ChangeAction::AddTransitions);
        assert_eq!(first.suggested_changes[0].target_location, "ch3");
        assert_eq!(
            first.suggested_changes[0].content,
            "Open the chapter by restating the research questions."
        );

        let second = &parsed[1];
        assert_eq!(second.suggested_changes.len(), 1);
        assert_eq!(second.suggested_changes[0].action, ChangeAction::AddMissingElements);
        assert_eq!(
            second.suggested_changes[0].target_location,
            TARGET_DOCUMENT_ROOT
        );
        assert_eq!(second.effectiveness_estimate, 55);
    }

    #[test]
    fn json_recommendations_are_accepted() {
        let response = serde_json::json!({
            "recommendations": [{
                "id": "ai-1",
                "type": "content_placement",
                "title": "Move the limitations",
                "description": "Limitations belong in the discussion.",
                "suggestedChanges": [{
                    "action": "move",
                    "targetLocation": "ch5",
                    "content": "Move section 1.6 into chapter 5"
                }],
                "priority": "low",
                "confidenceScore": 60,
                "estimatedTime": 15,
                "effectivenessEstimate": 40
            }]
        })
        .to_string();

        let parsed = parse_suggestions(&response).expect("json should parse");
        assert_eq!(parsed[0].recommendation_type, RecommendationType::ContentPlacement);
        assert_eq!(parsed[0].suggested_changes[0].action, ChangeAction::Move);
        assert_eq!(
            parsed[0].suggested_changes[0].reason,
            "Limitations belong in the discussion."
        );
        assert_eq!(parsed[0].priority, Priority::Low);
    }

    #[test]
    fn unknown_types_are_skipped_and_scores_saturate() {
        let response = r#"[
            {"id": "a", "type": "rewrite_everything", "title": "x"},
            {"id": "b", "type": "compliance", "title": "y", "confidence_score": 900}
        ]"#;

        let parsed = parse_suggestions(response).expect("one item should survive");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "b");
        assert_eq!(parsed[0].confidence_score, u8::MAX);
    }

    #[test]
    fn prose_is_unparsable() {
        let error = parse_suggestions("Your thesis looks great!").expect_err("no blocks");
        assert!(matches!(error, RecommendationGenerationError::Unparsable(_)));
    }

    #[test]
    fn only_unknown_types_means_no_valid_suggestions() {
        let error = parse_suggestions(r#"[{"id": "a", "type": "other"}]"#)
            .expect_err("nothing usable");
        assert!(matches!(error, RecommendationGenerationError::NoValidSuggestions));
    }
}
