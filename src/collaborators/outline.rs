use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::strip_code_fence;
use crate::error::AnalysisError;
use crate::model::SectionNode;
use crate::similarity::{excerpt, normalize_whitespace};
use crate::tree::{SectionNodeInput, ingest_forest};

pub const MAX_PREVIEW_CHARS: usize = 500;

#[derive(Deserialize)]
#[serde(untagged)]
enum StructurePayload {
    Forest(Vec<SectionNodeInput>),
    Wrapped {
        #[serde(alias = "structureMap", alias = "sections")]
        structure_map: Vec<SectionNodeInput>,
    },
}

/// Accepts a JSON section array, an object carrying `structure_map`, or a
/// Markdown heading outline.
pub fn parse_structure_response(
    response: &str,
    max_sections: usize,
) -> Result<Vec<SectionNode>, AnalysisError> {
    let body = strip_code_fence(response);
    if body.is_empty() {
        return Err(AnalysisError::UnparsableStructure(
            "response was empty".to_string(),
        ));
    }

    let inputs = if body.starts_with('[') || body.starts_with('{') {
        let payload: StructurePayload = serde_json::from_str(body)
            .map_err(|err| AnalysisError::UnparsableStructure(err.to_string()))?;
        match payload {
            StructurePayload::Forest(inputs) => inputs,
            StructurePayload::Wrapped { structure_map } => structure_map,
        }
    } else {
        parse_outline(body)?
    };

    if inputs.is_empty() {
        return Err(AnalysisError::EmptyStructure);
    }

    let forest = ingest_forest(&inputs, max_sections)?;
    debug!(top_level = forest.len(), "structure response parsed");
    Ok(forest)
}

// Body lines extend the current heading's preview and word count unless they
// are `Quality:`, `Word count:` or `Status:` lines.
pub fn parse_outline(text: &str) -> Result<Vec<SectionNodeInput>, AnalysisError> {
    let mut roots = Vec::<SectionNodeInput>::new();
    let mut stack = Vec::<(usize, SectionNodeInput, bool)>::new();

    for line in text.lines() {
        if let Some(captures) = heading_regex().captures(line) {
            let level = captures.get(1).map(|value| value.as_str().len()).unwrap_or(1);
            let heading = captures.get(2).map(|value| value.as_str()).unwrap_or_default();

            while stack.last().is_some_and(|(open_level, _, _)| *open_level >= level) {
                close_top(&mut stack, &mut roots);
            }

            let id = match stack.last() {
                Some((_, parent, _)) => format!("{}-{}", parent.id, parent.children.len() + 1),
                None => format!("ch{}", roots.len() + 1),
            };
            let (title, description) = split_heading(heading);
            let node = SectionNodeInput {
                id,
                title,
                content_preview: description.clone(),
                word_count: count_words(&description),
                ..SectionNodeInput::default()
            };
            stack.push((level, node, false));
            continue;
        }

        let Some((_, current, explicit_words)) = stack.last_mut() else {
            continue;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(captures) = field_regex().captures(trimmed) {
            let key = captures
                .get(1)
                .map(|value| value.as_str().to_ascii_lowercase())
                .unwrap_or_default();
            let value = captures.get(2).map(|value| value.as_str().trim()).unwrap_or_default();
            match key.as_str() {
                "quality" | "academic score" | "quality score" => {
                    current.quality_score = first_integer(value);
                }
                "word count" | "words" => {
                    if let Some(words) = first_integer(value) {
                        current.word_count = words;
                        *explicit_words = true;
                    }
                }
                "status" => current.status = Some(value.to_string()),
                _ => {}
            }
            continue;
        }

        append_preview(&mut current.content_preview, trimmed);
        if !*explicit_words {
            current.word_count += count_words(trimmed);
        }
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    if roots.is_empty() {
        return Err(AnalysisError::UnparsableStructure(
            "no section headings found".to_string(),
        ));
    }

    Ok(roots)
}

fn close_top(stack: &mut Vec<(usize, SectionNodeInput, bool)>, roots: &mut Vec<SectionNodeInput>) {
    let Some((_, node, _)) = stack.pop() else {
        return;
    };
    match stack.last_mut() {
        Some((_, parent, _)) => parent.children.push(node),
        None => roots.push(node),
    }
}

// `Chapter 2:` style prefixes stay in the title.
fn split_heading(heading: &str) -> (String, String) {
    let heading = normalize_whitespace(heading);
    let prefix_len = numbered_prefix_regex()
        .find(&heading)
        .map(|value| value.end())
        .unwrap_or(0);

    let (prefix, rest) = heading.split_at(prefix_len);
    match rest.split_once(':') {
        Some((title, description)) if !title.trim().is_empty() => (
            format!("{prefix}{}", title.trim()),
            description.trim().to_string(),
        ),
        _ => (heading.trim().to_string(), String::new()),
    }
}

fn append_preview(preview: &mut String, line: &str) {
    if preview.chars().count() >= MAX_PREVIEW_CHARS {
        return;
    }
    if !preview.is_empty() {
        preview.push(' ');
    }
    preview.push_str(line);
    let bounded = excerpt(preview, MAX_PREVIEW_CHARS).len();
    preview.truncate(bounded);
}

fn count_words(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}

fn first_integer(value: &str) -> Option<i64> {
    integer_regex()
        .find(value)
        .and_then(|found| found.as_str().parse::<i64>().ok())
}

fn heading_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*(#{1,6})\s+(\S.*?)\s*#*\s*$").expect("heading regex is valid")
    })
}

fn field_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)^[-*]?\s*(quality score|quality|academic score|word count|words|status)\s*:\s*(.+)$")
            .expect("field regex is valid")
    })
}

fn numbered_prefix_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)^(chapter|part|section|appendix)\s+[0-9a-z.]+\s*:\s*")
            .expect("numbered prefix regex is valid")
    })
}

fn integer_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"-?\d+").expect("integer regex is valid"))
}
