use std::fmt;

use serde::{Deserialize, Serialize};

/// Nesting rank of a section; chapters are rank 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionKind(u32);

impl SectionKind {
    pub const CHAPTER: Self = Self(0);
    pub const SECTION: Self = Self(1);
    pub const SUBSECTION: Self = Self(2);
    pub const SUBSUBSECTION: Self = Self(3);

    pub fn from_rank(rank: u32) -> Self {
        Self(rank)
    }

    pub fn rank(self) -> u32 {
        self.0
    }

    pub fn is_chapter(self) -> bool {
        self.0 == 0
    }

    pub fn label(self) -> String {
        match self.0 {
            0 => "chapter".to_string(),
            1 => "section".to_string(),
            2 => "subsection".to_string(),
            3 => "subsubsection".to_string(),
            rank => format!("level_{rank}"),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "");
        match normalized.as_str() {
            "chapter" => Some(Self::CHAPTER),
            "section" => Some(Self::SECTION),
            "subsection" => Some(Self::SUBSECTION),
            "subsubsection" => Some(Self::SUBSUBSECTION),
            other => other
                .strip_prefix("level_")
                .and_then(|rank| rank.parse::<u32>().ok())
                .map(Self),
        }
    }
}

impl TryFrom<String> for SectionKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown section kind: {value}"))
    }
}

impl From<SectionKind> for String {
    fn from(value: SectionKind) -> Self {
        value.label()
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

impl SectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "complete" | "completed" => Some(Self::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionNode {
    pub id: String,
    pub kind: SectionKind,
    pub title: String,
    pub content_preview: String,
    pub word_count: u32,
    pub quality_score: u8,
    pub status: SectionStatus,
    #[serde(default)]
    pub children: Vec<SectionNode>,
}

impl SectionNode {
    pub fn new(id: impl Into<String>, kind: SectionKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            content_preview: String::new(),
            word_count: 0,
            quality_score: 0,
            status: SectionStatus::NotStarted,
            children: Vec::new(),
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.content_preview = preview.into();
        self
    }

    pub fn with_word_count(mut self, word_count: u32) -> Self {
        self.word_count = word_count;
        self
    }

    pub fn with_quality(mut self, quality_score: u8) -> Self {
        self.quality_score = quality_score.min(100);
        self
    }

    pub fn with_status(mut self, status: SectionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_children(mut self, children: Vec<SectionNode>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Addresses,
    BuildsOn,
    IdentifiesGapFor,
    Informs,
    SupportsOrContrasts,
    ValidatesOrRefutes,
    Interprets,
    ConnectsTo,
    Summarizes,
    Establishes,
    EstablishesSignificance,
    RelatedTo,
    None,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Addresses => "addresses",
            Self::BuildsOn => "builds_on",
            Self::IdentifiesGapFor => "identifies_gap_for",
            Self::Informs => "informs",
            Self::SupportsOrContrasts => "supports_or_contrasts",
            Self::ValidatesOrRefutes => "validates_or_refutes",
            Self::Interprets => "interprets",
            Self::ConnectsTo => "connects_to",
            Self::Summarizes => "summarizes",
            Self::Establishes => "establishes",
            Self::EstablishesSignificance => "establishes_significance",
            Self::RelatedTo => "related_to",
            Self::None => "none",
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub relation_type: RelationType,
    pub strength: u8,
    pub description: String,
}

impl Classification {
    pub fn none() -> Self {
        Self {
            relation_type: RelationType::None,
            strength: 0,
            description: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source_id: String,
    pub target_id: String,
    pub relation_type: RelationType,
    pub strength: u8,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Reorganization,
    ContentPlacement,
    FlowImprovement,
    Compliance,
    ContentExpansion,
    ContentImprovement,
    StructuralMissing,
    CrossReference,
}

impl RecommendationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reorganization => "reorganization",
            Self::ContentPlacement => "content_placement",
            Self::FlowImprovement => "flow_improvement",
            Self::Compliance => "compliance",
            Self::ContentExpansion => "content_expansion",
            Self::ContentImprovement => "content_improvement",
            Self::StructuralMissing => "structural_missing",
            Self::CrossReference => "cross_reference",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "reorganization" => Some(Self::Reorganization),
            "content_placement" => Some(Self::ContentPlacement),
            "flow_improvement" => Some(Self::FlowImprovement),
            "compliance" => Some(Self::Compliance),
            "content_expansion" => Some(Self::ContentExpansion),
            "content_improvement" => Some(Self::ContentImprovement),
            "structural_missing" => Some(Self::StructuralMissing),
            "cross_reference" => Some(Self::CrossReference),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Move,
    Insert,
    AddTransitions,
    AddMissingElements,
    ExpandContent,
    ReviseAcademicTone,
    AddChapter,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Insert => "insert",
            Self::AddTransitions => "add_transitions",
            Self::AddMissingElements => "add_missing_elements",
            Self::ExpandContent => "expand_content",
            Self::ReviseAcademicTone => "revise_academic_tone",
            Self::AddChapter => "add_chapter",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "move" => Some(Self::Move),
            "insert" => Some(Self::Insert),
            "add_transitions" => Some(Self::AddTransitions),
            "add_missing_elements" => Some(Self::AddMissingElements),
            "expand_content" => Some(Self::ExpandContent),
            "revise_academic_tone" => Some(Self::ReviseAcademicTone),
            "add_chapter" => Some(Self::AddChapter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedChange {
    pub action: ChangeAction,
    pub target_location: String,
    pub content: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,
    pub title: String,
    pub description: String,
    pub suggested_changes: Vec<SuggestedChange>,
    pub priority: Priority,
    pub confidence_score: u8,
    pub estimated_time_minutes: u32,
    pub effectiveness_estimate: u8,
}

// Stable: generation order is kept within a priority.
pub fn sort_by_priority(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|left, right| right.priority.cmp(&left.priority));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CitationRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageQuality {
    Adequate,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationCrossReference {
    pub citation_id: String,
    pub citation_text: String,
    pub referenced_in_section_ids: Vec<String>,
    pub usage_quality: UsageQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StructureSummary {
    pub total_chapters: usize,
    pub total_sections: usize,
    pub total_word_count: u64,
    pub average_quality: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Assistant,
    LocalFallback,
}

impl RecommendationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assistant => "assistant",
            Self::LocalFallback => "local_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysisResult {
    pub document_id: String,
    pub structure_map: Vec<SectionNode>,
    pub flow_score: u8,
    pub compliance_score: u8,
    pub recommendations: Vec<Recommendation>,
    pub recommendation_source: RecommendationSource,
    pub citation_map: Vec<CitationCrossReference>,
    pub cross_references: Vec<RelationshipEdge>,
    pub navigation_path: Vec<String>,
    pub summary: StructureSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommendation(id: &str, priority: Priority) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            recommendation_type: RecommendationType::ContentImprovement,
            title: format!("Recommendation {id}"),
            description: String::new(),
            suggested_changes: Vec::new(),
            priority,
            confidence_score: 80,
            estimated_time_minutes: 30,
            effectiveness_estimate: 60,
        }
    }

    #[test]
    fn sort_by_priority_puts_high_first_and_keeps_ties_in_order() {
        let mut recommendations = vec![
            recommendation("a", Priority::Low),
            recommendation("b", Priority::High),
            recommendation("c", Priority::Medium),
            recommendation("d", Priority::High),
        ];

        sort_by_priority(&mut recommendations);

        let ids = recommendations
            .iter()
            .map(|value| value.id.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(ids, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn section_kind_labels_round_trip_through_serde() {
        let kinds = vec![SectionKind::CHAPTER, SectionKind::from_rank(5)];
        let encoded = serde_json::to_value(&kinds).expect("kinds should serialize");
        assert_eq!(encoded, serde_json::json!(["chapter", "level_5"]));

        let decoded: Vec<SectionKind> =
            serde_json::from_value(encoded).expect("kinds should deserialize");
        assert_eq!(decoded, kinds);
    }
}
