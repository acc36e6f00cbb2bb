use std::time::Instant;

use tracing::{debug, info, warn};

use super::citation::build_citation_refs;
use super::cross_reference::build_cross_references;
use super::navigation::build_navigation_path;
use super::recommendations::generate_recommendations_with_source;
use super::scoring::{average_quality, evaluate_compliance, evaluate_flow};
use crate::collaborators::outline::parse_structure_response;
use crate::collaborators::prompt::{build_advisor_prompt, build_structure_prompt};
use crate::collaborators::suggestions::parse_suggestions;
use crate::collaborators::{CitationSource, RecommendationAdvisor, StructureExtractor};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult, RecommendationGenerationError};
use crate::model::{
    CitationRecord, Recommendation, SectionNode, StructureAnalysisResult, StructureSummary,
};
use crate::tree::{SectionNodeInput, fold_preorder, ingest_forest, validate_forest};

pub struct Analyzer {
    config: AnalysisConfig,
    extractor: Option<Box<dyn StructureExtractor>>,
    advisor: Option<Box<dyn RecommendationAdvisor>>,
    citation_source: Option<Box<dyn CitationSource>>,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            extractor: None,
            advisor: None,
            citation_source: None,
        }
    }

    pub fn with_extractor(mut self, extractor: impl StructureExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    pub fn with_advisor(mut self, advisor: impl RecommendationAdvisor + 'static) -> Self {
        self.advisor = Some(Box::new(advisor));
        self
    }

    pub fn with_citation_source(mut self, source: impl CitationSource + 'static) -> Self {
        self.citation_source = Some(Box::new(source));
        self
    }

    /// Extracts the section tree from raw text through the structure
    /// extractor, then analyzes it. Fails when no extractor is configured or
    /// its answer cannot be turned into a valid tree.
    pub fn analyze(
        &self,
        document_text: &str,
        document_id: &str,
    ) -> AnalysisResult<StructureAnalysisResult> {
        let Some(extractor) = self.extractor.as_deref() else {
            return Err(AnalysisError::Extraction(
                "no structure extractor configured".to_string(),
            ));
        };

        let prompt = build_structure_prompt(document_text, self.config.structure_excerpt_chars);
        let started = Instant::now();
        let response = extractor
            .extract(&prompt, self.config.collaborator_timeout())
            .map_err(|err| AnalysisError::Extraction(format!("{err:#}")))?;
        debug!(
            document_id = %document_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_chars = response.chars().count(),
            "structure extractor responded"
        );

        let forest = parse_structure_response(&response, self.config.max_sections)?;
        self.analyze_tree(document_id, document_text, forest)
    }

    pub fn analyze_input(
        &self,
        document_id: &str,
        document_text: &str,
        inputs: &[SectionNodeInput],
    ) -> AnalysisResult<StructureAnalysisResult> {
        let forest = ingest_forest(inputs, self.config.max_sections)?;
        self.analyze_tree(document_id, document_text, forest)
    }

    pub fn analyze_tree(
        &self,
        document_id: &str,
        document_text: &str,
        forest: Vec<SectionNode>,
    ) -> AnalysisResult<StructureAnalysisResult> {
        validate_forest(&forest, self.config.max_sections)?;
        if forest.is_empty() {
            return Err(AnalysisError::EmptyStructure);
        }

        let flow_score = evaluate_flow(&forest);
        let compliance_score = evaluate_compliance(&forest);
        let cross_references = build_cross_references(&forest);

        let citations = self.load_citations(document_id)?;
        let citation_map = build_citation_refs(&forest, &citations);

        let ai_suggestions =
            match self.request_suggestions(&forest, flow_score, compliance_score, document_text) {
                Ok(suggestions) => suggestions,
                Err(err) => {
                    warn!(
                        document_id = %document_id,
                        error = %err,
                        "assistant recommendations unavailable; using local fallback"
                    );
                    None
                }
            };
        let (recommendations, recommendation_source) = generate_recommendations_with_source(
            &forest,
            flow_score,
            compliance_score,
            ai_suggestions.as_deref(),
        );

        let navigation_path = build_navigation_path(&forest);
        let summary = summarize(&forest);

        info!(
            document_id = %document_id,
            flow_score,
            compliance_score,
            sections = summary.total_chapters + summary.total_sections,
            edges = cross_references.len(),
            recommendations = recommendations.len(),
            recommendation_source = recommendation_source.as_str(),
            "structure analysis completed"
        );

        Ok(StructureAnalysisResult {
            document_id: document_id.to_string(),
            structure_map: forest,
            flow_score,
            compliance_score,
            recommendations,
            recommendation_source,
            citation_map,
            cross_references,
            navigation_path,
            summary,
        })
    }

    fn load_citations(&self, document_id: &str) -> AnalysisResult<Vec<CitationRecord>> {
        match self.citation_source.as_deref() {
            Some(source) => source
                .citations(document_id)
                .map_err(|err| AnalysisError::Citations(format!("{err:#}"))),
            None => Ok(Vec::new()),
        }
    }

    fn request_suggestions(
        &self,
        forest: &[SectionNode],
        flow_score: u8,
        compliance_score: u8,
        document_text: &str,
    ) -> Result<Option<Vec<Recommendation>>, RecommendationGenerationError> {
        let Some(advisor) = self.advisor.as_deref() else {
            return Ok(None);
        };

        let prompt = build_advisor_prompt(
            forest,
            flow_score,
            compliance_score,
            document_text,
            self.config.advisor_excerpt_chars,
            self.config.prompt_preview_chars,
        );
        let response = advisor
            .advise(&prompt, self.config.collaborator_timeout())
            .map_err(|err| RecommendationGenerationError::Advisor(format!("{err:#}")))?;

        parse_suggestions(&response).map(Some)
    }
}

/// Chapter-rank nodes count as chapters, every other node as a section.
pub fn summarize(forest: &[SectionNode]) -> StructureSummary {
    let (total_chapters, total_sections, total_word_count) = fold_preorder(
        forest,
        (0usize, 0usize, 0u64),
        |(chapters, sections, words), node, _| {
            let words = words + u64::from(node.word_count);
            if node.kind.is_chapter() {
                (chapters + 1, sections, words)
            } else {
                (chapters, sections + 1, words)
            }
        },
    );

    StructureSummary {
        total_chapters,
        total_sections,
        total_word_count,
        average_quality: average_quality(forest).round().clamp(0.0, 100.0) as u8,
    }
}
