use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;

use thesis_structure::analysis::Analyzer;
use thesis_structure::collaborators::{ExternalCommand, JsonCitationFile, ReportSink};
use thesis_structure::config::AnalysisConfig;
use thesis_structure::model::{StructureAnalysisResult, sort_by_priority};
use thesis_structure::store::SqliteReportStore;
use thesis_structure::tree::SectionNodeInput;
use thesis_structure::util::{read_text, sha256_text, utc_compact_string, write_json_pretty};

use crate::cli::AnalyzeArgs;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let run_id = format!("analyze-{}", utc_compact_string(Utc::now()));
    let config = resolve_config(&args)?;

    info!(
        run_id = %run_id,
        document_id = %args.document_id,
        document = %args.document.display(),
        max_sections = config.max_sections,
        timeout_ms = config.collaborator_timeout_ms,
        "analysis requested"
    );

    let document_text = read_text(&args.document)?;
    let source_hash = sha256_text(&document_text);

    let mut analyzer = Analyzer::new(config);
    if let Some(command_line) = args.extractor_cmd.as_deref() {
        analyzer = analyzer.with_extractor(parse_command(command_line, "--extractor-cmd")?);
    }
    if let Some(command_line) = args.advisor_cmd.as_deref() {
        analyzer = analyzer.with_advisor(parse_command(command_line, "--advisor-cmd")?);
    }
    if let Some(path) = args.citations.as_deref() {
        analyzer = analyzer.with_citation_source(JsonCitationFile::new(path));
    }

    let mut report = match args.tree.as_deref() {
        Some(tree_path) => {
            let inputs = load_tree(tree_path)?;
            analyzer
                .analyze_input(&args.document_id, &document_text, &inputs)
                .with_context(|| format!("failed to analyze tree {}", tree_path.display()))?
        }
        None => {
            if args.extractor_cmd.is_none() {
                bail!("either --tree or --extractor-cmd is required");
            }
            analyzer
                .analyze(&document_text, &args.document_id)
                .with_context(|| format!("failed to analyze {}", args.document.display()))?
        }
    };
    sort_by_priority(&mut report.recommendations);

    if let Some(output_path) = args.output.as_deref() {
        write_json_pretty(output_path, &report)?;
        info!(path = %output_path.display(), "wrote analysis report");
    }

    if let Some(db_path) = args.db_path.as_deref() {
        let mut store = SqliteReportStore::open(db_path)?;
        store.store(&report, &source_hash)?;
    }

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to render analysis report")?;
        println!("{rendered}");
    }

    log_report(&run_id, &report);
    Ok(())
}

fn resolve_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        config.collaborator_timeout_ms = timeout_ms;
    }
    if let Some(max_sections) = args.max_sections {
        config.max_sections = max_sections;
    }
    config.validate()?;
    Ok(config)
}

fn parse_command(command_line: &str, flag: &str) -> Result<ExternalCommand> {
    match ExternalCommand::from_command_line(command_line) {
        Some(command) => Ok(command),
        None => bail!("{flag} must name a program"),
    }
}

fn load_tree(path: &Path) -> Result<Vec<SectionNodeInput>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let inputs: Vec<SectionNodeInput> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse section tree {}", path.display()))?;
    Ok(inputs)
}

fn log_report(run_id: &str, report: &StructureAnalysisResult) {
    info!(
        run_id = %run_id,
        document_id = %report.document_id,
        flow_score = report.flow_score,
        compliance_score = report.compliance_score,
        chapters = report.summary.total_chapters,
        sections = report.summary.total_sections,
        words = report.summary.total_word_count,
        average_quality = report.summary.average_quality,
        edges = report.cross_references.len(),
        citations = report.citation_map.len(),
        recommendations = report.recommendations.len(),
        recommendation_source = report.recommendation_source.as_str(),
        "analysis finished"
    );

    for recommendation in &report.recommendations {
        info!(
            id = %recommendation.id,
            priority = recommendation.priority.as_str(),
            kind = recommendation.recommendation_type.as_str(),
            title = %recommendation.title,
            "recommendation"
        );
    }
}
