use anyhow::Result;
use tracing::{info, warn};

use thesis_structure::store::SqliteReportStore;

use crate::cli::StatusArgs;

pub fn run(args: StatusArgs) -> Result<()> {
    info!(db_path = %args.db_path.display(), "status requested");

    if !args.db_path.exists() {
        warn!(path = %args.db_path.display(), "report database missing");
        return Ok(());
    }

    let store = SqliteReportStore::open(&args.db_path)?;
    let counts = store.counts()?;
    info!(
        path = %args.db_path.display(),
        schema_version = %store.schema_version()?.unwrap_or_default(),
        reports = counts.reports,
        sections = counts.sections,
        recommendations = counts.recommendations,
        "database status"
    );

    match store.latest_report()? {
        Some(latest) => info!(
            report_id = %latest.report_id,
            document_id = %latest.document_id,
            source_hash = %latest.source_hash,
            analyzed_at = %latest.analyzed_at,
            flow_score = latest.flow_score,
            compliance_score = latest.compliance_score,
            recommendation_source = %latest.recommendation_source,
            "latest report"
        ),
        None => warn!("no reports stored yet"),
    }

    Ok(())
}
