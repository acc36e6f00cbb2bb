use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::collaborators::ReportSink;
use crate::model::{SectionNode, StructureAnalysisResult};
use crate::util::{ensure_directory, now_utc_string};

pub const DB_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub reports: i64,
    pub sections: i64,
    pub recommendations: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    pub report_id: String,
    pub document_id: String,
    pub source_hash: String,
    pub analyzed_at: String,
    pub flow_score: u8,
    pub compliance_score: u8,
    pub recommendation_source: String,
}

/// SQLite-backed report history. Re-storing a report for the same document
/// and source hash replaces the earlier rows.
pub struct SqliteReportStore {
    connection: Connection,
}

impl SqliteReportStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            ensure_directory(parent)?;
        }
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        self.connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()
            .context("failed to read schema version")
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            reports: query_count(&self.connection, "SELECT COUNT(*) FROM reports")?,
            sections: query_count(&self.connection, "SELECT COUNT(*) FROM report_sections")?,
            recommendations: query_count(
                &self.connection,
                "SELECT COUNT(*) FROM report_recommendations",
            )?,
        })
    }

    pub fn latest_report(&self) -> Result<Option<StoredReport>> {
        self.connection
            .query_row(
                "
                SELECT report_id, document_id, source_hash, analyzed_at,
                       flow_score, compliance_score, recommendation_source
                FROM reports
                ORDER BY analyzed_at DESC, report_id DESC
                LIMIT 1
                ",
                [],
                |row| {
                    Ok(StoredReport {
                        report_id: row.get(0)?,
                        document_id: row.get(1)?,
                        source_hash: row.get(2)?,
                        analyzed_at: row.get(3)?,
                        flow_score: row.get(4)?,
                        compliance_score: row.get(5)?,
                        recommendation_source: row.get(6)?,
                    })
                },
            )
            .optional()
            .context("failed to read latest report")
    }
}

impl ReportSink for SqliteReportStore {
    fn store(&mut self, report: &StructureAnalysisResult, source_hash: &str) -> Result<()> {
        let report_id = report_id_for(&report.document_id, source_hash);
        let report_json =
            serde_json::to_string(report).context("failed to serialize analysis report")?;
        let analyzed_at = now_utc_string();

        let tx = self.connection.transaction()?;
        tx.execute(
            "DELETE FROM report_sections WHERE report_id = ?1",
            [&report_id],
        )?;
        tx.execute(
            "DELETE FROM report_recommendations WHERE report_id = ?1",
            [&report_id],
        )?;
        tx.execute(
            "
            INSERT INTO reports(
              report_id, document_id, source_hash, analyzed_at, flow_score,
              compliance_score, recommendation_source, total_chapters,
              total_sections, total_word_count, average_quality, report_json
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(report_id) DO UPDATE SET
              analyzed_at=excluded.analyzed_at,
              flow_score=excluded.flow_score,
              compliance_score=excluded.compliance_score,
              recommendation_source=excluded.recommendation_source,
              total_chapters=excluded.total_chapters,
              total_sections=excluded.total_sections,
              total_word_count=excluded.total_word_count,
              average_quality=excluded.average_quality,
              report_json=excluded.report_json
            ",
            params![
                &report_id,
                &report.document_id,
                source_hash,
                &analyzed_at,
                report.flow_score,
                report.compliance_score,
                report.recommendation_source.as_str(),
                report.summary.total_chapters as i64,
                report.summary.total_sections as i64,
                report.summary.total_word_count as i64,
                report.summary.average_quality,
                report_json
            ],
        )?;

        let mut section_rows = 0usize;
        {
            let mut statement = tx.prepare(
                "
                INSERT INTO report_sections(
                  report_id, section_id, parent_section_id, kind, title,
                  word_count, quality_score, status, order_index
                )
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
            )?;
            let mut order_index = 0i64;
            let mut pending = report
                .structure_map
                .iter()
                .rev()
                .map(|node| (None, node))
                .collect::<Vec<(Option<&str>, &SectionNode)>>();
            while let Some((parent_id, node)) = pending.pop() {
                statement.execute(params![
                    &report_id,
                    &node.id,
                    parent_id,
                    node.kind.label(),
                    &node.title,
                    node.word_count,
                    node.quality_score,
                    node.status.as_str(),
                    order_index
                ])?;
                order_index += 1;
                section_rows += 1;
                pending.extend(
                    node.children
                        .iter()
                        .rev()
                        .map(|child| (Some(node.id.as_str()), child)),
                );
            }
        }

        {
            let mut statement = tx.prepare(
                "
                INSERT INTO report_recommendations(
                  report_id, recommendation_id, type, priority, title,
                  confidence_score, estimated_time_minutes, effectiveness_estimate,
                  order_index
                )
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
            )?;
            for (order_index, recommendation) in report.recommendations.iter().enumerate() {
                statement.execute(params![
                    &report_id,
                    &recommendation.id,
                    recommendation.recommendation_type.as_str(),
                    recommendation.priority.as_str(),
                    &recommendation.title,
                    recommendation.confidence_score,
                    recommendation.estimated_time_minutes,
                    recommendation.effectiveness_estimate,
                    order_index as i64
                ])?;
            }
        }

        tx.commit()?;

        info!(
            report_id = %report_id,
            document_id = %report.document_id,
            sections = section_rows,
            recommendations = report.recommendations.len(),
            "stored analysis report"
        );
        Ok(())
    }
}

fn report_id_for(document_id: &str, source_hash: &str) -> String {
    let prefix = source_hash.get(..16).unwrap_or(source_hash);
    format!("{document_id}:{prefix}")
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reports (
              report_id TEXT PRIMARY KEY,
              document_id TEXT NOT NULL,
              source_hash TEXT NOT NULL,
              analyzed_at TEXT NOT NULL,
              flow_score INTEGER NOT NULL,
              compliance_score INTEGER NOT NULL,
              recommendation_source TEXT NOT NULL,
              total_chapters INTEGER NOT NULL,
              total_sections INTEGER NOT NULL,
              total_word_count INTEGER NOT NULL,
              average_quality INTEGER NOT NULL,
              report_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS report_sections (
              report_id TEXT NOT NULL,
              section_id TEXT NOT NULL,
              parent_section_id TEXT,
              kind TEXT NOT NULL,
              title TEXT NOT NULL,
              word_count INTEGER NOT NULL,
              quality_score INTEGER NOT NULL,
              status TEXT NOT NULL,
              order_index INTEGER NOT NULL,
              PRIMARY KEY (report_id, section_id),
              FOREIGN KEY(report_id) REFERENCES reports(report_id)
            );

            CREATE TABLE IF NOT EXISTS report_recommendations (
              report_id TEXT NOT NULL,
              recommendation_id TEXT NOT NULL,
              type TEXT NOT NULL,
              priority TEXT NOT NULL,
              title TEXT NOT NULL,
              confidence_score INTEGER NOT NULL,
              estimated_time_minutes INTEGER NOT NULL,
              effectiveness_estimate INTEGER NOT NULL,
              order_index INTEGER NOT NULL,
              PRIMARY KEY (report_id, recommendation_id),
              FOREIGN KEY(report_id) REFERENCES reports(report_id)
            );

            CREATE INDEX IF NOT EXISTS idx_reports_document ON reports(document_id, analyzed_at);
            ",
        )
        .context("failed to initialize report schema")?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;

    debug!(schema_version = DB_SCHEMA_VERSION, "report schema ready");
    Ok(())
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to run count query: {sql}"))?;
    Ok(count)
}
