use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::model::{CitationRecord, StructureAnalysisResult};

pub mod outline;
pub mod prompt;
pub mod suggestions;

const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub trait StructureExtractor: Send + Sync {
    fn extract(&self, prompt: &str, timeout: Duration) -> Result<String>;
}

pub trait RecommendationAdvisor: Send + Sync {
    fn advise(&self, prompt: &str, timeout: Duration) -> Result<String>;
}

pub trait CitationSource: Send + Sync {
    fn citations(&self, document_id: &str) -> Result<Vec<CitationRecord>>;
}

pub trait ReportSink {
    fn store(&mut self, report: &StructureAnalysisResult, source_hash: &str) -> Result<()>;
}

impl<F> StructureExtractor for F
where
    F: Fn(&str, Duration) -> Result<String> + Send + Sync,
{
    fn extract(&self, prompt: &str, timeout: Duration) -> Result<String> {
        self(prompt, timeout)
    }
}

impl CitationSource for Vec<CitationRecord> {
    fn citations(&self, _document_id: &str) -> Result<Vec<CitationRecord>> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone)]
pub struct JsonCitationFile {
    path: PathBuf,
}

impl JsonCitationFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CitationSource for JsonCitationFile {
    fn citations(&self, document_id: &str) -> Result<Vec<CitationRecord>> {
        let raw = fs::read(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let records: Vec<CitationRecord> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        debug!(
            document_id = %document_id,
            path = %self.path.display(),
            citation_count = records.len(),
            "loaded citations"
        );
        Ok(records)
    }
}

/// Prompt on stdin, response on stdout; killed once the timeout elapses.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Splits a command line on whitespace; no shell quoting is applied.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(ToOwned::to_owned);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn run(&self, input: &str, timeout: Duration) -> Result<String> {
        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to execute {}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .with_context(|| format!("stdin unavailable for {}", self.program))?;
        let payload = input.as_bytes().to_vec();
        let writer = thread::spawn(move || stdin.write_all(&payload));

        let stdout = child
            .stdout
            .take()
            .with_context(|| format!("stdout unavailable for {}", self.program))?;
        let stderr = child
            .stderr
            .take()
            .with_context(|| format!("stderr unavailable for {}", self.program))?;
        let stdout_reader = thread::spawn(move || read_to_string_lossy(stdout));
        let stderr_reader = thread::spawn(move || read_to_string_lossy(stderr));

        let status = loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to poll {}", self.program))?
            {
                break status;
            }

            if started.elapsed() >= timeout {
                if let Err(err) = child.kill() {
                    warn!(program = %self.program, error = %err, "failed to kill timed-out collaborator");
                }
                let _ = child.wait();
                bail!(
                    "{} exceeded timeout of {} ms",
                    self.program,
                    timeout.as_millis()
                );
            }

            thread::sleep(CHILD_POLL_INTERVAL);
        };

        if let Ok(Err(err)) = writer.join() {
            debug!(program = %self.program, error = %err, "collaborator closed stdin early");
        }
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            bail!(
                "{} returned non-zero exit status: {}",
                self.program,
                stderr.trim()
            );
        }

        debug!(
            program = %self.program,
            elapsed_ms = started.elapsed().as_millis() as u64,
            response_bytes = stdout.len(),
            "collaborator responded"
        );

        Ok(stdout)
    }
}

impl StructureExtractor for ExternalCommand {
    fn extract(&self, prompt: &str, timeout: Duration) -> Result<String> {
        self.run(prompt, timeout)
    }
}

impl RecommendationAdvisor for ExternalCommand {
    fn advise(&self, prompt: &str, timeout: Duration) -> Result<String> {
        self.run(prompt, timeout)
    }
}

fn read_to_string_lossy(mut source: impl Read) -> String {
    let mut buf = Vec::new();
    if source.read_to_end(&mut buf).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

pub(crate) fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_splits_program_and_arguments() {
        let command = ExternalCommand::from_command_line("  llm-cli --model thesis  ")
            .expect("command should parse");
        assert_eq!(command.program(), "llm-cli");
        assert_eq!(command.args, vec!["--model", "thesis"]);
        assert!(ExternalCommand::from_command_line("   ").is_none());
    }

    #[test]
    fn code_fences_are_removed() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("  # Intro  "), "# Intro");
    }

    #[test]
    fn vector_citation_source_returns_its_records() {
        let records = vec![CitationRecord {
            id: "c1".to_string(),
            title: Some("Smith 2020".to_string()),
            content: None,
        }];
        let loaded = records
            .citations("doc-1")
            .expect("in-memory citations should load");
        assert_eq!(loaded, records);
    }

    #[cfg(unix)]
    #[test]
    fn external_command_echoes_stdin() {
        let command = ExternalCommand::new("cat", Vec::new());
        let output = command
            .run("# Chapter 1: Introduction", Duration::from_secs(10))
            .expect("cat should echo input");
        assert_eq!(output, "# Chapter 1: Introduction");
    }

    #[cfg(unix)]
    #[test]
    fn external_command_is_killed_after_timeout() {
        let command = ExternalCommand::new("sleep", vec!["5".to_string()]);
        let error = command
            .run("", Duration::from_millis(100))
            .expect_err("sleep should time out");
        assert!(
            error.to_string().contains("exceeded timeout"),
            "unexpected error: {error}"
        );
    }
}
