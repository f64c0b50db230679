use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use function_parser_core::config::PipelineConfig;
use function_parser_core::db::{timestamp_now, RunDb, RunMode, RunRecord, RunStatus};
use function_parser_core::model::{Granularity, Language};
use function_parser_core::services::extractors::default_extractor_registry;
use function_parser_core::services::orchestrator::{BatchOrchestrator, RunSummary, Target};
use function_parser_core::sinks::RecordSink;

use crate::print_summary;

/// One line of a JSON-lines corpus or stdin stream. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct InputLine {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub granularity: Granularity,
    /// Optional provenance, copied to `from_file`.
    #[serde(default)]
    pub path: Option<String>,
}

/// Where a run reads from and writes to, for the run history.
#[derive(Debug, Clone)]
pub struct RunTarget {
    pub mode: RunMode,
    pub input: String,
    pub output: Option<String>,
}

pub fn build_orchestrator(config: &PipelineConfig) -> Result<BatchOrchestrator> {
    BatchOrchestrator::new(default_extractor_registry(), config.orchestrator_options())
        .context("Failed to start worker pool")
}

/// Run `body` against a fresh orchestrator, then print and record the summary.
///
/// The summary is printed even when `body` fails so partial progress is visible.
pub fn execute_run<F>(config: &PipelineConfig, target: RunTarget, body: F) -> Result<RunSummary>
where
    F: FnOnce(&mut BatchOrchestrator) -> Result<()>,
{
    let started_at = timestamp_now();
    let mut orchestrator = build_orchestrator(config)?;
    info!(
        "{} run: input {} with {} workers",
        target.mode,
        target.input,
        config.effective_workers()
    );

    let result = body(&mut orchestrator);
    let (_, summary) = orchestrator.into_parts();
    print_summary(&summary);

    let status = if result.is_ok() { RunStatus::Succeeded } else { RunStatus::Failed };
    if let Some(db_path) = &config.runs_db {
        let record = RunRecord {
            mode: target.mode,
            input: target.input,
            output: target.output,
            status,
            started_at,
            finished_at: timestamp_now(),
            summary: summary.clone(),
        };
        // History is best-effort; a broken ledger never fails the run.
        if let Err(err) = record_run(Path::new(db_path), &record) {
            warn!("Failed to record run in {db_path}: {err:#}");
        }
    }

    result.map(|()| summary)
}

fn record_run(db_path: &Path, record: &RunRecord) -> Result<()> {
    let db = RunDb::open(db_path)
        .with_context(|| format!("Failed to open run database {}", db_path.display()))?;
    db.insert_run(record)?;
    Ok(())
}

/// Feed JSON lines from `reader` through the orchestrator in chunks.
///
/// Malformed lines count as parse failures and unknown languages as
/// unsupported; neither stops the run. Read errors abort it.
pub fn feed_json_lines<R, F>(
    reader: R,
    label: &str,
    orchestrator: &mut BatchOrchestrator,
    sink: &mut dyn RecordSink,
    mut to_target: F,
) -> Result<()>
where
    R: BufRead,
    F: FnMut(InputLine, Language) -> Target,
{
    let chunk_size = orchestrator.chunk_size();
    let mut chunk = Vec::with_capacity(chunk_size);
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {label}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let input: InputLine = match serde_json::from_str(&line) {
            Ok(input) => input,
            Err(err) => {
                warn!("{label}:{}: malformed input line: {err}", idx + 1);
                orchestrator.summary_mut().record_parse_failure();
                continue;
            }
        };
        let language = match input.language.parse::<Language>() {
            Ok(language) => language,
            Err(err) => {
                warn!("{label}:{}: {err}", idx + 1);
                orchestrator.summary_mut().record_unsupported();
                continue;
            }
        };
        chunk.push(to_target(input, language));
        if chunk.len() == chunk_size {
            orchestrator.process_chunk(std::mem::take(&mut chunk), sink)?;
        }
    }
    orchestrator.process_chunk(chunk, sink)?;
    Ok(())
}
