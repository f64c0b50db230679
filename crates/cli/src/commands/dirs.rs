use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use function_parser_core::config::PipelineConfig;
use function_parser_core::db::RunMode;
use function_parser_core::layout::{OutputLayout, Partition};
use function_parser_core::model::Language;
use function_parser_core::normalize::RecordContext;
use function_parser_core::services::orchestrator::{BatchOrchestrator, RunSummary, Target};
use function_parser_core::sinks::{PartitionedGzipSink, RecordSink};

use super::util::{execute_run, RunTarget};
use crate::canonicalize_or_current;

/// Read directory paths from stdin and mirror each one under `output`.
pub fn dirs_command(
    config: &PipelineConfig,
    language: Language,
    output: &str,
) -> Result<RunSummary> {
    let stdin = io::stdin();
    mirror_directories(config, language, stdin.lock(), output)
}

/// Directory mode over any line source. One ledger spans every directory.
pub fn mirror_directories<R: BufRead>(
    config: &PipelineConfig,
    language: Language,
    reader: R,
    output: &str,
) -> Result<RunSummary> {
    let output_root = canonicalize_or_current(output)?;
    let mut sink = PartitionedGzipSink::new(OutputLayout::new(&output_root));
    let run = RunTarget {
        mode: RunMode::Dirs,
        input: "-".into(),
        output: Some(output_root.display().to_string()),
    };
    execute_run(config, run, |orchestrator| {
        for line in reader.lines() {
            let line = line.context("Failed to read directory list")?;
            let dir = line.trim();
            if dir.is_empty() {
                continue;
            }
            mirror_directory(orchestrator, &mut sink, language, Path::new(dir))?;
        }
        sink.finish()?;
        Ok(())
    })
}

fn mirror_directory(
    orchestrator: &mut BatchOrchestrator,
    sink: &mut PartitionedGzipSink,
    language: Language,
    dir: &Path,
) -> Result<()> {
    let files = source_files(dir, language)?;
    info!("{}: {} {language} file(s)", dir.display(), files.len());
    let partition = Partition::Directory(dir.to_path_buf());
    sink.open(&partition)?;

    for batch in files.chunks(orchestrator.chunk_size()) {
        let mut targets = Vec::with_capacity(batch.len());
        for path in batch {
            let Some(blob) = read_source(orchestrator.summary_mut(), path) else {
                continue;
            };
            let relative = path.strip_prefix(dir).unwrap_or(path);
            let context =
                RecordContext { split: None, from_file: Some(relative.display().to_string()) };
            targets.push(Target::new(language, blob, partition.clone()).with_context(context));
        }
        orchestrator.process_chunk(targets, sink)?;
    }

    sink.close(&partition)?;
    Ok(())
}

/// Source text of one file, or `None` (counted as a parse failure) when it
/// cannot be read or is not UTF-8.
fn read_source(summary: &mut RunSummary, path: &Path) -> Option<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Skipping unreadable file {}: {err}", path.display());
            summary.record_parse_failure();
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(blob) => Some(blob),
        Err(_) => {
            warn!("Skipping non-UTF-8 file {}", path.display());
            summary.record_parse_failure();
            None
        }
    }
}

/// Files under `dir` (recursively) whose extension belongs to `language`, sorted.
pub fn source_files(dir: &Path, language: Language) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory {}", current.display()))?
        {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && Language::from_path(&path) == Some(language) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
