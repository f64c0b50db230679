use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use tracing::{info, warn};

use function_parser_core::config::PipelineConfig;
use function_parser_core::db::RunMode;
use function_parser_core::layout::{OutputLayout, Partition};
use function_parser_core::model::Split;
use function_parser_core::normalize::RecordContext;
use function_parser_core::services::orchestrator::{RunSummary, Target};
use function_parser_core::sinks::{PartitionedGzipSink, RecordSink};

use super::util::{execute_run, feed_json_lines, RunTarget};
use crate::canonicalize_or_current;

/// Gzipped JSON-lines shards for one split: `<dir>/<split>.jsonl.gz` and/or
/// every `<dir>/<split>/*.jsonl.gz`, in name order.
pub fn corpus_inputs(dir: &Path, split: Split) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let single = dir.join(format!("{}.jsonl.gz", split.as_str()));
    if single.is_file() {
        files.push(single);
    }

    let nested = dir.join(split.as_str());
    if nested.is_dir() {
        let mut shards = Vec::new();
        for entry in fs::read_dir(&nested)
            .with_context(|| format!("Failed to read {}", nested.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.to_string_lossy().ends_with(".jsonl.gz") {
                shards.push(path);
            }
        }
        shards.sort();
        files.extend(shards);
    }
    Ok(files)
}

/// Process a test/train/valid corpus into `<output>/<split>.jsonl.gz`.
pub fn corpus_command(config: &PipelineConfig, input: &str, output: &str) -> Result<RunSummary> {
    let input_root = canonicalize_or_current(input)?;
    if !input_root.is_dir() {
        bail!("Corpus directory not found: {}", input_root.display());
    }
    let output_root = canonicalize_or_current(output)?;
    let layout = OutputLayout::new(&output_root);

    let mut plan = Vec::new();
    for split in Split::ALL {
        let files = corpus_inputs(&input_root, split)?;
        if files.contains(&layout.split_path(split)) {
            bail!("Output {} would overwrite its own input", layout.split_path(split).display());
        }
        if files.is_empty() {
            warn!("No {split} shards under {}", input_root.display());
        }
        plan.push((split, files));
    }

    let mut sink = PartitionedGzipSink::new(layout);
    let run = RunTarget {
        mode: RunMode::Corpus,
        input: input_root.display().to_string(),
        output: Some(output_root.display().to_string()),
    };
    execute_run(config, run, |orchestrator| {
        for (split, files) in plan {
            let partition = Partition::Split(split);
            sink.open(&partition)?;
            for path in files {
                info!("Reading {split} shard {}", path.display());
                let file = File::open(&path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                let reader = BufReader::new(MultiGzDecoder::new(file));
                let label = path.display().to_string();
                feed_json_lines(reader, &label, orchestrator, &mut sink, |input, language| {
                    let context = RecordContext { split: Some(split), from_file: input.path };
                    Target::new(language, input.code, partition.clone())
                        .with_granularity(input.granularity)
                        .with_context(context)
                })?;
            }
            sink.close(&partition)?;
        }
        sink.finish()?;
        Ok(())
    })
}
