use std::fs;

use anyhow::{Context, Result};

use function_parser_core::config::PipelineConfig;
use function_parser_core::db::RunMode;
use function_parser_core::layout::{OutputLayout, Partition};
use function_parser_core::model::Language;
use function_parser_core::normalize::RecordContext;
use function_parser_core::services::orchestrator::{RunSummary, Target};
use function_parser_core::sinks::{PerFunctionSink, RecordSink};

use super::util::{execute_run, RunTarget};
use crate::canonicalize_or_current;

/// Extract one source file into `<sha>.json` + `<sha>.<ext>` pairs under `output_dir`.
pub fn file_command(
    config: &PipelineConfig,
    language: Language,
    input: &str,
    output_dir: &str,
) -> Result<RunSummary> {
    let input_path = canonicalize_or_current(input)?;
    let output_root = canonicalize_or_current(output_dir)?;
    let blob = fs::read_to_string(&input_path)
        .with_context(|| format!("Failed to read source file {}", input_path.display()))?;
    let mut sink = PerFunctionSink::new(OutputLayout::new(&output_root)).with_context(|| {
        format!("Failed to create output directory {}", output_root.display())
    })?;

    let run = RunTarget {
        mode: RunMode::File,
        input: input_path.display().to_string(),
        output: Some(output_root.display().to_string()),
    };
    let context = RecordContext { split: None, from_file: Some(input.to_string()) };
    let summary = execute_run(config, run, |orchestrator| {
        let target = Target::new(language, blob, Partition::Single).with_context(context);
        orchestrator.run(vec![target], &mut sink)?;
        sink.finish()?;
        Ok(())
    })?;

    println!("Wrote {} function(s) to {}", sink.written(), output_root.display());
    Ok(summary)
}
