use std::io::{self, Write};

use anyhow::Result;

use function_parser_core::config::PipelineConfig;
use function_parser_core::db::RunMode;
use function_parser_core::layout::Partition;
use function_parser_core::normalize::RecordContext;
use function_parser_core::services::orchestrator::{RunSummary, Target};
use function_parser_core::sinks::{JsonLinesSink, RecordSink};

use super::util::{execute_run, feed_json_lines, RunTarget};

/// JSON lines on stdin to normalized JSON lines on stdout.
///
/// One orchestrator, and therefore one dedup ledger, lives for the whole stream.
pub fn stream_command(config: &PipelineConfig) -> Result<RunSummary> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    stream_records(config, stdin.lock(), stdout.lock())
}

/// Stream mode over arbitrary reader/writer pairs.
pub fn stream_records<R, W>(config: &PipelineConfig, reader: R, writer: W) -> Result<RunSummary>
where
    R: io::BufRead,
    W: Write,
{
    let mut sink = JsonLinesSink::new(writer, "<stdout>");
    let run = RunTarget { mode: RunMode::Stream, input: "-".into(), output: Some("-".into()) };
    execute_run(config, run, |orchestrator| {
        feed_json_lines(reader, "<stdin>", orchestrator, &mut sink, |input, language| {
            let context = RecordContext { split: None, from_file: input.path };
            Target::new(language, input.code, Partition::Single)
                .with_granularity(input.granularity)
                .with_context(context)
        })?;
        sink.finish()?;
        Ok(())
    })
}
