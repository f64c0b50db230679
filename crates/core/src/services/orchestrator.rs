//! Batch orchestrator: parallel fan-out over targets, serial fan-in.
//!
//! Workers run gate, extraction and normalization for one target at a time
//! on a fixed-size rayon pool, each with its own extractor instances. A
//! single consumer (the calling thread) receives finished targets over a
//! bounded channel and owns the dedup ledger, the summary counters and the
//! sink. Completion order across targets is arbitrary; the order of records
//! within one target is the extractor's order.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dedup::DedupLedger;
use crate::layout::Partition;
use crate::model::{Granularity, Language, NormalizedRecord};
use crate::normalize::{
    has_accepted_shape, normalize, prepare_blob, NormalizeOptions, RecordContext,
};
use crate::services::extractors::{ExtractorRegistry, WorkerExtractors};
use crate::services::gate::{validate_and_extract, GateOutcome, GateRejection};
use crate::sinks::{RecordSink, SinkError};

/// One unit of work: a blob of source in a known language.
///
/// Blob bytes are read before dispatch so workers never block on input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub language: Language,
    pub granularity: Granularity,
    pub blob: String,
    pub partition: Partition,
    pub context: RecordContext,
}

impl Target {
    pub fn new(language: Language, blob: impl Into<String>, partition: Partition) -> Self {
        Self {
            language,
            granularity: Granularity::File,
            blob: blob.into(),
            partition,
            context: RecordContext::default(),
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_context(mut self, context: RecordContext) -> Self {
        self.context = context;
        self
    }
}

/// How a target left the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Passed the gate; records may still be filtered by the consumer.
    Accepted,
    /// Failed validation, extraction or panicked.
    ParseFailure,
    /// No extractor could be built for the target's language.
    Unsupported,
}

/// Worker result for one target, handed to the consumer.
#[derive(Debug)]
pub struct TargetOutcome {
    pub status: TargetStatus,
    pub partition: Partition,
    pub records: Vec<NormalizedRecord>,
}

/// End-of-run counters; every field is derivable from a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub targets: usize,
    /// Targets that passed the validator gate.
    pub accepted: usize,
    pub parse_failures: usize,
    /// Records dropped by the per-language shape filter.
    pub format_mismatches: usize,
    /// Records dropped because their hash was already emitted.
    pub duplicates: usize,
    pub emitted: usize,
    /// Targets skipped because their language has no extractor.
    pub unsupported: usize,
}

impl RunSummary {
    /// Accepted targets over processed targets, never dividing by zero.
    pub fn parse_success_rate(&self) -> f64 {
        self.accepted as f64 / self.targets.max(1) as f64
    }

    /// Count a target that never reached a worker because its input was unreadable.
    pub fn record_parse_failure(&mut self) {
        self.targets += 1;
        self.parse_failures += 1;
    }

    /// Count a target whose language is unknown to this build.
    pub fn record_unsupported(&mut self) {
        self.targets += 1;
        self.unsupported += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Worker pool size.
    pub workers: usize,
    /// Targets per dispatched chunk; also the result queue bound.
    pub chunk_size: usize,
    pub normalize: NormalizeOptions,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Drives targets through the pipeline and into a sink.
///
/// The ledger persists across calls to [`BatchOrchestrator::process_chunk`],
/// so one orchestrator equals one dedup scope.
pub struct BatchOrchestrator {
    registry: ExtractorRegistry,
    pool: ThreadPool,
    options: OrchestratorOptions,
    ledger: DedupLedger,
    summary: RunSummary,
}

impl BatchOrchestrator {
    pub fn new(
        registry: ExtractorRegistry,
        options: OrchestratorOptions,
    ) -> Result<Self, OrchestratorError> {
        Self::with_ledger(registry, options, DedupLedger::new())
    }

    /// Start from an existing ledger, e.g. one carried over from an earlier run.
    pub fn with_ledger(
        registry: ExtractorRegistry,
        options: OrchestratorOptions,
        ledger: DedupLedger,
    ) -> Result<Self, OrchestratorError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.workers.max(1))
            .thread_name(|idx| format!("extract-worker-{idx}"))
            .build()?;
        Ok(Self { registry, pool, options, ledger, summary: RunSummary::default() })
    }

    pub fn chunk_size(&self) -> usize {
        self.options.chunk_size.max(1)
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn summary_mut(&mut self) -> &mut RunSummary {
        &mut self.summary
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn into_parts(self) -> (DedupLedger, RunSummary) {
        (self.ledger, self.summary)
    }

    /// Process every target of `targets`, dispatching in chunks.
    pub fn run<I>(
        &mut self,
        targets: I,
        sink: &mut dyn RecordSink,
    ) -> Result<(), OrchestratorError>
    where
        I: IntoIterator<Item = Target>,
    {
        let chunk_size = self.chunk_size();
        let mut chunk = Vec::with_capacity(chunk_size);
        for target in targets {
            chunk.push(target);
            if chunk.len() == chunk_size {
                self.process_chunk(std::mem::take(&mut chunk), sink)?;
            }
        }
        self.process_chunk(chunk, sink)
    }

    /// Fan one chunk out to the pool and merge results as they complete.
    ///
    /// Only a sink failure is returned; every per-target problem is counted.
    pub fn process_chunk(
        &mut self,
        targets: Vec<Target>,
        sink: &mut dyn RecordSink,
    ) -> Result<(), OrchestratorError> {
        if targets.is_empty() {
            return Ok(());
        }
        let Self { registry, pool, options, ledger, summary } = self;
        let (registry, pool) = (&*registry, &*pool);
        let normalize_options = &options.normalize;
        let (tx, rx) = crossbeam_channel::bounded::<TargetOutcome>(options.chunk_size.max(1));

        std::thread::scope(|scope| -> Result<(), OrchestratorError> {
            scope.spawn(move || {
                pool.install(|| {
                    targets.into_par_iter().for_each_init(
                        || registry.worker(),
                        |extractors, target| {
                            let outcome = process_target(extractors, target, normalize_options);
                            // The receiver only hangs up after a sink failure.
                            let _ = tx.send(outcome);
                        },
                    );
                });
            });

            for outcome in rx {
                absorb(ledger, summary, outcome, sink)?;
            }
            Ok(())
        })
    }
}

/// Worker side: gate, extract and normalize one target.
fn process_target(
    extractors: &mut WorkerExtractors<'_>,
    target: Target,
    options: &NormalizeOptions,
) -> TargetOutcome {
    let Target { language, granularity, blob, partition, context } = target;
    let extractor = match extractors.get(language) {
        Ok(extractor) => extractor,
        Err(err) => {
            debug!("skipping {language} target: {err}");
            return TargetOutcome { status: TargetStatus::Unsupported, partition, records: vec![] };
        }
    };

    let prepared = prepare_blob(language, granularity, &blob, options);
    match validate_and_extract(extractor, &prepared) {
        GateOutcome::Accepted(units) => {
            let records = units.iter().map(|unit| normalize(unit, &context, options)).collect();
            TargetOutcome { status: TargetStatus::Accepted, partition, records }
        }
        GateOutcome::Rejected(rejection) => {
            match &rejection {
                GateRejection::Invalid => {
                    debug!("{language} target failed validation ({:?})", context.from_file)
                }
                GateRejection::Extractor(err) => warn!("{language} extraction failed: {err}"),
                GateRejection::Panicked(msg) => {
                    warn!("{language} extractor panicked: {msg}");
                    extractors.discard(language);
                }
            }
            TargetOutcome { status: TargetStatus::ParseFailure, partition, records: vec![] }
        }
    }
}

/// Consumer side: count, filter, dedup and write one target's records.
fn absorb(
    ledger: &mut DedupLedger,
    summary: &mut RunSummary,
    outcome: TargetOutcome,
    sink: &mut dyn RecordSink,
) -> Result<(), OrchestratorError> {
    summary.targets += 1;
    match outcome.status {
        TargetStatus::Accepted => summary.accepted += 1,
        TargetStatus::ParseFailure => summary.parse_failures += 1,
        TargetStatus::Unsupported => summary.unsupported += 1,
    }

    for record in outcome.records {
        if !has_accepted_shape(&record) {
            debug!("format mismatch for {} ({})", record.identifier, record.language);
            summary.format_mismatches += 1;
            continue;
        }
        if !ledger.admit(&record.sha256_hash) {
            summary.duplicates += 1;
            continue;
        }
        sink.write(&outcome.partition, &record)?;
        summary.emitted += 1;
    }
    Ok(())
}
