use std::collections::BTreeSet;

use function_parser_core::layout::Partition;
use function_parser_core::model::{Granularity, Language, Split};
use function_parser_core::normalize::{content_hash, NormalizeOptions, RecordContext};
use function_parser_core::services::extractors::default_extractor_registry;
use function_parser_core::services::orchestrator::{
    BatchOrchestrator, OrchestratorOptions, RunSummary, Target,
};
use function_parser_core::sinks::CollectingSink;

const PYTHON_FILE: &str = r#"
def getUserID2(user):
    return user.id

class Repo:
    def fetch_all(self, limit=10):
        return []
"#;

const GO_FILE: &str = r#"
package main

type Server struct{}

func (s *Server) Start() error {
	return nil
}

func main() {}
"#;

fn orchestrator() -> BatchOrchestrator {
    let options =
        OrchestratorOptions { workers: 4, chunk_size: 3, normalize: NormalizeOptions::default() };
    BatchOrchestrator::new(default_extractor_registry(), options).expect("build orchestrator")
}

fn run_all(targets: Vec<Target>) -> (CollectingSink, RunSummary) {
    let mut orch = orchestrator();
    let mut sink = CollectingSink::new();
    orch.run(targets, &mut sink).expect("run");
    let (_, summary) = orch.into_parts();
    (sink, summary)
}

fn corpus_targets() -> Vec<Target> {
    let mut targets = Vec::new();
    for (i, split) in Split::ALL.into_iter().enumerate() {
        let context = RecordContext { split: Some(split), from_file: None };
        targets.push(
            Target::new(Language::Python, PYTHON_FILE, Partition::Split(split))
                .with_context(context.clone()),
        );
        targets.push(
            Target::new(Language::Go, GO_FILE, Partition::Split(split))
                .with_context(context.clone()),
        );
        let method = format!("int f{i}(){{ return {i}; }}");
        targets.push(
            Target::new(Language::Java, method, Partition::Split(split))
                .with_granularity(Granularity::Method)
                .with_context(context),
        );
    }
    targets
}

#[test]
fn wrapped_java_method_is_accepted() {
    let target = Target::new(Language::Java, "void m(){}", Partition::Single)
        .with_granularity(Granularity::Method);
    let (sink, summary) = run_all(vec![target]);

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.emitted, 1);
    let (_, record) = &sink.records[0];
    assert_eq!(record.source_code, "class WRAPPER {\nvoid m(){}\n}\n");
    assert_eq!(record.identifier, "m");
    assert_eq!(record.identifier_scope.as_deref(), Some("WRAPPER::"));
    assert_eq!(record.elided_tokens, vec!["void", "m", "("]);
    assert_eq!(record.source_tokens, vec![")", "{", "}"]);
    assert_eq!(record.sha256_hash, content_hash("void m(){}"));
}

#[test]
fn abstract_java_method_is_a_format_mismatch() {
    let target = Target::new(Language::Java, "abstract void m();", Partition::Single)
        .with_granularity(Granularity::Method);
    let (sink, summary) = run_all(vec![target]);

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.format_mismatches, 1);
    assert_eq!(summary.emitted, 0);
    assert!(sink.records.is_empty());
}

#[test]
fn unbalanced_java_method_fails_validation() {
    // The wrapped blob no longer parses, so the gate rejects it before the
    // shape filter runs: a parse failure, not a format mismatch.
    let target = Target::new(Language::Java, "void m(){", Partition::Single)
        .with_granularity(Granularity::Method);
    let (_, summary) = run_all(vec![target]);
    assert_eq!(summary.parse_failures, 1);
    assert_eq!(summary.emitted, 0);
}

#[test]
fn python_and_go_files_are_split_into_records() {
    let targets = vec![
        Target::new(Language::Python, PYTHON_FILE, Partition::Single),
        Target::new(Language::Go, GO_FILE, Partition::Single),
    ];
    let (sink, summary) = run_all(targets);
    assert_eq!(summary.emitted, 4);

    let python = sink
        .records
        .iter()
        .map(|(_, r)| r)
        .find(|r| r.identifier == "getUserID2")
        .expect("python function");
    assert_eq!(python.target_tokens, vec!["get", "user", "id", "2"]);
    assert_eq!(python.identifier_scope.as_deref(), Some("::"));
    assert_eq!(python.elided_tokens, vec!["def", "getUserID2", "("]);

    let method = sink
        .records
        .iter()
        .map(|(_, r)| r)
        .find(|r| r.identifier == "Start")
        .expect("go method");
    assert_eq!(method.identifier_scope.as_deref(), Some("Server::"));
    assert_eq!(method.language, Language::Go);
}

#[test]
fn broken_python_is_counted_and_does_not_stop_the_run() {
    let targets = vec![
        Target::new(Language::Python, "def broken(:\n  pass\n", Partition::Single),
        Target::new(Language::Python, PYTHON_FILE, Partition::Single),
    ];
    let (_, summary) = run_all(targets);
    assert_eq!(summary.targets, 2);
    assert_eq!(summary.parse_failures, 1);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.emitted, 2);
}

#[test]
fn corpus_run_is_idempotent_and_duplicate_free() {
    let (first, first_summary) = run_all(corpus_targets());
    let (second, second_summary) = run_all(corpus_targets());

    let first_hashes: BTreeSet<&str> = first.hashes().into_iter().collect();
    let second_hashes: BTreeSet<&str> = second.hashes().into_iter().collect();
    assert_eq!(first_hashes, second_hashes);
    assert_eq!(first_hashes.len(), first.records.len());
    assert_eq!(first_summary, second_summary);

    // Identical Python/Go files appear once per split but are emitted once.
    assert_eq!(first_summary.emitted, 4 + 3);
    assert_eq!(first_summary.duplicates, 8);
}

#[test]
fn records_keep_their_split() {
    let (sink, _) = run_all(corpus_targets());
    for (partition, record) in &sink.records {
        let split = record.split.expect("split recorded");
        assert_eq!(partition, &Partition::Split(split));
    }
}
