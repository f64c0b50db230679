use std::fs;
use std::path::PathBuf;

use function_parser::{canonicalize_or_current, format_summary, GlobalArgs};
use function_parser_core::services::orchestrator::RunSummary;
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_resolves_existing_and_missing_paths() {
    let tmp = tempdir().expect("tempdir");
    let nested = tmp.path().join("nested");
    fs::create_dir_all(&nested).expect("create nested");

    let existing = canonicalize_or_current(nested.to_str().expect("utf-8 path")).expect("resolve");
    assert_eq!(existing, nested.canonicalize().expect("canonicalize nested"));

    let missing = canonicalize_or_current("does-not-exist-yet").expect("resolve missing");
    assert!(missing.is_absolute());
    assert!(missing.ends_with("does-not-exist-yet"));
}

#[test]
fn flags_override_config_file_values() {
    let tmp = tempdir().expect("tempdir");
    let config_path = tmp.path().join("pipeline.yml");
    fs::write(&config_path, "workers: 2\nchunk_size: 8\nlog_level: debug\nruns_db: a.db\n")
        .expect("write config");

    let args = GlobalArgs {
        config: Some(config_path),
        chunk_size: Some(16),
        runs_db: Some("b.db".into()),
        no_scope: true,
        ..Default::default()
    };
    let config = args.resolve().expect("resolve config");
    assert_eq!(config.workers, Some(2));
    assert_eq!(config.chunk_size, 16);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.runs_db.as_deref(), Some("b.db"));
    assert!(!config.retain_scope);
}

#[test]
fn missing_config_file_is_reported() {
    let args = GlobalArgs {
        config: Some(PathBuf::from("/definitely/not/here.yaml")),
        ..Default::default()
    };
    let err = args.resolve().expect_err("missing config must fail");
    assert!(format!("{err:#}").contains("here.yaml"));
}

#[test]
fn summary_rate_survives_zero_targets() {
    let text = format_summary(&RunSummary::default());
    assert!(text.contains("Targets: 0"));
    assert!(text.contains("parse success rate 0.0%"));

    let summary = RunSummary { targets: 4, accepted: 3, emitted: 9, ..Default::default() };
    let text = format_summary(&summary);
    assert!(text.contains("parse success rate 75.0%"));
    assert!(text.contains("Functions emitted: 9"));
}
