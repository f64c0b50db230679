use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;

use function_parser_core::config::PipelineConfig;
use function_parser_core::services::orchestrator::RunSummary;

pub mod commands;

/// Options accepted by every subcommand. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Pipeline config file (.yaml, .yml or .json).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Worker threads. Defaults to the number of available CPUs.
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Targets dispatched per chunk; bounds in-flight results.
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Diagnostic level: trace, debug, info, warn or error.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// SQLite file to record run history in.
    #[arg(long, global = true)]
    pub runs_db: Option<String>,

    /// Omit `identifier_scope` from emitted records.
    #[arg(long, global = true, default_value_t = false)]
    pub no_scope: bool,
}

impl GlobalArgs {
    /// Load the config file (if any) and apply flag overrides on top.
    pub fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(db) = &self.runs_db {
            config.runs_db = Some(db.clone());
        }
        if self.no_scope {
            config.retain_scope = false;
        }
        Ok(config)
    }
}

/// Install the stderr `tracing` subscriber. Repeated calls keep the first one.
pub fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level =
        level.trim().parse().map_err(|_| anyhow!("Invalid log level '{level}'"))?;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}

/// Human-readable run counters; always goes to stderr so stdout stays data-only.
pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "Targets: {}\n\
         Accepted: {} (parse success rate {:.1}%)\n\
         Parse failures: {}\n\
         Format mismatches: {}\n\
         Duplicates: {}\n\
         Unsupported: {}\n\
         Functions emitted: {}",
        summary.targets,
        summary.accepted,
        summary.parse_success_rate() * 100.0,
        summary.parse_failures,
        summary.format_mismatches,
        summary.duplicates,
        summary.unsupported,
        summary.emitted,
    )
}

pub fn print_summary(summary: &RunSummary) {
    eprintln!("{}", format_summary(summary));
}

/// Canonicalize a path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);
    if path == Path::new(".") {
        return env::current_dir().context("Failed to get current directory");
    }
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(path))
        }
    }
}
