use std::path::Path;

use anyhow::{anyhow, Context, Result};

use function_parser_core::db::{RunDb, RunMode};

/// List recorded runs, oldest first.
pub fn runs_command(db_path: Option<&str>, mode: Option<RunMode>, json: bool) -> Result<()> {
    let db_path = db_path.ok_or_else(|| anyhow!("No run database given (use --db or --runs-db)"))?;
    let path = Path::new(db_path);
    if !path.is_file() {
        return Err(anyhow!("Run database not found at {}", path.display()));
    }
    let db = RunDb::open(path)
        .with_context(|| format!("Failed to open run database {}", path.display()))?;
    let runs = db.list_runs(mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("Runs: (none)");
        return Ok(());
    }

    println!("Runs:");
    for run in runs {
        let s = &run.summary;
        println!(
            "- [{}] {} {} -> {} ({}): {} targets, {} accepted, {} emitted",
            run.started_at,
            run.mode,
            run.input,
            run.output.as_deref().unwrap_or("-"),
            run.status.as_str(),
            s.targets,
            s.accepted,
            s.emitted,
        );
    }
    Ok(())
}
