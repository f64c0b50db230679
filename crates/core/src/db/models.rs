use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::services::orchestrator::RunSummary;

/// Input mode a run was started in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One source file, one JSON file per function.
    File,
    /// Triple-split compressed JSON-lines corpus.
    Corpus,
    /// JSON lines on stdin, JSON lines on stdout.
    Stream,
    /// Directory list on stdin, mirrored output tree.
    Dirs,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::File => "file",
            RunMode::Corpus => "corpus",
            RunMode::Stream => "stream",
            RunMode::Dirs => "dirs",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(RunMode::File),
            "corpus" => Ok(RunMode::Corpus),
            "stream" => Ok(RunMode::Stream),
            "dirs" => Ok(RunMode::Dirs),
            other => Err(format!("Unknown run mode '{other}'")),
        }
    }
}

/// Final state of a recorded run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Succeeded,
    /// Aborted on unrecoverable I/O; counters reflect what was drained.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }

    /// Decode from the TEXT column; unknown values read as failed.
    pub fn from_db(value: &str) -> Self {
        match value {
            "succeeded" => RunStatus::Succeeded,
            _ => RunStatus::Failed,
        }
    }
}

/// Current UTC time in RFC 3339, the format of `started_at`/`finished_at`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339()
}

/// One pipeline run as stored in `extraction_runs`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub mode: RunMode,
    /// Input description (path, or `-` for stdin).
    pub input: String,
    pub output: Option<String>,
    pub status: RunStatus,
    pub started_at: String,
    pub finished_at: String,
    pub summary: RunSummary,
}
