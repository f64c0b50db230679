use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::db::{RunMode, RunRecord, RunStatus};
use crate::services::orchestrator::RunSummary;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for run database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// A stored mode string this build does not know.
    #[error("Invalid run mode in database: {0}")]
    InvalidMode(String),
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed run history.
///
/// Thin wrapper around `rusqlite::Connection` responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Inserting and listing run records.
#[derive(Debug)]
pub struct RunDb {
    conn: Connection,
}

impl RunDb {
    /// Open (or create) a run database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a run record and return its row id.
    pub fn insert_run(&self, record: &RunRecord) -> DbResult<i64> {
        let s = &record.summary;
        self.conn.execute(
            r#"
            INSERT INTO extraction_runs (
                mode, input, output, status, started_at, finished_at,
                targets, accepted, parse_failures, format_mismatches, emitted,
                duplicates, unsupported
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.mode.as_str(),
                record.input,
                record.output,
                record.status.as_str(),
                record.started_at,
                record.finished_at,
                s.targets as i64,
                s.accepted as i64,
                s.parse_failures as i64,
                s.format_mismatches as i64,
                s.emitted as i64,
                s.duplicates as i64,
                s.unsupported as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List runs (oldest first), optionally filtered by mode.
    pub fn list_runs(&self, mode_filter: Option<RunMode>) -> DbResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT mode, input, output, status, started_at, finished_at,
                   targets, accepted, parse_failures, format_mismatches, emitted,
                   duplicates, unsupported
            FROM extraction_runs
            WHERE (?1 IS NULL OR mode = ?1)
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![mode_filter.map(|m| m.as_str())], |row| {
            let count = |idx: usize| -> rusqlite::Result<usize> {
                Ok(row.get::<_, i64>(idx)?.max(0) as usize)
            };
            let mode: String = row.get(0)?;
            let status: String = row.get(3)?;
            let summary = RunSummary {
                targets: count(6)?,
                accepted: count(7)?,
                parse_failures: count(8)?,
                format_mismatches: count(9)?,
                emitted: count(10)?,
                duplicates: count(11)?,
                unsupported: count(12)?,
            };
            Ok((
                mode,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                RunStatus::from_db(&status),
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                summary,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (mode, input, output, status, started_at, finished_at, summary) = row?;
            let mode = mode.parse::<RunMode>().map_err(|_| DbError::InvalidMode(mode))?;
            out.push(RunRecord { mode, input, output, status, started_at, finished_at, summary });
        }
        Ok(out)
    }
}

fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        // Initial schema.
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS extraction_runs (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                mode              TEXT NOT NULL,
                input             TEXT NOT NULL,
                output            TEXT,
                status            TEXT NOT NULL,
                started_at        TEXT NOT NULL,
                finished_at       TEXT NOT NULL,
                targets           INTEGER NOT NULL DEFAULT 0,
                accepted          INTEGER NOT NULL DEFAULT 0,
                parse_failures    INTEGER NOT NULL DEFAULT 0,
                format_mismatches INTEGER NOT NULL DEFAULT 0,
                emitted           INTEGER NOT NULL DEFAULT 0
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            ALTER TABLE extraction_runs ADD COLUMN duplicates INTEGER NOT NULL DEFAULT 0;
            ALTER TABLE extraction_runs ADD COLUMN unsupported INTEGER NOT NULL DEFAULT 0;
            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
