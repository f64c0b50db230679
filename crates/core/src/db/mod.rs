//! Run-history database.
//!
//! A small SQLite database recording one row per pipeline run so corpus
//! builds can be audited and compared after the fact:
//! - `RunDb`: connection wrapper with forward-only schema migrations.
//! - `RunRecord`/`RunMode`/`RunStatus`: what lives in the `extraction_runs` table.

pub mod models;
pub mod run_db;

pub use models::*;
pub use run_db::*;
