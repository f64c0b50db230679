//! function-parser-core
//!
//! Library side of the function corpus pipeline: split source blobs into
//! function units, normalize them into training records, deduplicate by
//! content hash and write them to partitioned outputs.
//!
//! Everything substantive lives here so it is testable without the CLI.

pub mod config;
pub mod db;
pub mod dedup;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod services;
pub mod sinks;
pub mod tokens;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
