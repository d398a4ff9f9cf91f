//! CLI support for sqljson-path
//!
//! Provides programmatic access to the command-line operations so they can
//! be embedded in other tools.

mod convert;
mod execute;

pub use convert::{format_json, parse_json, tri_to_json};
pub use execute::{Command, ExecuteOptions, execute};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Path syntax, compilation or evaluation error
    #[error(transparent)]
    Path(#[from] crate::Error),

    #[error(transparent)]
    Query(#[from] crate::QueryError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}
