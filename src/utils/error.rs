//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that stop a run while classifying lines.
///
/// These only fire on lines that already matched a request pattern.
/// A matched line we cannot fully decode leaves the correlator with a
/// request it can never account for, so the run aborts. Lines that
/// match no pattern at all are skipped silently and never error.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("malformed timestamp '{stamp}': {source}")]
    Timestamp {
        stamp: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("malformed numeric field {field}: '{value}'")]
    Number { field: &'static str, value: String },
}

/// Errors that can occur while writing the output table.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write output: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("invalid output path: {0}")]
    InvalidPath(String),
}
