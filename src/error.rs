// Ingest core error types

use thiserror::Error;

/// Fatal, per-run errors.
///
/// Per-file failures never become one of these -- they are captured on
/// the offending `FileEntry` and the run continues. Only a failure that
/// prevents the run from producing a coherent record propagates here.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("copy error: {0}")]
    Copy(String),

    #[error("report write error: {0}")]
    Report(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
