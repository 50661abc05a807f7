//! Error types for the triage pipeline.
//!
//! Only runner and report acquisition errors reach `main`. Everything else is
//! absorbed where it happens and replaced by placeholder text.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("runner command is empty")]
    EmptyCommand,

    #[error("invalid runner command: {0}")]
    InvalidCommand(#[from] shell_words::ParseError),

    #[error("failed to spawn `{program}`: {source}")]
    RunnerSpawn {
        program: String,
        source: std::io::Error,
    },

    #[error("test run exceeded {0}s")]
    RunnerTimeout(u64),

    #[error("test run produced no structured report (exit code {code:?})")]
    NoReport { code: Option<i32> },

    #[error("report parse error: {0}")]
    ReportParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("enrichment service returned {status}")]
    EnrichmentStatus { status: reqwest::StatusCode },

    #[error("enrichment response had no content")]
    EmptyEnrichment,
}

pub type TriageResult<T> = Result<T, TriageError>;
