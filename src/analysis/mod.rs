pub mod classify;
pub mod context;
pub mod diagnose;
pub mod extract;

pub use classify::classify;
pub use context::SourceReader;
pub use diagnose::diagnose;
pub use extract::{extract_failures, unanalyzed_entries};

use crate::models::{FailureAnalysis, RawFailure};
use crate::text::strip_ansi;

pub const MISSING_MESSAGE: &str = "No error message";

/// Build the rule-based analysis for one raw failure. Enrichment is attached later.
pub fn analyze(raw: RawFailure, reader: &SourceReader) -> FailureAnalysis {
    let result = raw.final_result;
    let error = result.error.unwrap_or_default();
    let error_message = error
        .message
        .map(|m| strip_ansi(&m))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| MISSING_MESSAGE.to_string());
    let error_stack = error.stack.map(|s| strip_ansi(&s)).unwrap_or_default();

    let failure_type = classify(&error_message, &error_stack);
    let analysis = diagnose(failure_type, &error_message);
    let source_context = reader.read_context(&raw.file_path, &error_stack);
    let screenshots = result
        .attachments
        .iter()
        .filter(|a| a.is_image())
        .filter_map(|a| a.path.clone())
        .collect();

    FailureAnalysis {
        test_name: raw.test_name,
        suite_name: raw.suite_name,
        file_path: raw.file_path,
        line: raw.line,
        attempts: raw.attempts,
        duration_ms: result.duration.max(0.0) as u64,
        error_message,
        error_stack,
        failure_type,
        analysis,
        source_context,
        screenshots,
        enrichment: None,
    }
}
