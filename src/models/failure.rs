use std::fmt;

use serde::{Deserialize, Serialize};

use super::report::TestResult;

/// A failed test entry flattened out of the result tree.
#[derive(Debug, Clone)]
pub struct RawFailure {
    pub test_name: String,
    /// Ancestor suite titles joined with [`SUITE_SEPARATOR`].
    pub suite_name: String,
    pub file_path: String,
    pub line: u32,
    pub attempts: usize,
    pub final_result: TestResult,
}

pub const SUITE_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureType {
    SelectorNotFound,
    Timeout,
    AssertionMismatch,
    NavigationError,
    NetworkError,
    Unknown,
}

impl FailureType {
    pub fn label(&self) -> &'static str {
        match self {
            FailureType::SelectorNotFound => "SELECTOR_NOT_FOUND",
            FailureType::Timeout => "TIMEOUT",
            FailureType::AssertionMismatch => "ASSERTION_MISMATCH",
            FailureType::NavigationError => "NAVIGATION_ERROR",
            FailureType::NetworkError => "NETWORK_ERROR",
            FailureType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    /// Part of the closed priority set and its ranking; no diagnosis rule emits it.
    #[allow(dead_code)]
    Low,
}

impl Priority {
    /// Display ordering: critical > high > medium > low.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 3,
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Priority::Critical => "🔴",
            Priority::High => "🟠",
            Priority::Medium => "🟡",
            Priority::Low => "🟢",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAnalysis {
    pub root_cause: String,
    pub suggested_fix: String,
    pub priority: Priority,
}

/// Everything the report needs to know about one failed test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureAnalysis {
    pub test_name: String,
    pub suite_name: String,
    pub file_path: String,
    pub line: u32,
    pub attempts: usize,
    pub duration_ms: u64,
    pub error_message: String,
    pub error_stack: String,
    pub failure_type: FailureType,
    #[serde(flatten)]
    pub analysis: RuleAnalysis,
    pub source_context: String,
    pub screenshots: Vec<String>,
    pub enrichment: Option<String>,
}

impl FailureAnalysis {
    pub fn priority(&self) -> Priority {
        self.analysis.priority
    }

    pub fn location(&self) -> String {
        format!("{}:{}", self.file_path, self.line)
    }
}
