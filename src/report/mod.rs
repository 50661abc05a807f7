pub mod console;
pub mod markdown;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{FailureAnalysis, FailureType, Priority, RunSummary};

/// Aggregate of one triage run. Failures keep extraction order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub duration_ms: u64,
    pub failures: Vec<FailureAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub failure_type: FailureType,
    pub count: usize,
    pub top_priority: Priority,
}

pub fn assemble(failures: Vec<FailureAnalysis>, summary: RunSummary) -> Report {
    Report {
        generated_at: Utc::now(),
        total_tests: summary.total,
        passed_tests: summary.passed,
        failed_tests: summary.failed.max(failures.len()),
        duration_ms: summary.duration_ms,
        failures,
    }
}

impl Report {
    /// Failed entries that have no analyzed section (timed out or interrupted).
    pub fn unanalyzed_tests(&self) -> usize {
        self.failed_tests.saturating_sub(self.failures.len())
    }

    /// Percentage of passed tests; 0 for an empty run.
    pub fn pass_rate(&self) -> f64 {
        if self.total_tests == 0 {
            0.0
        } else {
            self.passed_tests as f64 / self.total_tests as f64 * 100.0
        }
    }

    /// One row per failure type in first-seen order, with the highest priority in the group.
    pub fn type_summary(&self) -> Vec<TypeSummary> {
        let mut rows: Vec<TypeSummary> = Vec::new();
        for failure in &self.failures {
            let priority = failure.priority();
            match rows
                .iter_mut()
                .find(|row| row.failure_type == failure.failure_type)
            {
                Some(row) => {
                    row.count += 1;
                    if priority.rank() > row.top_priority.rank() {
                        row.top_priority = priority;
                    }
                }
                None => rows.push(TypeSummary {
                    failure_type: failure.failure_type,
                    count: 1,
                    top_priority: priority,
                }),
            }
        }
        rows
    }

    /// Write the Markdown document, creating parent directories as needed.
    pub fn write_markdown(&self, path: &Path, max_error_chars: usize) -> Result<()> {
        write_file(path, &markdown::render(self, max_error_chars))
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        write_file(path, &json)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
