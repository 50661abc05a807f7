use serde::{Deserialize, Serialize};

use super::status::TestStatus;

/// Root of the JSON reporter document. Read-only input to the analysis pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub suites: Vec<Suite>,
    /// Errors raised outside any test (config, global setup).
    #[serde(default)]
    pub errors: Vec<TestError>,
    pub stats: Option<Stats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suite {
    #[serde(default)]
    pub title: String,
    pub file: Option<String>,
    #[serde(default)]
    pub suites: Vec<Suite>,
    #[serde(default)]
    pub specs: Vec<Spec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spec {
    pub title: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default)]
    pub tests: Vec<TestEntry>,
}

/// One logical test (per project) and its attempt history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEntry {
    pub project_name: Option<String>,
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl TestEntry {
    /// The attempt that decides pass/fail. Retries precede it.
    pub fn final_result(&self) -> Option<&TestResult> {
        self.results.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub status: TestStatus,
    #[serde(default)]
    pub duration: f64,
    pub error: Option<TestError>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestError {
    pub message: Option<String>,
    pub stack: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub path: Option<String>,
    pub body: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub expected: usize,
    #[serde(default)]
    pub unexpected: usize,
    #[serde(default)]
    pub flaky: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub duration: f64,
}

/// Run-level counters fed to the report assembler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    /// Entries that did not pass, whatever their final status.
    pub failed: usize,
    pub duration_ms: u64,
}

impl RunReport {
    /// Totals from the reporter's `stats` block, or counted from the tree when absent.
    pub fn summary(&self) -> RunSummary {
        if let Some(ref stats) = self.stats {
            return RunSummary {
                total: stats.expected + stats.unexpected + stats.flaky + stats.skipped,
                passed: stats.expected + stats.flaky,
                failed: stats.unexpected,
                duration_ms: stats.duration.max(0.0) as u64,
            };
        }

        let mut summary = RunSummary::default();
        let mut duration = 0.0;
        for suite in &self.suites {
            count_suite(suite, &mut summary, &mut duration);
        }
        summary.duration_ms = duration as u64;
        summary
    }
}

fn count_suite(suite: &Suite, summary: &mut RunSummary, duration: &mut f64) {
    for spec in &suite.specs {
        for entry in &spec.tests {
            let Some(result) = entry.final_result() else {
                continue;
            };
            summary.total += 1;
            match result.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Skipped => {}
                _ => summary.failed += 1,
            }
            *duration += result.duration.max(0.0);
        }
    }
    for child in &suite.suites {
        count_suite(child, summary, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "config": { "workers": 1 },
        "suites": [{
            "title": "cart.spec.ts",
            "file": "cart.spec.ts",
            "specs": [{
                "title": "adds item",
                "file": "cart.spec.ts",
                "line": 4,
                "column": 5,
                "tests": [{
                    "projectName": "chromium",
                    "results": [
                        { "status": "failed", "duration": 10, "attachments": [] },
                        { "status": "passed", "duration": 12.5, "attachments": [] }
                    ]
                }]
            }]
        }],
        "errors": []
    }"#;

    #[test]
    fn parses_reporter_document() {
        let report: RunReport = serde_json::from_str(REPORT).unwrap();
        let spec = &report.suites[0].specs[0];
        assert_eq!(spec.line, 4);
        let last = spec.tests[0].final_result().unwrap();
        assert_eq!(last.status, TestStatus::Passed);
    }

    #[test]
    fn summary_counts_tree_without_stats() {
        let report: RunReport = serde_json::from_str(REPORT).unwrap();
        let summary = report.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.duration_ms, 12);
    }

    #[test]
    fn summary_prefers_stats_block() {
        let mut report: RunReport = serde_json::from_str(REPORT).unwrap();
        report.stats = Some(Stats {
            expected: 7,
            unexpected: 2,
            flaky: 1,
            skipped: 3,
            duration: 4321.9,
        });
        let summary = report.summary();
        assert_eq!(summary.total, 13);
        assert_eq!(summary.passed, 8);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.duration_ms, 4321);
    }

    #[test]
    fn summary_counts_timed_out_entries_as_failed() {
        let mut report: RunReport = serde_json::from_str(REPORT).unwrap();
        report.suites[0].specs[0].tests[0].results[1].status = TestStatus::TimedOut;
        let summary = report.summary();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.passed, 0);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn entry_without_results_has_no_final_result() {
        assert!(TestEntry::default().final_result().is_none());
    }
}
