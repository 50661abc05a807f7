use crate::models::failure::SUITE_SEPARATOR;
use crate::models::{RawFailure, RunReport, Spec, Suite, TestEntry, TestResult, TestStatus};

/// Flatten every entry whose final attempt failed, in depth-first order.
pub fn extract_failures(report: &RunReport) -> Vec<RawFailure> {
    let mut failures = Vec::new();
    visit_final_results(report, |suite, suite_name, spec, entry, last| {
        if !last.status.is_failed() {
            return;
        }
        let file_path = if spec.file.is_empty() {
            suite.file.clone().unwrap_or_default()
        } else {
            spec.file.clone()
        };
        failures.push(RawFailure {
            test_name: spec.title.clone(),
            suite_name: suite_name.to_string(),
            file_path,
            line: spec.line,
            attempts: entry.results.len(),
            final_result: last.clone(),
        });
    });
    failures
}

/// Entries that did not pass but get no failure section: final attempt timed out or was interrupted.
pub fn unanalyzed_entries(report: &RunReport) -> Vec<(String, TestStatus)> {
    let mut entries = Vec::new();
    visit_final_results(report, |_, suite_name, spec, _, last| {
        if matches!(last.status, TestStatus::TimedOut | TestStatus::Interrupted) {
            let name = if suite_name.is_empty() {
                spec.title.clone()
            } else {
                format!("{suite_name}{SUITE_SEPARATOR}{}", spec.title)
            };
            entries.push((name, last.status));
        }
    });
    entries
}

fn visit_final_results<'a, F>(report: &'a RunReport, mut visit: F)
where
    F: FnMut(&'a Suite, &str, &'a Spec, &'a TestEntry, &'a TestResult),
{
    let mut path = Vec::new();
    for suite in &report.suites {
        walk_suite(suite, &mut path, &mut visit);
    }
}

fn walk_suite<'a, F>(suite: &'a Suite, path: &mut Vec<&'a str>, visit: &mut F)
where
    F: FnMut(&'a Suite, &str, &'a Spec, &'a TestEntry, &'a TestResult),
{
    let title = suite.title.trim();
    let pushed = !title.is_empty();
    if pushed {
        path.push(title);
    }

    let suite_name = path.join(SUITE_SEPARATOR);
    for spec in &suite.specs {
        for entry in &spec.tests {
            if let Some(last) = entry.final_result() {
                visit(suite, &suite_name, spec, entry, last);
            }
        }
    }

    for child in &suite.suites {
        walk_suite(child, path, visit);
    }

    if pushed {
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Spec, TestEntry, TestResult, TestStatus};

    fn attempt(status: TestStatus) -> TestResult {
        TestResult {
            status,
            duration: 5.0,
            error: None,
            attachments: Vec::new(),
        }
    }

    fn spec(title: &str, line: u32, statuses: &[TestStatus]) -> Spec {
        Spec {
            title: title.into(),
            file: "shop.spec.ts".into(),
            line,
            column: 3,
            tests: vec![TestEntry {
                project_name: Some("chromium".into()),
                results: statuses.iter().copied().map(attempt).collect(),
            }],
        }
    }

    fn nested_report() -> RunReport {
        RunReport {
            suites: vec![Suite {
                title: "shop.spec.ts".into(),
                file: Some("shop.spec.ts".into()),
                specs: vec![spec("loads", 2, &[TestStatus::Passed])],
                suites: vec![Suite {
                    title: "catalog".into(),
                    specs: vec![spec(
                        "recovers on retry",
                        8,
                        &[TestStatus::Failed, TestStatus::Passed],
                    )],
                    suites: vec![Suite {
                        title: "search".into(),
                        specs: vec![spec(
                            "finds camera",
                            14,
                            &[TestStatus::Failed, TestStatus::Failed],
                        )],
                        ..Suite::default()
                    }],
                    ..Suite::default()
                }],
            }],
            ..RunReport::default()
        }
    }

    #[test]
    fn nested_failure_carries_joined_suite_path() {
        let failures = extract_failures(&nested_report());
        assert_eq!(failures.len(), 1);
        let failure = &failures[0];
        assert_eq!(failure.test_name, "finds camera");
        assert_eq!(failure.suite_name, "shop.spec.ts > catalog > search");
        assert_eq!(failure.line, 14);
        assert_eq!(failure.attempts, 2);
        assert_eq!(failure.final_result.status, TestStatus::Failed);
    }

    #[test]
    fn passing_final_attempt_is_not_a_failure() {
        let failures = extract_failures(&nested_report());
        assert!(failures.iter().all(|f| f.test_name != "recovers on retry"));
    }

    #[test]
    fn empty_titles_and_empty_entries_are_skipped() {
        let report = RunReport {
            suites: vec![Suite {
                title: String::new(),
                specs: vec![
                    Spec {
                        title: "never ran".into(),
                        tests: vec![TestEntry::default()],
                        ..Spec::default()
                    },
                    spec("broken", 1, &[TestStatus::Failed]),
                ],
                ..Suite::default()
            }],
            ..RunReport::default()
        };
        let failures = extract_failures(&report);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].suite_name, "");
    }

    #[test]
    fn timed_out_final_attempt_is_not_extracted() {
        let report = RunReport {
            suites: vec![Suite {
                title: "a".into(),
                specs: vec![spec("slow", 1, &[TestStatus::TimedOut])],
                ..Suite::default()
            }],
            ..RunReport::default()
        };
        assert!(extract_failures(&report).is_empty());
    }

    #[test]
    fn timed_out_and_interrupted_entries_are_reported_separately() {
        let report = RunReport {
            suites: vec![Suite {
                title: "checkout".into(),
                specs: vec![
                    spec("slow", 1, &[TestStatus::Failed, TestStatus::TimedOut]),
                    spec("cut short", 9, &[TestStatus::Interrupted]),
                    spec("skipped", 12, &[TestStatus::Skipped]),
                    spec("broken", 20, &[TestStatus::Failed]),
                ],
                ..Suite::default()
            }],
            ..RunReport::default()
        };
        assert_eq!(
            unanalyzed_entries(&report),
            vec![
                ("checkout > slow".to_string(), TestStatus::TimedOut),
                ("checkout > cut short".to_string(), TestStatus::Interrupted),
            ]
        );
        assert_eq!(extract_failures(&report).len(), 1);
    }

    #[test]
    fn extraction_is_deterministic() {
        let report = nested_report();
        let first: Vec<_> = extract_failures(&report)
            .into_iter()
            .map(|f| (f.suite_name, f.test_name, f.line))
            .collect();
        let second: Vec<_> = extract_failures(&report)
            .into_iter()
            .map(|f| (f.suite_name, f.test_name, f.line))
            .collect();
        assert_eq!(first, second);
    }
}
