use std::fmt::Write;

use super::Report;
use crate::models::FailureAnalysis;
use crate::text::truncate_chars;

pub const ALL_PASSED: &str = "✅ All tests passed. No failures to analyze.";

/// Render the full triage document.
pub fn render(report: &Report, max_error_chars: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# E2E Failure Triage Report\n");
    let _ = writeln!(out, "Generated: {}\n", report.generated_at.to_rfc3339());

    out.push_str("## Summary\n\n| Metric | Value |\n| --- | --- |\n");
    let _ = writeln!(out, "| Total tests | {} |", report.total_tests);
    let _ = writeln!(out, "| Passed | {} |", report.passed_tests);
    let _ = writeln!(out, "| Failed | {} |", report.failed_tests);
    let _ = writeln!(out, "| Pass rate | {:.1}% |", report.pass_rate());
    let _ = writeln!(out, "| Duration | {} |\n", format_duration(report.duration_ms));

    let unanalyzed = report.unanalyzed_tests();
    if report.failures.is_empty() && unanalyzed == 0 {
        let _ = writeln!(out, "{}", ALL_PASSED);
        return out;
    }
    if unanalyzed > 0 {
        let _ = writeln!(
            out,
            "> ⚠️ {} failed test(s) timed out or were interrupted and have no detailed analysis.\n",
            unanalyzed
        );
    }
    if report.failures.is_empty() {
        return out;
    }

    out.push_str("## Failures by Type\n\n| Type | Count | Top priority |\n| --- | --- | --- |\n");
    for row in report.type_summary() {
        let _ = writeln!(
            out,
            "| {} | {} | {} {} |",
            row.failure_type,
            row.count,
            row.top_priority.icon(),
            row.top_priority
        );
    }

    out.push_str("\n## Failure Details\n");
    for (i, failure) in report.failures.iter().enumerate() {
        render_failure(&mut out, i + 1, failure, max_error_chars);
    }
    out
}

fn render_failure(out: &mut String, index: usize, failure: &FailureAnalysis, max_error_chars: usize) {
    let priority = failure.priority();
    let _ = writeln!(
        out,
        "\n### {}. {} {}\n",
        index,
        priority.icon(),
        cell(&failure.test_name)
    );
    out.push_str("| Field | Value |\n| --- | --- |\n");
    let _ = writeln!(out, "| Suite | {} |", cell(&failure.suite_name));
    let _ = writeln!(out, "| Location | `{}` |", cell(&failure.location()));
    let _ = writeln!(out, "| Type | {} |", failure.failure_type);
    let _ = writeln!(out, "| Priority | {} |", priority);
    let _ = writeln!(out, "| Attempts | {} |", failure.attempts);
    let _ = writeln!(out, "| Duration | {} |", format_duration(failure.duration_ms));

    let _ = writeln!(
        out,
        "\n**Error**\n\n```\n{}\n```",
        truncate_chars(&failure.error_message, max_error_chars)
    );
    let _ = writeln!(out, "\n**Source context**\n\n```\n{}\n```", failure.source_context);
    let _ = writeln!(out, "\n**Root cause**\n\n{}", failure.analysis.root_cause);
    let _ = writeln!(out, "\n**Suggested fix**\n\n{}", failure.analysis.suggested_fix);

    if !failure.screenshots.is_empty() {
        out.push_str("\n**Screenshots**\n\n");
        for shot in &failure.screenshots {
            let _ = writeln!(out, "- `{}`", shot);
        }
    }

    if let Some(ref narrative) = failure.enrichment {
        let _ = writeln!(out, "\n**Extended analysis**\n\n{}", narrative);
    }

    out.push_str("\n---\n");
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
