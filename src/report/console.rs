use crossterm::style::Stylize;

use super::Report;
use crate::models::{FailureAnalysis, Priority};
use crate::text::truncate_chars;

const ROOT_CAUSE_CHARS: usize = 80;

pub fn mode_label(enrichment_active: bool) -> &'static str {
    if enrichment_active {
        "rule-based + enrichment"
    } else {
        "rule-based"
    }
}

/// Print the run summary followed by one compact line per failure.
pub fn print_summary(report: &Report, enrichment_active: bool) {
    println!();
    println!("{}", "E2E failure triage".bold());
    println!(
        "  {} total   {} passed   {} failed   {:.1}% pass rate   {:.1}s",
        report.total_tests,
        report.passed_tests.to_string().green(),
        report.failed_tests.to_string().red(),
        report.pass_rate(),
        report.duration_ms as f64 / 1000.0,
    );
    println!("  mode: {}", mode_label(enrichment_active).cyan());
    println!();

    if report.failures.is_empty() && report.failed_tests == 0 {
        println!("{}", "✔ All tests passed".green());
        return;
    }
    let unanalyzed = report.unanalyzed_tests();
    if unanalyzed > 0 {
        println!(
            "{}",
            format!("⚠ {unanalyzed} failed test(s) timed out or were interrupted").yellow()
        );
    }

    for failure in &report.failures {
        let line = failure_line(failure);
        match failure.priority() {
            Priority::Critical => println!("{}", line.red()),
            Priority::High => println!("{}", line.yellow()),
            Priority::Medium | Priority::Low => println!("{}", line),
        }
    }
}

/// `<icon> <TYPE> <file:line> - <root cause>`
pub fn failure_line(failure: &FailureAnalysis) -> String {
    format!(
        "{} {} {} - {}",
        failure.priority().icon(),
        failure.failure_type,
        failure.location(),
        truncate_chars(&failure.analysis.root_cause, ROOT_CAUSE_CHARS)
    )
}
