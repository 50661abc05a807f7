use std::sync::LazyLock;

use regex::Regex;

use crate::models::{FailureType, Priority, RuleAnalysis};
use crate::text::strip_ansi;

static EXPECTED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bexpected(?: substring| string| pattern| value)?:\s*"?([^"\n]{1,200})"#)
        .unwrap()
});

static RECEIVED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\breceived(?: string| value)?:\s*"?([^"\n]{1,200})"#).unwrap()
});

static SELECTOR_WAIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)waiting for ((?:locator|getby\w+|selector)[^\n]{0,200})").unwrap()
});

static SELECTOR_NAMED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)selector:?\s+"?([^"\n]{1,200})"#).unwrap());

static DURATION_MS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*ms").unwrap());

static NAVIGATION_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)navigation to "([^"\n]{1,200})""#).unwrap());

static NETWORK_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(net::ERR_\w+|ECONNREFUSED|ECONNRESET|ENOTFOUND|EAI_AGAIN)").unwrap()
});

/// Derive root cause, fix and priority from the failure type and its error text.
pub fn diagnose(kind: FailureType, message: &str) -> RuleAnalysis {
    let message = strip_ansi(message);
    match kind {
        FailureType::AssertionMismatch => diagnose_assertion(&message),
        FailureType::SelectorNotFound => {
            let selector = capture(&SELECTOR_WAIT, &message)
                .or_else(|| capture(&SELECTOR_NAMED, &message))
                .unwrap_or_else(|| "unknown selector".into());
            analysis(
                Priority::Critical,
                format!("Element not found: {selector} never appeared on the page."),
                &[
                    "Inspect the live DOM (trace viewer or failure screenshot) to confirm the element still exists.",
                    "Add an explicit wait for the element or its container before interacting with it.",
                    "Prefer semantic lookups (getByRole, getByLabel, getByText) over brittle CSS or XPath structure.",
                ],
            )
        }
        FailureType::Timeout => {
            let root_cause = match capture(&DURATION_MS, &message) {
                Some(ms) => format!("Operation timed out after {ms}ms."),
                None => "Operation timed out (duration not stated).".into(),
            };
            analysis(
                Priority::High,
                root_cause,
                &[
                    "Increase the timeout for this step if the target is legitimately slow.",
                    "Wait for an explicit load or idle signal (a ready element, waitForLoadState) instead of fixed delays.",
                    "Inspect the captured screenshot to see what the page showed when time ran out.",
                ],
            )
        }
        FailureType::NavigationError => {
            let root_cause = match capture(&NAVIGATION_TARGET, &message) {
                Some(target) => {
                    format!("Navigation did not reach \"{target}\" before the timeout.")
                }
                None => "Navigation did not reach the expected URL before the timeout.".into(),
            };
            analysis(
                Priority::Critical,
                root_cause,
                &[
                    "Broaden the accepted URL pattern (glob or regex) to tolerate redirects and query strings.",
                    "Check for interstitial or blocking pages (consent banners, login walls, bot checks) in the screenshot.",
                ],
            )
        }
        FailureType::NetworkError => {
            let root_cause = match capture(&NETWORK_CODE, &message) {
                Some(code) => format!("Network failure: the target could not be reached ({code})."),
                None => "Network failure: the target could not be reached.".into(),
            };
            analysis(
                Priority::Critical,
                root_cause,
                &[
                    "Verify the target host is reachable from the test environment (DNS, proxy, firewall).",
                    "Add retry logic for transient network failures.",
                ],
            )
        }
        FailureType::Unknown => analysis(
            Priority::Medium,
            "Unrecognized failure: no known pattern matched the error output.".into(),
            &["Inspect the error, stack trace and screenshots manually."],
        ),
    }
}

fn diagnose_assertion(message: &str) -> RuleAnalysis {
    let expected = capture(&EXPECTED_VALUE, message);
    let received = capture(&RECEIVED_VALUE, message);
    let (Some(expected), Some(received)) = (expected, received) else {
        return analysis(
            Priority::High,
            "Assertion failed: the received value did not match the expectation.".into(),
            &[
                "Compare the expected and received values in the error output.",
                "Re-verify the expected state and prefer pattern-based matching where exact values are not essential.",
            ],
        );
    };

    match same_family(&expected, &received) {
        Some(family) => {
            let loosen = format!(
                "Loosen the assertion to a family-level or partial match (for example \"{family}\" or a regex) instead of the exact item."
            );
            analysis(
                Priority::Medium,
                format!(
                    "Same-family data drift: expected \"{expected}\" but received \"{received}\". \
                     Both belong to the \"{family}\" family, so the live data most likely changed \
                     which item is shown rather than the application regressing."
                ),
                &[
                    loosen.as_str(),
                    "Stabilize the data source (fixtures, seeded data or a mocked API) so the expected item is deterministic.",
                    "Avoid position-dependent identity checks (first(), nth()) against live, mutable listings.",
                ],
            )
        }
        None => analysis(
            Priority::High,
            format!(
                "Assertion mismatch: expected \"{expected}\" but received \"{received}\". \
                 The values do not share a family, which points to a real change in page state."
            ),
            &[
                "Re-verify the expected state against the live target.",
                "Prefer pattern-based matching (regex or partial text) where exact values are not essential.",
            ],
        ),
    }
}

/// Leading whitespace-delimited token shared by both values, if any.
fn same_family<'a>(expected: &'a str, received: &str) -> Option<&'a str> {
    let family = expected.split_whitespace().next()?;
    (received.split_whitespace().next()? == family).then_some(family)
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().trim_end_matches('"').trim().to_string())
        .filter(|s| !s.is_empty())
}

fn analysis(priority: Priority, root_cause: String, fixes: &[&str]) -> RuleAnalysis {
    let suggested_fix = fixes
        .iter()
        .enumerate()
        .map(|(i, fix)| format!("{}. {}", i + 1, fix))
        .collect::<Vec<_>>()
        .join("\n");
    RuleAnalysis {
        root_cause,
        suggested_fix,
        priority,
    }
}
