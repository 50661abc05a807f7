use std::sync::LazyLock;

use regex::Regex;

use crate::models::FailureType;
use crate::text::strip_ansi;

// All patterns run against lowercased text.

static ASSERTION_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bto(?:be|equal|strictequal|contain|containtext|havetext|betruthy|befalsy)\b|expectation failed|expected substring|received string",
    )
    .unwrap()
});

static MISSING_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"no elements? (?:were )?found").unwrap());

static SELECTOR_WAIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"waiting for (?:locator|getbyrole|selector)").unwrap());

/// Auto-retrying `expect(...)` calls also log "waiting for locator".
static ASSERTION_WAIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"expect\s*\(|expect\s+"|waiting for expect"#).unwrap());

static TIMEOUT_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"timed out|timeout|time out").unwrap());

static NAVIGATION_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"waitforurl|waiting for url|goto|navigation").unwrap());

static NETWORK_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"net::err_|econnrefused|econnreset|enotfound|eai_again|getaddrinfo|socket hang up")
        .unwrap()
});

type Rule = (fn(&str) -> bool, FailureType);

/// Evaluated top to bottom, first match wins.
const RULES: &[Rule] = &[
    (is_assertion, FailureType::AssertionMismatch),
    (is_missing_selector, FailureType::SelectorNotFound),
    (is_navigation_timeout, FailureType::NavigationError),
    (is_timeout, FailureType::Timeout),
    (is_network, FailureType::NetworkError),
];

/// Map an error message and stack to exactly one failure type.
pub fn classify(message: &str, stack: &str) -> FailureType {
    let text = normalize(message, stack);
    RULES
        .iter()
        .find(|(matches, _)| matches(&text))
        .map(|&(_, kind)| kind)
        .unwrap_or(FailureType::Unknown)
}

fn normalize(message: &str, stack: &str) -> String {
    let mut text = strip_ansi(message);
    text.push('\n');
    text.push_str(&strip_ansi(stack));
    text.to_lowercase()
}

fn is_assertion(text: &str) -> bool {
    ASSERTION_MARKERS.is_match(text)
}

fn is_missing_selector(text: &str) -> bool {
    MISSING_ELEMENT.is_match(text)
        || (SELECTOR_WAIT.is_match(text) && !is_assertion(text) && !ASSERTION_WAIT.is_match(text))
}

fn is_navigation_timeout(text: &str) -> bool {
    TIMEOUT_PHRASE.is_match(text) && NAVIGATION_KEYWORD.is_match(text)
}

fn is_timeout(text: &str) -> bool {
    TIMEOUT_PHRASE.is_match(text)
}

fn is_network(text: &str) -> bool {
    NETWORK_MARKERS.is_match(text)
}
