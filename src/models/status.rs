use serde::{Deserialize, Serialize};

/// Outcome of a single physical attempt, as written by the JSON reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
    Skipped,
    Interrupted,
}

impl TestStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, TestStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_reporter_spelling() {
        let status: TestStatus = serde_json::from_str("\"timedOut\"").unwrap();
        assert_eq!(status, TestStatus::TimedOut);
        assert!(serde_json::from_str::<TestStatus>("\"flaky\"").is_err());
    }
}
