use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Enricher, Enrichment};
use crate::config::EnrichmentConfig;
use crate::error::{TriageError, TriageResult};
use crate::models::FailureAnalysis;
use crate::text::truncate_chars;

const STACK_EXCERPT_LINES: usize = 15;
const PROMPT_ERROR_CHARS: usize = 2000;

const SYSTEM_PROMPT: &str = "You are a senior QA engineer triaging failed end-to-end browser tests \
against a live, frequently changing website. Given the failure details and a rule-based \
diagnosis, explain the most likely root cause and give concrete, prioritized fixes. \
Be concise and use Markdown.";

/// Sends one structured prompt per failure to an OpenAI-compatible chat endpoint.
pub struct ChatEnricher {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatEnricher {
    pub fn new(config: &EnrichmentConfig, api_key: String) -> TriageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    async fn request(&self, failure: &FailureAnalysis) -> TriageResult<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(failure) },
            ],
            "temperature": 0.2,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriageError::EnrichmentStatus { status });
        }

        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(TriageError::EmptyEnrichment)
    }
}

#[async_trait]
impl Enricher for ChatEnricher {
    async fn enrich(&self, failure: &FailureAnalysis) -> Enrichment {
        match self.request(failure).await {
            Ok(text) => Enrichment::Narrative(text),
            Err(e) => Enrichment::Failed(e.to_string()),
        }
    }

    fn is_active(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Test identity, error, stack excerpt, source context and rule-based findings.
pub fn build_prompt(failure: &FailureAnalysis) -> String {
    let stack_excerpt = failure
        .error_stack
        .lines()
        .take(STACK_EXCERPT_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "## Failed test\n\
         - Test: {test}\n\
         - Suite: {suite}\n\
         - Location: {location}\n\
         - Attempts: {attempts}\n\n\
         ## Error\n```\n{error}\n```\n\n\
         ## Stack excerpt\n```\n{stack}\n```\n\n\
         ## Source context\n```\n{source}\n```\n\n\
         ## Rule-based diagnosis\n\
         - Type: {kind}\n\
         - Priority: {priority}\n\
         - Root cause: {root_cause}\n\
         - Suggested fix:\n{fix}\n\n\
         Explain whether this is a real regression, a flaky test or live data drift, \
         and refine the suggested fix.",
        test = failure.test_name,
        suite = failure.suite_name,
        location = failure.location(),
        attempts = failure.attempts,
        error = truncate_chars(&failure.error_message, PROMPT_ERROR_CHARS),
        stack = stack_excerpt,
        source = failure.source_context,
        kind = failure.failure_type,
        priority = failure.priority(),
        root_cause = failure.analysis.root_cause,
        fix = failure.analysis.suggested_fix,
    )
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::enrich::enrich_all;
    use crate::models::{FailureType, Priority, RuleAnalysis};
    use crate::report::tests::failure;

    fn enricher_for(endpoint: &str) -> ChatEnricher {
        let config = EnrichmentConfig {
            endpoint: endpoint.into(),
            timeout_secs: 5,
            ..EnrichmentConfig::default()
        };
        ChatEnricher::new(&config, "test-key".into()).unwrap()
    }

    /// Accept one request, read it fully, and answer with the given status and body.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_failed() {
        let enricher = enricher_for("http://127.0.0.1:1/v1/chat/completions");
        let subject = failure("checkout", FailureType::Timeout, Priority::High);
        assert!(matches!(enricher.enrich(&subject).await, Enrichment::Failed(_)));

        let out = enrich_all(vec![subject], &enricher, 1).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].enrichment.is_none());
    }

    #[tokio::test]
    async fn non_success_status_yields_failed() {
        let endpoint = serve_once("500 Internal Server Error", "{}").await;
        let enricher = enricher_for(&endpoint);
        let subject = failure("checkout", FailureType::Timeout, Priority::High);
        match enricher.enrich(&subject).await {
            Enrichment::Failed(reason) => assert!(reason.contains("500"), "{reason}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn completion_becomes_narrative() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"  The banner covers the button.  "}}]}"#,
        )
        .await;
        let enricher = enricher_for(&endpoint);
        let out = enrich_all(
            vec![failure("checkout", FailureType::Timeout, Priority::High)],
            &enricher,
            1,
        )
        .await;
        assert_eq!(
            out[0].enrichment.as_deref(),
            Some("The banner covers the button.")
        );
    }

    #[test]
    fn prompt_carries_identity_and_findings() {
        let failure = FailureAnalysis {
            test_name: "shows product".into(),
            suite_name: "shop.spec.ts > catalog".into(),
            file_path: "shop.spec.ts".into(),
            line: 21,
            attempts: 2,
            duration_ms: 5000,
            error_message: "Expected substring: \"Nikon Z30\"".into(),
            error_stack: (1..=40).map(|n| format!("    at frame{n}")).collect::<Vec<_>>().join("\n"),
            failure_type: FailureType::AssertionMismatch,
            analysis: RuleAnalysis {
                root_cause: "Same-family data drift".into(),
                suggested_fix: "1. Loosen the assertion".into(),
                priority: Priority::Medium,
            },
            source_context: "→   21 | await expect(title).toContainText('Nikon Z30');".into(),
            screenshots: Vec::new(),
            enrichment: None,
        };

        let prompt = build_prompt(&failure);
        assert!(prompt.contains("- Test: shows product"));
        assert!(prompt.contains("- Location: shop.spec.ts:21"));
        assert!(prompt.contains("- Type: ASSERTION_MISMATCH"));
        assert!(prompt.contains("- Priority: medium"));
        assert!(prompt.contains("toContainText('Nikon Z30')"));
        assert!(prompt.contains("frame15"));
        assert!(!prompt.contains("frame16"));
    }

    #[test]
    fn completion_content_is_extracted() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Drift."}}]}"#,
        )
        .unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("Drift.")
        );
    }
}
