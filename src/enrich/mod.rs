pub mod chat;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, warn};

use crate::models::FailureAnalysis;

pub use chat::ChatEnricher;

/// Outcome of one enrichment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    Narrative(String),
    /// No credential, or switched off on the command line.
    Disabled,
    /// The service was tried and failed; the report goes on without it.
    Failed(String),
}

impl Enrichment {
    pub fn into_narrative(self) -> Option<String> {
        match self {
            Enrichment::Narrative(text) => Some(text),
            Enrichment::Disabled | Enrichment::Failed(_) => None,
        }
    }
}

/// Optional natural-language elaboration of a rule-based diagnosis.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, failure: &FailureAnalysis) -> Enrichment;

    /// Whether calls can produce a narrative at all. Drives the console mode indicator.
    fn is_active(&self) -> bool;
}

pub struct DisabledEnricher;

#[async_trait]
impl Enricher for DisabledEnricher {
    async fn enrich(&self, _failure: &FailureAnalysis) -> Enrichment {
        Enrichment::Disabled
    }

    fn is_active(&self) -> bool {
        false
    }
}

/// Attach narratives to each analysis with at most `concurrency` requests in
/// flight. Output order always matches input order.
pub async fn enrich_all(
    analyses: Vec<FailureAnalysis>,
    enricher: &dyn Enricher,
    concurrency: usize,
) -> Vec<FailureAnalysis> {
    if !enricher.is_active() {
        return analyses;
    }

    stream::iter(analyses)
        .map(|mut analysis| async move {
            let outcome = enricher.enrich(&analysis).await;
            if let Enrichment::Failed(ref reason) = outcome {
                warn!("enrichment skipped for {}: {}", analysis.test_name, reason);
            }
            analysis.enrichment = outcome.into_narrative();
            if analysis.enrichment.is_some() {
                debug!("enriched {}", analysis.test_name);
            }
            analysis
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
