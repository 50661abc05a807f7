pub mod playwright;

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::error::TriageResult;
use crate::models::RunReport;

pub use playwright::PlaywrightRunner;

/// Produces the structured result tree for one test run.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn collect(&self) -> TriageResult<RunReport>;

    /// Display name for this source (e.g., "Playwright").
    fn name(&self) -> &str;
}

/// A report document saved by an earlier run.
pub struct SavedReport {
    path: PathBuf,
}

impl SavedReport {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ReportSource for SavedReport {
    async fn collect(&self) -> TriageResult<RunReport> {
        info!("reading report {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    fn name(&self) -> &str {
        "saved report"
    }
}
