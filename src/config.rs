use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "triage.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// How the test suite is executed for `triage run`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Command line, split with shell quoting rules.
    /// Example: "npx playwright test --reporter=json --project=chromium"
    pub command: String,
    pub timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: "npx playwright test --reporter=json".into(),
            timeout_secs: 600,
        }
    }
}

/// Where spec files are looked up when rendering source context.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base paths relative to the workspace, tried in order.
    /// Example: ["", "tests", "e2e"]
    pub roots: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            roots: vec![String::new(), "tests".into(), "e2e".into()],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output: PathBuf,
    /// Optional JSON export of the full report.
    pub json: Option<PathBuf>,
    /// Error excerpts in failure sections are cut at this many characters.
    pub max_error_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("test-results/triage-report.md"),
            json: None,
            max_error_chars: 1500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    /// Enrichment is skipped when it is unset or empty.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Maximum in-flight requests. 1 keeps requests strictly sequential.
    pub concurrency: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4o-mini".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 30,
            concurrency: 1,
        }
    }
}

impl EnrichmentConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Config {
    /// Load `triage.toml` from the workspace root, falling back to defaults if absent or invalid.
    pub fn load(workspace: &Path) -> Self {
        Self::load_from(&workspace.join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring invalid {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
