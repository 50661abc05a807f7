use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

const LINES_BEFORE: usize = 8;
const LINES_AFTER: usize = 7;
const HEAD_LINES: usize = 30;

pub const NOT_FOUND_PREFIX: &str = "Source file not found";

/// Resolves spec files and renders numbered source windows around failures.
#[derive(Debug, Clone)]
pub struct SourceReader {
    workspace: PathBuf,
    roots: Vec<String>,
}

impl SourceReader {
    pub fn new(workspace: PathBuf, roots: Vec<String>) -> Self {
        Self { workspace, roots }
    }

    /// Render the lines around the failing frame. Never fails: every error
    /// path returns a placeholder string instead.
    pub fn read_context(&self, file_path: &str, stack: &str) -> String {
        let Some(path) = self.resolve(file_path) else {
            return format!("{}: {}", NOT_FOUND_PREFIX, file_path);
        };
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("cannot read {}: {}", path.display(), e);
                return format!("Source file unreadable: {} ({})", file_path, e);
            }
        };
        let lines: Vec<&str> = content.lines().collect();

        match failing_line(&path, stack).filter(|&line| line >= 1 && line <= lines.len()) {
            Some(line) => {
                let start = line.saturating_sub(LINES_BEFORE).max(1);
                let end = (line + LINES_AFTER).min(lines.len());
                render(&lines, start, end, Some(line))
            }
            None => render(&lines, 1, lines.len().min(HEAD_LINES), None),
        }
    }

    /// Try each configured root, then a workspace-wide search. Absolute paths
    /// pass through `join` unchanged.
    fn resolve(&self, file_path: &str) -> Option<PathBuf> {
        if file_path.is_empty() {
            return None;
        }
        let given = Path::new(file_path);
        self.roots
            .iter()
            .map(|root| self.workspace.join(root).join(given))
            .find(|candidate| candidate.is_file())
            .or_else(|| self.search_workspace(given))
    }

    fn search_workspace(&self, given: &Path) -> Option<PathBuf> {
        let name = given.file_name()?.to_string_lossy();
        let pattern = Path::new(&glob::Pattern::escape(&self.workspace.to_string_lossy()))
            .join("**")
            .join(glob::Pattern::escape(&name))
            .to_string_lossy()
            .to_string();
        let entries = glob::glob(&pattern).ok()?;
        entries
            .flatten()
            .find(|entry| !entry.to_string_lossy().contains("node_modules") && entry.is_file())
    }
}

/// Line number of the first `name:line:column` frame in the stack.
fn failing_line(path: &Path, stack: &str) -> Option<usize> {
    let name = path.file_name()?.to_string_lossy();
    let pattern = Regex::new(&format!(r"{}:(\d+):(\d+)", regex::escape(&name))).ok()?;
    pattern
        .captures(stack)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn render(lines: &[&str], start: usize, end: usize, marked: Option<usize>) -> String {
    (start..=end)
        .filter_map(|n| {
            let text = lines.get(n - 1)?;
            let marker = if marked == Some(n) { "→" } else { " " };
            Some(format!("{} {:>4} | {}", marker, n, text))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
