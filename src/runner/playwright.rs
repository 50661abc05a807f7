use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use super::ReportSource;
use crate::error::{TriageError, TriageResult};
use crate::models::RunReport;

/// Environment variable the JSON reporter writes its output file to.
const JSON_OUTPUT_ENV: &str = "PLAYWRIGHT_JSON_OUTPUT_NAME";

/// Guard that kills the child process (and its entire process group) on drop.
struct ChildGuard {
    child: Option<tokio::process::Child>,
    /// Process group ID saved at spawn time so we can kill the whole group.
    #[cfg(unix)]
    pgid: Option<u32>,
}

impl ChildGuard {
    fn new(child: tokio::process::Child) -> Self {
        #[cfg(unix)]
        let pgid = child.id();
        Self {
            child: Some(child),
            #[cfg(unix)]
            pgid,
        }
    }

    /// The child exited on its own; nothing left to kill.
    fn disarm(&mut self) {
        self.child = None;
        #[cfg(unix)]
        {
            self.pgid = None;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        // Browser workers live in the same group; take them out too.
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
        }
        if let Some(ref mut child) = self.child {
            let _ = child.start_kill();
        }
    }
}

/// Runs the Playwright suite with the JSON reporter and parses its output.
pub struct PlaywrightRunner {
    workspace: PathBuf,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PlaywrightRunner {
    pub fn new(
        workspace: PathBuf,
        command: &str,
        extra_args: &[String],
        timeout_secs: u64,
    ) -> TriageResult<Self> {
        let mut parts = shell_words::split(command)?;
        if parts.is_empty() {
            return Err(TriageError::EmptyCommand);
        }
        let program = parts.remove(0);
        parts.extend(extra_args.iter().cloned());
        Ok(Self {
            workspace,
            program,
            args: parts,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    async fn execute(&self) -> TriageResult<RunReport> {
        let output_file = tempfile::Builder::new()
            .prefix("triage-report-")
            .suffix(".json")
            .tempfile()?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(JSON_OUTPUT_ENV, output_file.path())
            .current_dir(&self.workspace)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        debug!("[cmd] {:?}", cmd.as_std());
        debug!("[cwd] {:?}", self.workspace);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.as_std_mut().process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| TriageError::RunnerSpawn {
            program: self.program.clone(),
            source,
        })?;

        let mut stdout = child.stdout.take().ok_or(TriageError::NoReport { code: None })?;
        let stderr = child.stderr.take().ok_or(TriageError::NoReport { code: None })?;
        let mut guard = ChildGuard::new(child);

        let stderr_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("[stderr] {}", line);
            }
        });

        let mut captured = String::new();
        stdout.read_to_string(&mut captured).await?;
        stderr_handle.await.ok();

        let status = match guard.child.as_mut() {
            Some(child) => child.wait().await?,
            None => return Err(TriageError::NoReport { code: None }),
        };
        guard.disarm();
        // Failing tests exit non-zero; only a missing report is fatal.
        info!("{} exited with code {:?}", self.program, status.code());

        let written = tokio::fs::read_to_string(output_file.path())
            .await
            .unwrap_or_default();
        let document = if written.trim().is_empty() {
            captured
        } else {
            written
        };
        parse_report(&document, status.code())
    }
}

#[async_trait]
impl ReportSource for PlaywrightRunner {
    async fn collect(&self) -> TriageResult<RunReport> {
        info!("running {} {}", self.program, self.args.join(" "));
        match tokio::time::timeout(self.timeout, self.execute()).await {
            Ok(result) => result,
            Err(_) => Err(TriageError::RunnerTimeout(self.timeout.as_secs())),
        }
    }

    fn name(&self) -> &str {
        "Playwright"
    }
}

/// Parse reporter output, tolerating banner text before the JSON document.
fn parse_report(document: &str, code: Option<i32>) -> TriageResult<RunReport> {
    if let Ok(report) = serde_json::from_str(document) {
        return Ok(report);
    }
    document
        .find('{')
        .and_then(|start| serde_json::from_str(&document[start..]).ok())
        .ok_or(TriageError::NoReport { code })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_split_with_shell_rules() {
        let runner = PlaywrightRunner::new(
            PathBuf::from("."),
            "npx playwright test --grep 'cart flow'",
            &["--project=chromium".to_string()],
            60,
        )
        .unwrap();
        assert_eq!(runner.program, "npx");
        assert_eq!(
            runner.args,
            ["playwright", "test", "--grep", "cart flow", "--project=chromium"]
        );
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = PlaywrightRunner::new(PathBuf::from("."), "   ", &[], 60).err();
        assert!(matches!(err, Some(TriageError::EmptyCommand)));
    }

    #[test]
    fn banner_before_document_is_tolerated() {
        let report = parse_report("Running 3 tests using 1 worker\n{\"suites\":[]}", Some(1)).unwrap();
        assert!(report.suites.is_empty());
    }

    #[test]
    fn garbage_output_is_no_report() {
        let err = parse_report("Error: Cannot find module '@playwright/test'", Some(1)).unwrap_err();
        assert!(matches!(err, TriageError::NoReport { code: Some(1) }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_used_when_output_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let runner = PlaywrightRunner::new(
            dir.path().to_path_buf(),
            r#"sh -c 'echo "{\"suites\":[],\"stats\":{\"expected\":2,\"unexpected\":0,\"flaky\":0,\"skipped\":0,\"duration\":5}}"; exit 1'"#,
            &[],
            30,
        )
        .unwrap();
        let report = runner.collect().await.unwrap();
        assert_eq!(report.summary().passed, 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let runner =
            PlaywrightRunner::new(PathBuf::from("."), "definitely-not-a-real-runner-xyz", &[], 5)
                .unwrap();
        let err = runner.collect().await.unwrap_err();
        assert!(matches!(err, TriageError::RunnerSpawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_runner_times_out() {
        let runner = PlaywrightRunner::new(PathBuf::from("."), "sleep 30", &[], 1).unwrap();
        let err = runner.collect().await.unwrap_err();
        assert!(matches!(err, TriageError::RunnerTimeout(1)));
    }
}
