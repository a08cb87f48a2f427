use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{JobSpec, SessionMode, TriggerClient};
use crate::platform::{NativePlatform, Platform};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("'{0}' was not found on PATH")]
    Missing(String),

    #[error("'{binary}' did not finish within {secs}s")]
    Timeout { binary: String, secs: u64 },

    #[error("'{binary}' exited with {code}: {stderr}")]
    Failed {
        binary: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to run scheduler CLI: {0}")]
    Io(#[from] std::io::Error),
}

/// Production [`TriggerClient`] that drives the `openclaw` CLI.
pub struct OpenClawCron {
    binary: String,
    timeout: Duration,
}

impl OpenClawCron {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Binary from `CLAWFRIEND_CRON_BIN` (or the platform default) and
    /// per-call timeout in seconds from `CLAWFRIEND_CRON_TIMEOUT`.
    pub fn from_env() -> Self {
        let binary = std::env::var("CLAWFRIEND_CRON_BIN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| NativePlatform::scheduler_binary().to_string());
        let timeout = std::env::var("CLAWFRIEND_CRON_TIMEOUT")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        Self::new(binary).with_timeout(timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: &[&str]) -> Result<String, TriggerError> {
        debug!(binary = %self.binary, ?args, "invoking scheduler CLI");
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TriggerError::Missing(self.binary.clone()),
                _ => TriggerError::Io(e),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TriggerError::Timeout {
                binary: self.binary.clone(),
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(TriggerError::Failed {
                binary: self.binary.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn run_logged(&self, what: &str, args: &[&str]) -> Option<String> {
        match self.run(args).await {
            Ok(out) => Some(out),
            Err(e) => {
                warn!("Scheduler {} failed: {}", what, e);
                None
            }
        }
    }
}

pub(crate) fn create_args(job: &JobSpec) -> Vec<&str> {
    let mut args = vec![
        "cron",
        "add",
        "--name",
        job.name.as_str(),
        "--cron",
        job.schedule.as_str(),
        "--session",
        job.session.as_str(),
    ];
    match job.session {
        SessionMode::Main => args.extend(["--system-event", job.payload.as_str()]),
        SessionMode::Isolated => args.extend(["--message", job.payload.as_str()]),
    }
    args.extend(["--wake", job.wake.as_str()]);
    args
}

/// Whether `cron list` output mentions a job called `name`, either as a
/// whitespace-separated column or as a JSON `"name"` field.
pub fn list_contains_job(output: &str, name: &str) -> bool {
    let quoted = format!("\"{}\"", name);
    output.lines().any(|line| {
        line.split_whitespace()
            .any(|token| token == name || token.trim_end_matches(',') == quoted)
    })
}

#[async_trait]
impl TriggerClient for OpenClawCron {
    async fn available(&self) -> bool {
        self.run_logged("version probe", &["--version"]).await.is_some()
    }

    async fn exists(&self, name: &str) -> bool {
        self.run_logged("list", &["cron", "list"])
            .await
            .is_some_and(|out| list_contains_job(&out, name))
    }

    async fn create(&self, job: &JobSpec) -> bool {
        self.run_logged("create", &create_args(job)).await.is_some()
    }

    async fn remove(&self, name_or_id: &str) -> bool {
        self.run_logged("remove", &["cron", "rm", name_or_id])
            .await
            .is_some()
    }

    async fn list(&self) -> String {
        self.run_logged("list", &["cron", "list"])
            .await
            .unwrap_or_default()
    }

    async fn notify(&self, message: &str) -> bool {
        self.run_logged(
            "notification",
            &["system", "event", "--text", message, "--mode", "now"],
        )
        .await
        .is_some()
    }
}
