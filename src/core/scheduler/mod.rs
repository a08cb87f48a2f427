//! Periodic jobs and user notifications, provided by the agent runtime's
//! external scheduler.

mod openclaw;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

pub use openclaw::OpenClawCron;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Deliver the payload as a system event in the agent's main session.
    Main,
    /// Run the payload as a fresh, isolated agent turn.
    Isolated,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::Main => "main",
            SessionMode::Isolated => "isolated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeMode {
    Now,
    NextHeartbeat,
}

impl WakeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WakeMode::Now => "now",
            WakeMode::NextHeartbeat => "next-heartbeat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    /// Five-field cron expression.
    pub schedule: String,
    pub payload: String,
    pub session: SessionMode,
    pub wake: WakeMode,
}

/// Operations on the external scheduler. Every call is best-effort: failures
/// are logged by the implementation and reported as `false` or empty output.
#[async_trait]
pub trait TriggerClient: Send + Sync {
    async fn available(&self) -> bool;
    async fn exists(&self, name: &str) -> bool;
    async fn create(&self, job: &JobSpec) -> bool;
    async fn remove(&self, name_or_id: &str) -> bool;
    async fn list(&self) -> String;
    /// Push a message to the user through the agent's messaging channel.
    async fn notify(&self, message: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    AlreadyExists,
    Created,
    Unavailable,
    Failed,
}

/// Create `job` unless a job with the same name is already registered.
pub async fn ensure_job(client: &dyn TriggerClient, job: &JobSpec) -> EnsureOutcome {
    if !client.available().await {
        return EnsureOutcome::Unavailable;
    }
    if client.exists(&job.name).await {
        return EnsureOutcome::AlreadyExists;
    }
    if client.create(job).await {
        EnsureOutcome::Created
    } else {
        EnsureOutcome::Failed
    }
}

pub const HEARTBEAT_JOB_NAME: &str = "clawfriend-heartbeat";

pub fn heartbeat_job() -> JobSpec {
    JobSpec {
        name: HEARTBEAT_JOB_NAME.to_string(),
        schedule: "*/15 * * * *".to_string(),
        payload: "ClawFriend heartbeat: work through the ClawFriend Tasks in HEARTBEAT.md and \
                  report anything that needs the owner's attention."
            .to_string(),
        session: SessionMode::Isolated,
        wake: WakeMode::Now,
    }
}
