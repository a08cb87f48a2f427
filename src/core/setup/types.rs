use serde_json::{Value, json};

use crate::core::error::{SetupError, SetupResult};
use crate::core::state::{StepState, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepId {
    ConfigureEndpoint,
    HeartbeatFile,
    ScheduleTrigger,
    ActivationWatch,
    WalletAndRegister,
}

impl StepId {
    pub const ALL: [StepId; 5] = [
        StepId::ConfigureEndpoint,
        StepId::HeartbeatFile,
        StepId::ScheduleTrigger,
        StepId::ActivationWatch,
        StepId::WalletAndRegister,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::ConfigureEndpoint => "configure-endpoint",
            StepId::HeartbeatFile => "heartbeat-file",
            StepId::ScheduleTrigger => "schedule-trigger",
            StepId::ActivationWatch => "activation-watch",
            StepId::WalletAndRegister => "wallet-and-register",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "configure-endpoint" => Some(StepId::ConfigureEndpoint),
            "heartbeat-file" => Some(StepId::HeartbeatFile),
            "schedule-trigger" => Some(StepId::ScheduleTrigger),
            "activation-watch" => Some(StepId::ActivationWatch),
            "wallet-and-register" => Some(StepId::WalletAndRegister),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StepId::ConfigureEndpoint => "Configure the ClawFriend API endpoint",
            StepId::HeartbeatFile => "Merge ClawFriend tasks into HEARTBEAT.md",
            StepId::ScheduleTrigger => "Schedule the heartbeat job",
            StepId::ActivationWatch => "Install the activation monitor job",
            StepId::WalletAndRegister => "Create the wallet and register the agent",
        }
    }

    /// Steps that must succeed before anything else in the batch may start.
    pub fn is_gate(self) -> bool {
        self == StepId::ConfigureEndpoint
    }
}

/// Resolve requested names into steps, in request order and without
/// duplicates. Any unknown name fails the whole request.
pub fn resolve_steps<S: AsRef<str>>(names: &[S]) -> SetupResult<Vec<StepId>> {
    let mut steps = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        let step =
            StepId::from_name(name).ok_or_else(|| SetupError::UnknownStep(name.to_string()))?;
        if !steps.contains(&step) {
            steps.push(step);
        }
    }
    if steps.is_empty() {
        return Err(SetupError::Validation("no steps requested".to_string()));
    }
    Ok(steps)
}

/// Parse the comma-separated list accepted by `run-steps`.
pub fn parse_step_list(list: &str) -> SetupResult<Vec<StepId>> {
    let names: Vec<&str> = list.split(',').collect();
    resolve_steps(&names)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Validation,
    NameTaken,
    ExternalCall,
    Io,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::Validation => "validation",
            FailureReason::NameTaken => "name_taken",
            FailureReason::ExternalCall => "external_call",
            FailureReason::Io => "io",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Done {
        message: String,
        data: Option<Value>,
    },
    Skipped {
        reason: String,
    },
    Failed {
        message: String,
        reason: FailureReason,
    },
    /// Not started because a gating step failed; the stored status stays pending.
    Blocked {
        by: StepId,
    },
}

impl StepOutcome {
    pub fn done(message: impl Into<String>) -> Self {
        StepOutcome::Done {
            message: message.into(),
            data: None,
        }
    }

    pub fn done_with(message: impl Into<String>, data: Value) -> Self {
        StepOutcome::Done {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn from_error(err: SetupError) -> Self {
        let reason = match &err {
            SetupError::ToolUnavailable(_) => {
                return StepOutcome::Skipped {
                    reason: err.to_string(),
                };
            }
            SetupError::Conflict(_) => FailureReason::NameTaken,
            SetupError::Validation(_) | SetupError::UnknownStep(_) => FailureReason::Validation,
            SetupError::ExternalCall(_) => FailureReason::ExternalCall,
            SetupError::Io(_) | SetupError::Json(_) => FailureReason::Io,
        };
        StepOutcome::Failed {
            message: err.to_string(),
            reason,
        }
    }

    pub fn state(&self) -> StepState {
        match self {
            StepOutcome::Done { .. } => StepState::Done,
            StepOutcome::Skipped { .. } => StepState::Skipped,
            StepOutcome::Failed { .. } => StepState::Error,
            StepOutcome::Blocked { .. } => StepState::Pending,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, StepOutcome::Done { .. } | StepOutcome::Skipped { .. })
    }

    pub fn skipped_flag(&self) -> bool {
        matches!(self, StepOutcome::Skipped { .. })
    }

    pub fn message(&self) -> String {
        match self {
            StepOutcome::Done { message, .. } => message.clone(),
            StepOutcome::Skipped { reason } => reason.clone(),
            StepOutcome::Failed { message, .. } => message.clone(),
            StepOutcome::Blocked { by } => format!("not run: {} failed", by.as_str()),
        }
    }

    /// Persisted form of a finished outcome. `Blocked` has none.
    pub fn to_status(&self, step: StepId) -> Option<StepStatus> {
        let status = StepStatus::new(step.as_str(), self.state());
        match self {
            StepOutcome::Done { .. } | StepOutcome::Skipped { .. } => Some(status),
            StepOutcome::Failed { message, reason } => {
                Some(status.with_error(message.clone(), Some(reason.as_str())))
            }
            StepOutcome::Blocked { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: StepId,
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn to_json(&self) -> Value {
        let mut obj = json!({
            "step": self.step.as_str(),
            "status": self.outcome.state().as_str(),
            "success": self.outcome.success(),
            "skipped": self.outcome.skipped_flag(),
            "message": self.outcome.message(),
        });
        match &self.outcome {
            StepOutcome::Failed { message, reason } => {
                obj["error"] = json!(message);
                obj["reason"] = json!(reason.as_str());
            }
            StepOutcome::Blocked { by } => {
                obj["blockedBy"] = json!(by.as_str());
            }
            StepOutcome::Done {
                data: Some(data), ..
            } => {
                obj["data"] = data.clone();
            }
            _ => {}
        }
        obj
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub reports: Vec<StepReport>,
}

impl BatchReport {
    pub fn get(&self, step: StepId) -> Option<&StepOutcome> {
        self.reports
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    pub fn all_succeeded(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.success())
    }

    pub fn failed(&self) -> Vec<StepId> {
        self.reports
            .iter()
            .filter(|r| !r.outcome.success())
            .map(|r| r.step)
            .collect()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": self.all_succeeded(),
            "steps": self.reports.iter().map(StepReport::to_json).collect::<Vec<_>>(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupInputs {
    pub endpoint: Option<String>,
    pub identity_name: Option<String>,
}

impl SetupInputs {
    pub fn new(endpoint: Option<String>, identity_name: Option<String>) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            endpoint: clean(endpoint),
            identity_name: clean(identity_name),
        }
    }
}
