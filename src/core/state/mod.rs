//! On-disk state document shared by every setup step.
//!
//! The document is a single JSON object. Step progress lives under
//! `stepStatus`; everything else is a free-form flag. Updates always re-read
//! the file before writing so keys written by other processes survive.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::error::SetupResult;

pub const STEP_STATUS_KEY: &str = "stepStatus";
pub const ACTIVATED_FLAG: &str = "activated";
pub const ACTIVATED_AT_FLAG: &str = "activatedAt";
pub const LAST_SETUP_FLAG: &str = "lastSetupAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Done,
    Error,
    Skipped,
}

impl StepState {
    pub fn as_str(self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Running => "running",
            StepState::Done => "done",
            StepState::Error => "error",
            StepState::Skipped => "skipped",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Done | StepState::Error | StepState::Skipped)
    }
}

/// Allowed status changes. Pending is only ever left through Running, and a
/// finished step can be started again.
pub fn can_transition(from: StepState, to: StepState) -> bool {
    match from {
        StepState::Pending => to == StepState::Running,
        StepState::Running => to.is_terminal(),
        StepState::Done | StepState::Error | StepState::Skipped => to == StepState::Running,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatus {
    /// Filled from the map key on read.
    #[serde(default)]
    pub name: String,
    pub status: StepState,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl StepStatus {
    pub fn new(name: &str, status: StepState) -> Self {
        Self {
            name: name.to_string(),
            status,
            error: None,
            reason: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>, reason: Option<&str>) -> Self {
        self.error = Some(error.into());
        self.reason = reason.map(str::to_string);
        self
    }
}

fn decode_status(key: &str, value: &Value) -> Option<StepStatus> {
    let mut status: StepStatus = serde_json::from_value(value.clone()).ok()?;
    if status.name.is_empty() {
        status.name = key.to_string();
    }
    Some(status)
}

/// Immutable-by-default snapshot of the state file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDocument {
    root: Map<String, Value>,
}

impl StateDocument {
    pub fn parse(raw: &str) -> SetupResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let root = match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(Self { root })
    }

    pub fn step_status(&self, name: &str) -> Option<StepStatus> {
        decode_status(name, self.root.get(STEP_STATUS_KEY)?.get(name)?)
    }

    pub fn step_statuses(&self) -> BTreeMap<String, StepStatus> {
        let Some(Value::Object(entries)) = self.root.get(STEP_STATUS_KEY) else {
            return BTreeMap::new();
        };
        entries
            .iter()
            .filter_map(|(k, v)| decode_status(k, v).map(|s| (k.clone(), s)))
            .collect()
    }

    pub fn set_step_status(&mut self, status: StepStatus) {
        let entry = self
            .root
            .entry(STEP_STATUS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry
            && let Ok(value) = serde_json::to_value(&status)
        {
            map.insert(status.name.clone(), value);
        }
    }

    pub fn clear_step_statuses(&mut self) {
        self.root
            .insert(STEP_STATUS_KEY.to_string(), Value::Object(Map::new()));
    }

    pub fn flag(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn bool_flag(&self, key: &str) -> bool {
        self.root.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn set_flag(&mut self, key: &str, value: impl Into<Value>) {
        self.root.insert(key.to_string(), value.into());
    }

    pub fn to_pretty_json(&self) -> SetupResult<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }
}

/// File-backed store for [`StateDocument`]. One instance is shared by all
/// steps of a batch; its mutex serialises read-modify-write cycles.
pub struct StateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> SetupResult<StateDocument> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Re-read the document, apply `f` and persist the result.
    pub async fn update<F>(&self, f: F) -> SetupResult<StateDocument>
    where
        F: FnOnce(&mut StateDocument),
    {
        let _guard = self.lock.lock().await;
        let mut doc = self.read().await?;
        f(&mut doc);
        self.write(&doc).await?;
        Ok(doc)
    }

    pub async fn record_step(&self, status: StepStatus) -> SetupResult<StateDocument> {
        debug!(step = %status.name, status = status.status.as_str(), "recording step status");
        self.update(|doc| {
            let from = doc
                .step_status(&status.name)
                .map_or(StepState::Pending, |s| s.status);
            if !can_transition(from, status.status) {
                warn!(
                    step = %status.name,
                    "unexpected status change {} -> {}",
                    from.as_str(),
                    status.status.as_str()
                );
            }
            doc.set_step_status(status)
        })
        .await
    }

    async fn read(&self) -> SetupResult<StateDocument> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => StateDocument::parse(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, doc: &StateDocument) -> SetupResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, doc.to_pretty_json()?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
