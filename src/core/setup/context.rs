use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::config::SkillConfig;
use crate::core::heartbeat::HEARTBEAT_FILE;
use crate::core::scheduler::{OpenClawCron, TriggerClient};
use crate::core::state::StateStore;
use crate::platform::{self, NativePlatform, Platform};

pub const STATE_FILE: &str = "state.json";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPaths {
    pub data_dir: PathBuf,
    /// Skill-provided task template.
    pub template: PathBuf,
    /// User-owned heartbeat file in the agent workspace.
    pub heartbeat: PathBuf,
}

impl SetupPaths {
    pub fn new(data_dir: &Path, skill_dir: &Path, workspace_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            template: skill_dir.join(HEARTBEAT_FILE),
            heartbeat: workspace_dir.join(HEARTBEAT_FILE),
        }
    }

    pub fn from_platform() -> Self {
        let data_dir = NativePlatform::data_dir();
        let skill_dir = platform::skill_dir(&data_dir);
        Self::new(&data_dir, &skill_dir, &NativePlatform::workspace_dir())
    }
}

/// Everything a step may touch, injected once per batch.
pub struct SetupContext {
    pub state: StateStore,
    pub config: SkillConfig,
    pub triggers: Arc<dyn TriggerClient>,
    pub paths: SetupPaths,
}

impl SetupContext {
    pub fn new(paths: SetupPaths, triggers: Arc<dyn TriggerClient>) -> Self {
        Self {
            state: StateStore::new(paths.data_dir.join(STATE_FILE)),
            config: SkillConfig::new(paths.data_dir.join(CONFIG_FILE)),
            triggers,
            paths,
        }
    }

    pub fn from_platform() -> Self {
        Self::new(SetupPaths::from_platform(), Arc::new(OpenClawCron::from_env()))
    }
}
