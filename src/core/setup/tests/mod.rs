mod activation;
mod steps;

use std::sync::Arc;

use tempfile::TempDir;

use crate::core::heartbeat::BUNDLED_TEMPLATE;
use crate::core::scheduler::memory::MemoryTriggerClient;
use crate::core::setup::SetupContext;
use crate::core::setup::context::SetupPaths;

pub(super) struct Fixture {
    _dir: TempDir,
    pub ctx: Arc<SetupContext>,
    pub triggers: Arc<MemoryTriggerClient>,
}

pub(super) fn fixture() -> Fixture {
    fixture_with(MemoryTriggerClient::new())
}

pub(super) fn fixture_with(triggers: MemoryTriggerClient) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let skill_dir = dir.path().join("skill");
    std::fs::create_dir_all(&skill_dir).unwrap();
    std::fs::write(skill_dir.join("HEARTBEAT.md"), BUNDLED_TEMPLATE).unwrap();

    let paths = SetupPaths::new(
        &dir.path().join("data"),
        &skill_dir,
        &dir.path().join("workspace"),
    );
    let triggers = Arc::new(triggers);
    let ctx = Arc::new(SetupContext::new(paths, triggers.clone()));
    Fixture {
        _dir: dir,
        ctx,
        triggers,
    }
}
