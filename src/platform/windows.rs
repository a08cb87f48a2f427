use std::path::{Path, PathBuf};

use super::{Platform, resolve_data_dir, resolve_workspace_dir};

pub struct NativePlatform;

impl Platform for NativePlatform {
    fn restrict_dir_permissions(_path: &Path) {}

    fn restrict_file_permissions(_path: &Path) {}

    fn scheduler_binary() -> &'static str {
        "openclaw.cmd"
    }

    fn data_dir() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        resolve_data_dir(base.join("clawfriend"))
    }

    fn workspace_dir() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        resolve_workspace_dir(home.join(".openclaw").join("workspace"))
    }
}
