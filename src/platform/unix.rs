use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::{Platform, resolve_data_dir, resolve_workspace_dir};

pub struct NativePlatform;

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Platform for NativePlatform {
    fn restrict_dir_permissions(path: &Path) {
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700));
    }

    fn restrict_file_permissions(path: &Path) {
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }

    fn scheduler_binary() -> &'static str {
        "openclaw"
    }

    fn data_dir() -> PathBuf {
        resolve_data_dir(home().join(".clawfriend"))
    }

    fn workspace_dir() -> PathBuf {
        resolve_workspace_dir(home().join(".openclaw").join("workspace"))
    }
}
