use std::path::{Path, PathBuf};

/// Platform-specific operations abstracted behind a common interface.
/// Each OS provides its own `NativePlatform` implementation so call sites
/// remain free of `#[cfg]` blocks.
pub trait Platform {
    /// Set restrictive *directory* permissions (0o700 on Unix, no-op on Windows).
    fn restrict_dir_permissions(path: &Path);

    /// Set restrictive *file* permissions (0o600 on Unix, no-op on Windows).
    fn restrict_file_permissions(path: &Path);

    /// Binary filename of the scheduler CLI (`"openclaw"` / `"openclaw.cmd"`).
    fn scheduler_binary() -> &'static str;

    /// Root data directory for clawfriend.
    /// Unix: `~/.clawfriend`, Windows: `%APPDATA%\clawfriend`.
    fn data_dir() -> PathBuf;

    /// Agent workspace holding the user's `HEARTBEAT.md`.
    fn workspace_dir() -> PathBuf;
}

/// `CLAWFRIEND_HOME` wins over the platform default so tests and
/// multi-agent hosts can point at an isolated directory.
pub(crate) fn resolve_data_dir(default: PathBuf) -> PathBuf {
    env_path("CLAWFRIEND_HOME").unwrap_or(default)
}

pub(crate) fn resolve_workspace_dir(default: PathBuf) -> PathBuf {
    env_path("OPENCLAW_WORKSPACE").unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Directory holding the skill's bundled files (`HEARTBEAT.md` template).
pub fn skill_dir(data_dir: &Path) -> PathBuf {
    env_path("CLAWFRIEND_SKILL_DIR").unwrap_or_else(|| data_dir.join("skill"))
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::NativePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativePlatform;
