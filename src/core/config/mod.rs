use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::core::error::SetupResult;
use crate::platform::{NativePlatform, Platform};

pub const API_DOMAIN: &str = "API_DOMAIN";
pub const AGENT_NAME: &str = "AGENT_NAME";
pub const AGENT_ID: &str = "AGENT_ID";
pub const API_KEY: &str = "CLAW_FRIEND_API_KEY";
pub const EVM_PRIVATE_KEY: &str = "EVM_PRIVATE_KEY";
pub const EVM_ADDRESS: &str = "EVM_ADDRESS";

/// Keys whose values are masked when printed.
pub const SECRET_KEYS: &[&str] = &[API_KEY, EVM_PRIVATE_KEY];

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Env-style settings of the skill, persisted as `{ "env": { KEY: VALUE } }`.
///
/// Reads fall back to the process environment when the file has no value, so
/// an agent runtime can inject settings without touching the file.
pub struct SkillConfig {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SkillConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> SetupResult<Option<String>> {
        let file = {
            let _guard = self.lock.lock().await;
            self.read().await?
        };
        let value = file
            .env
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .or_else(|| std::env::var(key).ok().filter(|v| !v.trim().is_empty()));
        Ok(value)
    }

    pub async fn get_or(&self, key: &str, default: &str) -> SetupResult<String> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.to_string()))
    }

    /// Merge `partial` into the stored settings; keys not named are kept.
    pub async fn set<I, K, V>(&self, partial: I) -> SetupResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;
        for (k, v) in partial {
            file.env.insert(k.into(), v.into());
        }
        self.write(&file).await
    }

    pub async fn entries(&self) -> SetupResult<BTreeMap<String, String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.env)
    }

    async fn read(&self) -> SetupResult<ConfigFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(ConfigFile::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, file: &ConfigFile) -> SetupResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Holds the wallet key.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, "").await?;
        NativePlatform::restrict_file_permissions(&tmp);
        tokio::fs::write(&tmp, serde_json::to_string_pretty(file)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

pub fn mask_secret(key: &str, value: &str) -> String {
    if !SECRET_KEYS.contains(&key) {
        return value.to_string();
    }
    let visible: String = value.chars().take(6).collect();
    format!("{}…", visible)
}
