use anyhow::{Context, Result};
use queue_pilot_automation::{AutomationSettings, FocusPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "QUEUE_PILOT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "queue-pilot.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client_path: Option<PathBuf>,
    pub auto_accept: bool,
    pub selection: AutomationSettings,
    pub accounts: Vec<AccountEntry>,
    pub focus_policy: FocusPolicy,
    /// Text shown on the login form, used to confirm it is on screen.
    pub visual_marker: Option<String>,
    /// Overrides the executable whose command line carries the service token.
    pub process_name: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub id: String,
    pub username: String,
    /// Prompted for at login time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for AccountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountEntry")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `$QUEUE_PILOT_CONFIG` when set and non-empty, else `queue-pilot.yaml`.
pub fn resolve_path(env_value: Option<String>) -> PathBuf {
    env_value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

impl Config {
    pub fn path() -> PathBuf {
        resolve_path(std::env::var(CONFIG_ENV).ok())
    }

    /// A missing file yields the defaults: everything off, no accounts.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for account in &self.accounts {
            if account.id.trim().is_empty() {
                anyhow::bail!("Account id cannot be empty");
            }
            if !seen.insert(account.id.as_str()) {
                anyhow::bail!("Duplicate account id '{}'", account.id);
            }
            if account.username.trim().is_empty() {
                anyhow::bail!("Account '{}' has no username", account.id);
            }
        }
        for (label, id) in [("pick", self.selection.pick), ("ban", self.selection.ban)] {
            if id.is_some_and(|id| id < 0) {
                anyhow::bail!("Selection {} champion id must not be negative", label);
            }
        }
        Ok(())
    }

    pub fn account(&self, id: &str) -> Option<&AccountEntry> {
        self.accounts.iter().find(|account| account.id == id)
    }
}
