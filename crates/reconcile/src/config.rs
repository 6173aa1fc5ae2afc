//! Sync configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/steamsync/sync.toml`
//! - Windows: `%APPDATA%/steamsync/sync.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::launch_actions::{DEFAULT_STEAM_ACTION_NAME, LaunchActionReconciler};

/// Sync configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Steam install directory. Auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steam_dir: Option<PathBuf>,

    /// Steam user to sync. The first user with shortcuts when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Quiet window before a pending shortcuts write fires, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Ask before writing while Steam is running. When false, such writes
    /// are withheld without asking.
    #[serde(default = "default_true")]
    pub confirm_when_running: bool,

    /// Display name of the canonical Steam launch action.
    #[serde(default = "default_action_name")]
    pub launch_action_name: String,
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_action_name() -> String {
    DEFAULT_STEAM_ACTION_NAME.into()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            steam_dir: None,
            user_id: None,
            debounce_ms: default_debounce_ms(),
            confirm_when_running: default_true(),
            launch_action_name: default_action_name(),
        }
    }
}

impl SyncConfig {
    /// Loads the config from the default location.
    pub fn load() -> Result<Self, SyncError> {
        Self::load_from(&default_path())
    }

    /// Loads the config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, SyncError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Saves the config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), SyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Launch action reconciler using the configured display name.
    pub fn reconciler(&self) -> LaunchActionReconciler {
        let name = self.launch_action_name.trim();
        if name.is_empty() {
            LaunchActionReconciler::default()
        } else {
            LaunchActionReconciler::new(name)
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn default_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("steamsync").join("sync.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("steamsync")
            .join("sync.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SyncConfig::default();
        assert!(config.steam_dir.is_none());
        assert!(config.user_id.is_none());
        assert_eq!(config.debounce(), Duration::from_secs(2));
        assert!(config.confirm_when_running);
        assert_eq!(config.launch_action_name, "Play (Steam)");
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: SyncConfig = toml::from_str(r#"user_id = "12345""#).unwrap();
        assert_eq!(config.user_id.as_deref(), Some("12345"));
        assert_eq!(config.debounce_ms, 2000);
        assert!(config.confirm_when_running);
    }

    #[test]
    fn missing_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SyncConfig::load_from(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("sync.toml");

        let config = SyncConfig {
            steam_dir: Some(PathBuf::from("/opt/steam")),
            user_id: Some("42".into()),
            debounce_ms: 500,
            confirm_when_running: false,
            launch_action_name: "Steam".into(),
        };
        config.save_to(&path).unwrap();

        let loaded = SyncConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sync.toml");
        std::fs::write(&path, "debounce_ms = \"soon\"").unwrap();
        assert!(matches!(
            SyncConfig::load_from(&path),
            Err(SyncError::ConfigParse(_))
        ));
    }

    #[test]
    fn blank_action_name_falls_back() {
        let config = SyncConfig {
            launch_action_name: "  ".into(),
            ..SyncConfig::default()
        };
        assert_eq!(config.reconciler().display_name(), DEFAULT_STEAM_ACTION_NAME);
    }

    #[test]
    fn default_path_mentions_app() {
        assert!(default_path().to_string_lossy().contains("steamsync"));
    }
}
