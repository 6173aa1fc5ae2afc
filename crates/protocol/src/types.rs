use serde::{Deserialize, Serialize};

/// URL prefix Steam uses to launch a game by its 64-bit GameID.
pub const RUNGAMEID_URL_PREFIX: &str = "steam://rungameid/";

/// How a launch action starts the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "emulator")]
    Emulator,
}

/// A single way of launching a catalog game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchAction {
    pub name: String,
    pub kind: ActionKind,
    pub path: String,
    #[serde(default)]
    pub is_play_action: bool,
}

impl LaunchAction {
    /// Creates a URL action.
    pub fn url(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ActionKind::Url,
            path: path.into(),
            is_play_action: false,
        }
    }

    /// Creates a file (executable) action.
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ActionKind::File,
            path: path.into(),
            is_play_action: false,
        }
    }

    /// Marks this action as the play action.
    pub fn as_play(mut self) -> Self {
        self.is_play_action = true;
        self
    }
}

/// A game as seen by the external game-library catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGame {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub install_dir: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub executable: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub actions: Vec<LaunchAction>,
    /// Library-local fingerprint recorded at the last sync, empty if never synced.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stable_id: String,
    /// Shortcut AppId recorded at the last sync, 0 if never synced.
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub steam_app_id: u32,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

impl CatalogGame {
    /// Returns the first `steam://rungameid/` URL stored in the action list.
    pub fn stored_launch_url(&self) -> Option<&str> {
        self.actions
            .iter()
            .find(|a| a.kind == ActionKind::Url && a.path.starts_with(RUNGAMEID_URL_PREFIX))
            .map(|a| a.path.as_str())
    }

    /// Returns the executable that launches this game.
    ///
    /// Prefers the explicit `executable` field, then the file play action,
    /// then the first file action.
    pub fn launch_executable(&self) -> Option<&str> {
        if !self.executable.trim().is_empty() {
            return Some(self.executable.as_str());
        }
        let files = || self.actions.iter().filter(|a| a.kind == ActionKind::File);
        files()
            .find(|a| a.is_play_action)
            .or_else(|| files().next())
            .map(|a| a.path.as_str())
            .filter(|p| !p.trim().is_empty())
    }
}

/// A record left out of a bulk operation, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub name: String,
    pub reason: String,
}

/// Per-record outcome of a bulk import or export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Names of the records that were applied.
    #[serde(default)]
    pub processed: Vec<String>,
    /// Names of existing records that were changed to follow their source,
    /// e.g. a renamed game whose shortcut got a new name and AppId.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<String>,
    /// Names of the records matched as duplicates and left alone.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}

impl BatchReport {
    /// Records a skipped entry.
    pub fn skip(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedRecord {
            name: name.into(),
            reason: reason.into(),
        });
    }

    /// Returns `true` if no record was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
