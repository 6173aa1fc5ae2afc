//! Keeps a catalog game's action list pointing at its Steam shortcut.

use steamsync_protocol::{ActionKind, LaunchAction};

use crate::error::SyncError;

/// Default display name of the canonical Steam launch action.
pub const DEFAULT_STEAM_ACTION_NAME: &str = "Play (Steam)";

/// Where an entry of the reconciled list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOrigin {
    /// Carried over from the input list at this index.
    Reused { original_index: usize },
    /// Newly created canonical action.
    Created,
}

/// Outcome of [`LaunchActionReconciler::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamActionReconciliation {
    /// Whether `actions` differs from the input list.
    pub changed: bool,
    pub actions: Vec<LaunchAction>,
    /// Position of the canonical Steam action in `actions`.
    pub canonical_index: usize,
    /// One entry per element of `actions`.
    pub origins: Vec<ActionOrigin>,
}

impl SteamActionReconciliation {
    /// The canonical Steam action.
    pub fn canonical(&self) -> &LaunchAction {
        &self.actions[self.canonical_index]
    }

    /// Whether the canonical action was created rather than reused.
    pub fn created(&self) -> bool {
        self.origins[self.canonical_index] == ActionOrigin::Created
    }
}

/// Merges the canonical "launch via Steam" action into an action list.
#[derive(Debug, Clone)]
pub struct LaunchActionReconciler {
    display_name: String,
}

impl Default for LaunchActionReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_STEAM_ACTION_NAME)
    }
}

impl LaunchActionReconciler {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Ensures exactly one play action exists and that it is the URL action
    /// for `expected_url`.
    ///
    /// Extra URL actions with the same path are dropped (the first one by
    /// position is kept and renamed). When none exists a new one is appended.
    /// All other actions keep their order and lose the play flag. An empty
    /// `expected_url` means the AppId is unassigned and is rejected.
    pub fn ensure(
        &self,
        actions: &[LaunchAction],
        expected_url: &str,
    ) -> Result<SteamActionReconciliation, SyncError> {
        if expected_url.is_empty() {
            return Err(SyncError::UnassignedAppId);
        }

        let is_canonical =
            |a: &LaunchAction| a.kind == ActionKind::Url && a.path == expected_url;
        let keep_index = actions.iter().position(is_canonical);

        let mut result = Vec::with_capacity(actions.len() + 1);
        let mut origins = Vec::with_capacity(actions.len() + 1);
        let mut canonical_index = None;

        for (i, action) in actions.iter().enumerate() {
            let mut action = action.clone();
            if Some(i) == keep_index {
                action.name = self.display_name.clone();
                action.is_play_action = true;
                canonical_index = Some(result.len());
            } else if is_canonical(&action) {
                continue;
            } else {
                action.is_play_action = false;
            }
            result.push(action);
            origins.push(ActionOrigin::Reused { original_index: i });
        }

        let canonical_index = match canonical_index {
            Some(idx) => idx,
            None => {
                result.push(LaunchAction::url(self.display_name.clone(), expected_url).as_play());
                origins.push(ActionOrigin::Created);
                result.len() - 1
            }
        };

        let changed = result.as_slice() != actions;
        if changed {
            tracing::debug!(
                url = expected_url,
                before = actions.len(),
                after = result.len(),
                "reconciled Steam launch action"
            );
        }

        Ok(SteamActionReconciliation {
            changed,
            actions: result,
            canonical_index,
            origins,
        })
    }
}

/// [`LaunchActionReconciler::ensure`] with the default display name.
pub fn ensure_steam_launch_action(
    actions: &[LaunchAction],
    expected_url: &str,
) -> Result<SteamActionReconciliation, SyncError> {
    LaunchActionReconciler::default().ensure(actions, expected_url)
}
