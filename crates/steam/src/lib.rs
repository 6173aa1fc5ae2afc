pub mod controller;
pub mod identity;
pub mod paths;
#[cfg(target_os = "linux")]
pub mod paths_linux;
#[cfg(target_os = "windows")]
pub mod paths_windows;
pub mod shortcuts;
pub mod users;
pub mod vdf;

// Re-export primary types.
pub use controller::Controller;
pub use identity::{
    are_paths_equal, expand_path_tokens, expected_rungame_url, generate_app_id, normalize_path,
    stable_id, to_shortcut_game_id,
};
pub use paths::{ArtworkType, Paths};
pub use shortcuts::{
    ShortcutManager, ShortcutRecord, load_shortcuts_vdf, parse_shortcuts, save_shortcuts_vdf,
    serialize_shortcuts,
};
pub use users::{
    DisplayNames, User, display_name_or_default, get_users, get_users_with_paths, select_user,
};
pub use vdf::{KvMap, KvValue};

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("steam installation not found")]
    NotFound,

    #[error("steam user not found")]
    UserNotFound,

    #[error("shortcuts file not found: {0}")]
    ShortcutsNotFound(String),

    #[error("VDF format error: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(String),
}
