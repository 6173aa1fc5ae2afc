use std::path::PathBuf;

use crate::SteamError;

/// Returns the Steam base directory on Linux.
///
/// Candidates are tried in order: native symlink, XDG data dir, Flatpak, Snap.
pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(SteamError::NotFound)?;

    let data_home = std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home.join(".local").join("share"));

    let candidates = [
        home.join(".steam").join("steam"),
        data_home.join("Steam"),
        home.join(".var")
            .join("app")
            .join("com.valvesoftware.Steam")
            .join(".steam")
            .join("steam"),
        home.join("snap")
            .join("steam")
            .join("common")
            .join(".steam")
            .join("steam"),
    ];

    candidates
        .into_iter()
        .find(|dir| dir.join("userdata").is_dir())
        .ok_or(SteamError::NotFound)
}
