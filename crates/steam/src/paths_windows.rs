use std::path::PathBuf;

use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};

use crate::SteamError;

/// Default install location when the registry has no entry.
const DEFAULT_STEAM_DIR: &str = r"C:\Program Files (x86)\Steam";

/// Returns the Steam base directory on Windows.
///
/// The per-user `SteamPath` wins over the machine-wide `InstallPath`.
pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    let lookups = [
        (HKEY_CURRENT_USER, r"Software\Valve\Steam", "SteamPath"),
        (HKEY_LOCAL_MACHINE, r"SOFTWARE\Wow6432Node\Valve\Steam", "InstallPath"),
        (HKEY_LOCAL_MACHINE, r"SOFTWARE\Valve\Steam", "InstallPath"),
    ];

    for (hive, subkey, value) in lookups {
        if let Some(path) = read_registry_path(hive, subkey, value)
            && path.is_dir()
        {
            return Ok(path);
        }
    }

    let fallback = PathBuf::from(DEFAULT_STEAM_DIR);
    if fallback.is_dir() {
        return Ok(fallback);
    }

    Err(SteamError::NotFound)
}

fn read_registry_path(hive: winreg::HKEY, subkey: &str, value: &str) -> Option<PathBuf> {
    let key = RegKey::predef(hive).open_subkey(subkey).ok()?;
    let raw: String = key.get_value(value).ok()?;
    Some(PathBuf::from(raw.replace('/', "\\")))
}
