//! Shortcut identity: path normalization, Steam AppId/GameID derivation and
//! the library-local StableId fingerprint.

use std::path::Path;

use crc32fast::Hasher;
use sha2::{Digest, Sha256};
use steamsync_protocol::RUNGAMEID_URL_PREFIX;

/// Bit Steam sets on every shortcut AppId.
const SHORTCUT_APP_ID_FLAG: u32 = 0x8000_0000;

/// Low 32 bits of a GameID that mark it as a non-Steam shortcut.
const SHORTCUT_GAME_ID_TAG: u64 = 0x0200_0000;

/// Normalizes a path for comparison and hashing.
///
/// Blank input yields an empty string. Otherwise one pair of wrapping double
/// quotes is removed, surrounding whitespace trimmed, and relative paths are
/// resolved against the current directory. Separators are kept as written.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let unquoted = strip_wrapping_quotes(trimmed).trim();
    if unquoted.is_empty() {
        return String::new();
    }

    if is_absolute(unquoted) {
        return unquoted.to_string();
    }

    match std::env::current_dir() {
        Ok(cwd) => cwd.join(unquoted).to_string_lossy().into_owned(),
        Err(e) => {
            tracing::debug!(path = unquoted, error = %e, "cannot resolve relative path");
            unquoted.to_string()
        }
    }
}

/// Compares two paths after normalization, ignoring case.
pub fn are_paths_equal(a: &str, b: &str) -> bool {
    normalize_path(a).to_uppercase() == normalize_path(b).to_uppercase()
}

/// Generates a Steam shortcut AppId from executable path and name.
///
/// Matches Steam's algorithm: `CRC32(exe + name) | 0x80000000`, where `exe`
/// is taken after [`normalize_path`].
pub fn generate_app_id(exe: &str, name: &str) -> u32 {
    let key = format!("{}{name}", normalize_path(exe));
    let mut hasher = Hasher::new();
    hasher.update(key.as_bytes());
    hasher.finalize() | SHORTCUT_APP_ID_FLAG
}

/// Packs a shortcut AppId into the 64-bit GameID used by `steam://rungameid/`.
pub fn to_shortcut_game_id(app_id: u32) -> u64 {
    (u64::from(app_id) << 32) | SHORTCUT_GAME_ID_TAG
}

/// Returns the launch URL Steam accepts for a shortcut, or an empty string
/// when the AppId is still unassigned.
pub fn expected_rungame_url(app_id: u32) -> String {
    if app_id == 0 {
        return String::new();
    }
    format!("{RUNGAMEID_URL_PREFIX}{}", to_shortcut_game_id(app_id))
}

/// Library-local fingerprint of a game, independent of Steam ids.
///
/// The name is trimmed (case kept), the executable only loses its wrapping
/// quotes. Uses the first 16 bytes of SHA-256 (32 hex characters).
pub fn stable_id(name: &str, exe: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.trim().as_bytes());
    hasher.update([0x00]);
    hasher.update(exe.trim_matches('"').as_bytes());
    hex::encode(&hasher.finalize()[..16])
}

/// Replaces an `{InstallDir}` placeholder and environment variable tokens
/// (`%VAR%`, `$VAR`, `${VAR}`). Unset variables are left as written.
pub fn expand_path_tokens(path: &str, install_dir: &str) -> String {
    let with_dir = replace_ignore_ascii_case(path, "{InstallDir}", install_dir);
    expand_env_tokens(&with_dir, |name| std::env::var(name).ok())
}

fn strip_wrapping_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

/// Absolute on this host, or absolute in Windows form (`C:\`, `C:/`, `\\server`).
fn is_absolute(path: &str) -> bool {
    if Path::new(path).is_absolute() || path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let lower_hay = haystack.to_ascii_lowercase();
    let lower_needle = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (idx, _) in lower_hay.match_indices(&lower_needle) {
        out.push_str(&haystack[last..idx]);
        out.push_str(replacement);
        last = idx + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}

fn expand_env_tokens(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(idx) = rest.find(['%', '$']) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        let token = if let Some(body) = tail.strip_prefix('%') {
            body.find('%').map(|end| (&body[..end], end + 2))
        } else if let Some(body) = tail.strip_prefix("${") {
            body.find('}').map(|end| (&body[..end], end + 3))
        } else {
            let body = &tail[1..];
            let end = body
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(body.len());
            Some((&body[..end], end + 1))
        };

        match token {
            Some((name, consumed)) if is_env_name(name) => {
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&tail[..consumed]),
                }
                rest = &tail[consumed..];
            }
            _ => {
                out.push_str(&tail[..1]);
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_env_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
