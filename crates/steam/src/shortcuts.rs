//! Typed view of `shortcuts.vdf`.
//!
//! The document is `{"shortcuts": {"0": {...}, "1": {...}}}`. Record and tag
//! indices are regenerated on every write from the in-memory order.

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SteamError;
use crate::identity;
use crate::paths::Paths;
use crate::vdf::{self, KvMap, KvValue};

const ROOT_KEY: &str = "shortcuts";

const KEY_APP_ID: &str = "appid";
const KEY_APP_NAME: &str = "AppName";
const KEY_EXE: &str = "Exe";
const KEY_START_DIR: &str = "StartDir";
const KEY_ICON: &str = "icon";
const KEY_SHORTCUT_PATH: &str = "ShortcutPath";
const KEY_LAUNCH_OPTIONS: &str = "LaunchOptions";
const KEY_IS_HIDDEN: &str = "IsHidden";
const KEY_ALLOW_DESKTOP_CONFIG: &str = "AllowDesktopConfig";
const KEY_ALLOW_OVERLAY: &str = "AllowOverlay";
const KEY_OPEN_VR: &str = "OpenVR";
const KEY_TAGS: &str = "tags";

const KNOWN_KEYS: [&str; 12] = [
    KEY_APP_ID,
    KEY_APP_NAME,
    KEY_EXE,
    KEY_START_DIR,
    KEY_ICON,
    KEY_SHORTCUT_PATH,
    KEY_LAUNCH_OPTIONS,
    KEY_IS_HIDDEN,
    KEY_ALLOW_DESKTOP_CONFIG,
    KEY_ALLOW_OVERLAY,
    KEY_OPEN_VR,
    KEY_TAGS,
];

/// A non-Steam game entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutRecord {
    /// 0 means not yet assigned.
    pub app_id: u32,
    pub app_name: String,
    /// Usually quote-wrapped on disk.
    pub exe: String,
    pub start_dir: String,
    pub icon: String,
    pub shortcut_path: String,
    pub launch_options: String,
    pub is_hidden: bool,
    pub allow_desktop_config: bool,
    pub allow_overlay: bool,
    pub open_vr: bool,
    pub tags: Vec<String>,
    /// Keys Steam writes that this crate does not interpret
    /// (`LastPlayTime`, `Devkit`, `FlatpakAppID`, ...), kept in file order.
    #[serde(skip)]
    pub extra: KvMap,
}

impl ShortcutRecord {
    /// Creates a record with Steam's defaults for a freshly added shortcut.
    pub fn new(app_name: impl Into<String>, exe: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            exe: exe.into(),
            allow_desktop_config: true,
            allow_overlay: true,
            ..Self::default()
        }
    }

    /// AppId Steam derives for this record's exe and name.
    pub fn computed_app_id(&self) -> u32 {
        identity::generate_app_id(&self.exe, &self.app_name)
    }

    /// Assigns the computed AppId when none is set. Returns the effective id.
    pub fn ensure_app_id(&mut self) -> u32 {
        if self.app_id == 0 {
            self.app_id = self.computed_app_id();
        }
        self.app_id
    }

    /// Recomputes the AppId from the current exe and name, e.g. after either
    /// field was edited. Returns `true` if the AppId changed.
    pub fn refresh_app_id(&mut self) -> bool {
        let computed = self.computed_app_id();
        let changed = computed != self.app_id;
        self.app_id = computed;
        changed
    }

    /// Points the record at a new name and executable and recomputes the
    /// AppId. Returns `true` if the AppId changed.
    pub fn retarget(&mut self, app_name: impl Into<String>, exe: impl Into<String>) -> bool {
        self.app_name = app_name.into();
        self.exe = exe.into();
        self.refresh_app_id()
    }

    /// Library-local fingerprint of this record.
    pub fn stable_id(&self) -> String {
        identity::stable_id(&self.app_name, &self.exe)
    }

    /// `steam://rungameid/` URL for this record, empty while the AppId is unassigned.
    pub fn launch_url(&self) -> String {
        identity::expected_rungame_url(self.app_id)
    }

    fn from_kv(map: &KvMap) -> Self {
        let tags = map
            .get_ignore_case(KEY_TAGS)
            .and_then(KvValue::as_object)
            .map(|tags| tags.iter().map(|(_, v)| text_of(v)).collect())
            .unwrap_or_default();

        let extra = map
            .iter()
            .filter(|(k, _)| !KNOWN_KEYS.iter().any(|known| known.eq_ignore_ascii_case(k)))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();

        Self {
            app_id: int_field(map, KEY_APP_ID) as u32,
            app_name: string_field(map, KEY_APP_NAME),
            exe: string_field(map, KEY_EXE),
            start_dir: string_field(map, KEY_START_DIR),
            icon: string_field(map, KEY_ICON),
            shortcut_path: string_field(map, KEY_SHORTCUT_PATH),
            launch_options: string_field(map, KEY_LAUNCH_OPTIONS),
            is_hidden: int_field(map, KEY_IS_HIDDEN) != 0,
            allow_desktop_config: int_field(map, KEY_ALLOW_DESKTOP_CONFIG) != 0,
            allow_overlay: int_field(map, KEY_ALLOW_OVERLAY) != 0,
            open_vr: int_field(map, KEY_OPEN_VR) != 0,
            tags,
            extra,
        }
    }

    /// Builds the per-record object in the key order Steam itself writes.
    fn to_kv(&self) -> KvMap {
        let mut map = KvMap::new();
        map.insert(KEY_APP_ID, self.app_id as i32);
        map.insert(KEY_APP_NAME, self.app_name.as_str());
        map.insert(KEY_EXE, self.exe.as_str());
        map.insert(KEY_START_DIR, self.start_dir.as_str());
        map.insert(KEY_ICON, self.icon.as_str());
        map.insert(KEY_SHORTCUT_PATH, self.shortcut_path.as_str());
        map.insert(KEY_LAUNCH_OPTIONS, self.launch_options.as_str());
        map.insert(KEY_IS_HIDDEN, i32::from(self.is_hidden));
        map.insert(KEY_ALLOW_DESKTOP_CONFIG, i32::from(self.allow_desktop_config));
        map.insert(KEY_ALLOW_OVERLAY, i32::from(self.allow_overlay));
        map.insert(KEY_OPEN_VR, i32::from(self.open_vr));
        for (k, v) in self.extra.iter() {
            map.insert(k, v.clone());
        }
        map.insert(KEY_TAGS, indexed(self.tags.iter().map(|t| KvValue::from(t.as_str()))));
        map
    }
}

/// Maps a decoded document to records, in on-disk order.
pub fn from_document(doc: &KvMap) -> Result<Vec<ShortcutRecord>, SteamError> {
    let entries = doc
        .get_ignore_case(ROOT_KEY)
        .and_then(KvValue::as_object)
        .ok_or_else(|| SteamError::Format(format!("missing '{ROOT_KEY}' object at top level")))?;

    let mut records = Vec::with_capacity(entries.len());
    for (index, value) in entries.iter() {
        match value.as_object() {
            Some(entry) => records.push(ShortcutRecord::from_kv(entry)),
            None => tracing::warn!(index, "skipping shortcut entry that is not an object"),
        }
    }
    Ok(records)
}

/// Maps records to a document with contiguous indices from `"0"`.
pub fn to_document(records: &[ShortcutRecord]) -> KvMap {
    let mut doc = KvMap::new();
    doc.insert(
        ROOT_KEY,
        indexed(records.iter().map(|r| KvValue::Object(r.to_kv()))),
    );
    doc
}

/// Parses binary VDF data into shortcuts.
pub fn parse_shortcuts(data: &[u8]) -> Result<Vec<ShortcutRecord>, SteamError> {
    from_document(&vdf::decode(data)?)
}

/// Serializes shortcuts to binary VDF data.
pub fn serialize_shortcuts(records: &[ShortcutRecord]) -> Result<Vec<u8>, SteamError> {
    vdf::encode(&to_document(records))
}

/// Reads a shortcuts file.
///
/// A missing file is reported as [`SteamError::ShortcutsNotFound`], distinct
/// from a corrupt one ([`SteamError::Format`]).
pub fn load_shortcuts_vdf(path: &Path) -> Result<Vec<ShortcutRecord>, SteamError> {
    let data = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SteamError::ShortcutsNotFound(path.display().to_string())
        } else {
            SteamError::Io(format!("failed to read {}: {e}", path.display()))
        }
    })?;
    let records = parse_shortcuts(&data)?;
    tracing::debug!(path = %path.display(), count = records.len(), "loaded shortcuts");
    Ok(records)
}

/// Writes a shortcuts file through a temporary sibling and an atomic rename.
pub fn save_shortcuts_vdf(path: &Path, records: &[ShortcutRecord]) -> Result<(), SteamError> {
    let data = serialize_shortcuts(records)?;
    write_atomic(path, &data)?;
    tracing::info!(path = %path.display(), count = records.len(), "saved shortcuts");
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), SteamError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .map_err(|e| SteamError::Io(format!("failed to create {}: {e}", parent.display())))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| SteamError::Io(format!("not a file path: {}", path.display())))?;
    let mut temp_name = OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(format!(".{}.tmp", std::process::id()));
    let temp_path = parent.join(temp_name);

    fs::write(&temp_path, data)
        .map_err(|e| SteamError::Io(format!("failed to write {}: {e}", temp_path.display())))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(SteamError::Io(format!(
            "failed to replace {}: {e}",
            path.display()
        )));
    }
    Ok(())
}

/// Builds an object keyed `"0".."N-1"`.
fn indexed(values: impl Iterator<Item = KvValue>) -> KvMap {
    values.enumerate().map(|(i, v)| (i.to_string(), v)).collect()
}

fn string_field(map: &KvMap, key: &str) -> String {
    map.get_ignore_case(key).map(text_of).unwrap_or_default()
}

fn int_field(map: &KvMap, key: &str) -> i32 {
    match map.get_ignore_case(key) {
        Some(KvValue::Int32(v)) => *v,
        Some(KvValue::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn text_of(value: &KvValue) -> String {
    match value {
        KvValue::String(s) => s.clone(),
        KvValue::Int32(v) => v.to_string(),
        KvValue::Object(_) => String::new(),
    }
}

/// Loads and saves shortcuts for Steam users.
pub struct ShortcutManager {
    paths: Paths,
}

impl ShortcutManager {
    /// Creates a new `ShortcutManager` with auto-detected Steam paths.
    pub fn new() -> Result<Self, SteamError> {
        Ok(Self {
            paths: Paths::new()?,
        })
    }

    /// Creates a `ShortcutManager` with custom paths.
    pub fn with_paths(paths: Paths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Reads a user's shortcuts. A user without a shortcuts file has none.
    pub fn load(&self, user_id: &str) -> Result<Vec<ShortcutRecord>, SteamError> {
        match load_shortcuts_vdf(&self.paths.shortcuts_path(user_id)) {
            Err(SteamError::ShortcutsNotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Replaces a user's shortcuts file.
    pub fn save(&self, user_id: &str, records: &[ShortcutRecord]) -> Result<(), SteamError> {
        save_shortcuts_vdf(&self.paths.shortcuts_path(user_id), records)
    }
}
