use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::SteamError;

/// Type of Steam artwork stored in the grid directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtworkType {
    /// 1920x620 header.
    Hero,
    /// 600x900 vertical capsule.
    Poster,
    /// 460x215 horizontal capsule.
    Cover,
    /// Square icon.
    Icon,
    /// Transparent logo.
    Logo,
}

/// Lookup order when a single representative image is needed.
pub const BEST_ARTWORK_PRIORITY: [ArtworkType; 4] = [
    ArtworkType::Hero,
    ArtworkType::Poster,
    ArtworkType::Cover,
    ArtworkType::Icon,
];

/// Image extensions Steam picks up from the grid directory.
const ARTWORK_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "ico"];

impl ArtworkType {
    /// Returns all artwork types.
    pub fn all() -> &'static [ArtworkType] {
        &[
            ArtworkType::Hero,
            ArtworkType::Poster,
            ArtworkType::Cover,
            ArtworkType::Icon,
            ArtworkType::Logo,
        ]
    }

    /// Returns the filename suffix for this artwork type.
    fn suffix(&self) -> &'static str {
        match self {
            ArtworkType::Hero => "_hero",
            ArtworkType::Poster => "p",
            ArtworkType::Cover => "",
            ArtworkType::Icon => "_icon",
            ArtworkType::Logo => "_logo",
        }
    }
}

impl fmt::Display for ArtworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtworkType::Hero => write!(f, "hero"),
            ArtworkType::Poster => write!(f, "poster"),
            ArtworkType::Cover => write!(f, "cover"),
            ArtworkType::Icon => write!(f, "icon"),
            ArtworkType::Logo => write!(f, "logo"),
        }
    }
}

/// Provides access to Steam directory paths.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Creates a new `Paths` instance with auto-detected Steam directory.
    pub fn new() -> Result<Self, SteamError> {
        let base_dir = get_base_dir()?;
        Ok(Self { base_dir })
    }

    /// Creates a new `Paths` instance with a custom base directory.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the Steam base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the userdata directory.
    pub fn user_data_dir(&self) -> PathBuf {
        self.base_dir.join("userdata")
    }

    /// Returns the directory for a specific user.
    pub fn user_dir(&self, user_id: &str) -> PathBuf {
        self.user_data_dir().join(user_id)
    }

    /// Returns the config directory for a user.
    pub fn config_dir(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("config")
    }

    /// Returns the path to shortcuts.vdf for a user.
    pub fn shortcuts_path(&self, user_id: &str) -> PathBuf {
        self.config_dir(user_id).join("shortcuts.vdf")
    }

    /// Returns the grid artwork directory for a user.
    pub fn grid_dir(&self, user_id: &str) -> PathBuf {
        self.config_dir(user_id).join("grid")
    }

    /// Returns true if the user has a shortcuts.vdf file.
    pub fn has_shortcuts(&self, user_id: &str) -> bool {
        self.shortcuts_path(user_id).exists()
    }

    /// Creates the grid directory if it doesn't exist.
    pub fn ensure_grid_dir(&self, user_id: &str) -> Result<(), SteamError> {
        fs::create_dir_all(self.grid_dir(user_id))
            .map_err(|e| SteamError::Io(format!("failed to create grid dir: {e}")))
    }

    /// Returns the path for a specific artwork type.
    pub fn artwork_path(
        &self,
        user_id: &str,
        app_id: u32,
        art_type: ArtworkType,
        ext: &str,
    ) -> PathBuf {
        self.grid_dir(user_id)
            .join(artwork_filename(app_id, art_type, ext))
    }

    /// Finds an existing artwork file of one type, trying every known extension.
    pub fn find_artwork(
        &self,
        user_id: &str,
        app_id: u32,
        art_type: ArtworkType,
    ) -> Option<PathBuf> {
        ARTWORK_EXTENSIONS
            .iter()
            .map(|ext| self.artwork_path(user_id, app_id, art_type, ext))
            .find(|path| path.is_file())
    }

    /// Returns the single best artwork file for an app, following
    /// [`BEST_ARTWORK_PRIORITY`].
    pub fn best_artwork(&self, user_id: &str, app_id: u32) -> Option<PathBuf> {
        BEST_ARTWORK_PRIORITY
            .iter()
            .find_map(|&art_type| self.find_artwork(user_id, app_id, art_type))
    }
}

/// Generates the filename for artwork based on type.
fn artwork_filename(app_id: u32, art_type: ArtworkType, ext: &str) -> String {
    let ext = if ext.is_empty() { "png" } else { ext };
    format!("{}{}.{}", app_id, art_type.suffix(), ext)
}

// Platform-specific base directory detection.
#[cfg(target_os = "linux")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_linux::get_base_dir()
}

#[cfg(target_os = "windows")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_windows::get_base_dir()
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    Err(SteamError::NotFound)
}
