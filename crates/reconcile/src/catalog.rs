//! Contracts for the collaborators the sync core talks to: the game-library
//! catalog and the artwork store.

use std::path::{Path, PathBuf};

use steamsync_protocol::{CatalogGame, LaunchAction};
use steamsync_steam::Paths;
use tracing::debug;

use crate::error::SyncError;

/// Game-library catalog.
///
/// The host application implements this on top of its own storage.
pub trait GameCatalog {
    /// Returns every game in the catalog.
    fn games(&self) -> Result<Vec<CatalogGame>, SyncError>;

    /// Replaces the launch actions of one game.
    fn replace_actions(&mut self, game_id: &str, actions: Vec<LaunchAction>)
    -> Result<(), SyncError>;

    /// Stores the identity a game was last synced under.
    fn record_identity(
        &mut self,
        game_id: &str,
        stable_id: &str,
        app_id: u32,
    ) -> Result<(), SyncError>;

    /// Adds a new game and returns the id the catalog assigned to it.
    fn add_game(&mut self, game: CatalogGame) -> Result<String, SyncError>;
}

/// Returns the single best artwork file for a shortcut AppId.
pub trait ArtworkLookup {
    fn best_file(&self, app_id: u32) -> Option<PathBuf>;
}

/// Artwork lookup over a Steam user's grid directory.
pub struct GridArtwork {
    paths: Paths,
    user_id: String,
}

impl GridArtwork {
    pub fn new(paths: Paths, user_id: impl Into<String>) -> Self {
        Self {
            paths,
            user_id: user_id.into(),
        }
    }
}

impl ArtworkLookup for GridArtwork {
    fn best_file(&self, app_id: u32) -> Option<PathBuf> {
        self.paths.best_artwork(&self.user_id, app_id)
    }
}

/// Artwork lookup that never finds anything.
pub struct NoArtwork;

impl ArtworkLookup for NoArtwork {
    fn best_file(&self, _app_id: u32) -> Option<PathBuf> {
        None
    }
}

/// Catalog kept in memory, e.g. loaded from a JSON export.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    games: Vec<CatalogGame>,
}

impl MemoryCatalog {
    pub fn new(games: Vec<CatalogGame>) -> Self {
        Self { games }
    }

    pub fn into_games(self) -> Vec<CatalogGame> {
        self.games
    }

    /// Loads a catalog stored as a JSON array of games.
    ///
    /// A missing file yields an empty catalog.
    pub fn from_json_file(path: &Path) -> Result<Self, SyncError> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no catalog file, starting empty");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let games: Vec<CatalogGame> = serde_json::from_slice(&data)?;
        debug!(path = %path.display(), games = games.len(), "loaded catalog");
        Ok(Self::new(games))
    }

    /// Writes the catalog as pretty-printed JSON, creating parent directories.
    pub fn save_json_file(&self, path: &Path) -> Result<(), SyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&self.games)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    fn game_mut(&mut self, game_id: &str) -> Result<&mut CatalogGame, SyncError> {
        self.games
            .iter_mut()
            .find(|g| g.id == game_id)
            .ok_or_else(|| SyncError::Catalog(format!("unknown game id: {game_id}")))
    }
}

impl GameCatalog for MemoryCatalog {
    fn games(&self) -> Result<Vec<CatalogGame>, SyncError> {
        Ok(self.games.clone())
    }

    fn replace_actions(
        &mut self,
        game_id: &str,
        actions: Vec<LaunchAction>,
    ) -> Result<(), SyncError> {
        self.game_mut(game_id)?.actions = actions;
        Ok(())
    }

    fn record_identity(
        &mut self,
        game_id: &str,
        stable_id: &str,
        app_id: u32,
    ) -> Result<(), SyncError> {
        let game = self.game_mut(game_id)?;
        game.stable_id = stable_id.to_string();
        game.steam_app_id = app_id;
        Ok(())
    }

    fn add_game(&mut self, mut game: CatalogGame) -> Result<String, SyncError> {
        if game.id.is_empty() {
            game.id = if game.stable_id.is_empty() {
                format!("game-{}", self.games.len())
            } else {
                game.stable_id.clone()
            };
        }
        if self.games.iter().any(|g| g.id == game.id) {
            return Err(SyncError::Catalog(format!("duplicate game id: {}", game.id)));
        }
        let id = game.id.clone();
        self.games.push(game);
        Ok(id)
    }
}
