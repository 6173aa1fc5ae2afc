//! Error types for reconciliation and write coordination.

use steamsync_steam::SteamError;

/// Errors produced while syncing the catalog with Steam.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("steam error: {0}")]
    Steam(#[from] SteamError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("shortcut has no AppId assigned")]
    UnassignedAppId,

    #[error("write task ended without a result")]
    WriteAborted,
}
