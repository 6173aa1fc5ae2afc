//! Reconciliation between a game-library catalog and Steam's non-Steam shortcuts.
//!
//! - [`duplicates`]: matches incoming games against an existing set.
//! - [`launch_actions`]: keeps the canonical "launch via Steam" action in place.
//! - [`sync`]: bulk export to Steam and import from Steam.
//! - [`coordinator`]: debounced writes guarded against a running Steam client.

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod duplicates;
pub mod error;
pub mod launch_actions;
pub mod sync;

pub use catalog::{ArtworkLookup, GameCatalog, GridArtwork, MemoryCatalog, NoArtwork};
pub use config::SyncConfig;
pub use coordinator::{
    DEFAULT_QUIET_WINDOW, ProcessProbe, WriteConfirmation, WriteCoordinator, WriteOutcome,
    WriteTicket,
};
pub use duplicates::{
    CandidateStatus, DuplicateMatch, DuplicateReport, IdentityIndex, IdentityRecord, MatchRule,
    find_duplicates,
};
pub use error::SyncError;
pub use launch_actions::{
    ActionOrigin, DEFAULT_STEAM_ACTION_NAME, LaunchActionReconciler, SteamActionReconciliation,
    ensure_steam_launch_action,
};
pub use sync::{ExportOutcome, export_games, import_shortcuts};
