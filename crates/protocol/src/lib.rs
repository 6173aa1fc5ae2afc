pub mod types;

// Re-export primary types for convenience.
pub use types::{
    ActionKind, BatchReport, CatalogGame, LaunchAction, RUNGAMEID_URL_PREFIX, SkippedRecord,
};
