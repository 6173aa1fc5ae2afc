//! Bulk transfer between the game catalog and a user's shortcuts.
//!
//! Both directions run duplicate detection first. Duplicates are reported
//! and left alone, and so are repeats of a record already accepted earlier
//! in the same batch. Records that cannot be transferred are skipped and
//! reported individually without aborting the batch.

use std::collections::HashSet;
use std::path::Path;

use steamsync_protocol::{ActionKind, BatchReport, CatalogGame, LaunchAction};
use steamsync_steam::{ShortcutRecord, expand_path_tokens, normalize_path};
use tracing::{debug, info, warn};

use crate::catalog::{ArtworkLookup, GameCatalog, NoArtwork};
use crate::duplicates::{IdentityIndex, IdentityRecord, MatchRule, find_duplicates};
use crate::error::SyncError;
use crate::launch_actions::LaunchActionReconciler;

/// Result of [`export_games`].
#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    /// Existing shortcuts (some possibly updated) followed by the newly
    /// exported ones.
    pub shortcuts: Vec<ShortcutRecord>,
    pub report: BatchReport,
}

/// Exports catalog games that are not yet in `existing` as Steam shortcuts.
///
/// Each exported game gets its canonical Steam launch action and has its
/// identity recorded in the catalog. A game matched through the identity it
/// was last synced under, but renamed or moved since, has its shortcut
/// retargeted: new name and exe, recomputed AppId, new launch action.
pub fn export_games(
    catalog: &mut dyn GameCatalog,
    existing: &[ShortcutRecord],
    artwork: &dyn ArtworkLookup,
    reconciler: &LaunchActionReconciler,
) -> Result<ExportOutcome, SyncError> {
    let games = catalog.games()?;
    let existing_ids: Vec<_> = existing.iter().map(IdentityRecord::from_shortcut).collect();
    let candidate_ids: Vec<_> = games.iter().map(IdentityRecord::from_catalog).collect();
    let matches = find_duplicates(&existing_ids, &candidate_ids);

    let mut report = BatchReport::default();
    let mut shortcuts = existing.to_vec();
    // Identities written by this batch.
    let mut accepted = IdentityIndex::default();
    let mut retargeted = HashSet::new();

    for (idx, m) in matches.duplicates() {
        let game = &games[idx];
        let shortcut = &mut shortcuts[m.existing];
        let follow = m.rule == MatchRule::Identity && !retargeted.contains(&m.existing);
        let result = if follow {
            follow_rename(catalog, game, shortcut, reconciler)
        } else {
            Ok(false)
        };

        match result {
            Ok(true) => {
                retargeted.insert(m.existing);
                accepted.insert(IdentityRecord::from_shortcut(shortcut));
                report.updated.push(game.name.clone());
            }
            Ok(false) => {
                debug!(
                    game = %game.name,
                    existing = %shortcut.app_name,
                    rule = ?m.rule,
                    "already in Steam"
                );
                report.duplicates.push(game.name.clone());
            }
            Err(e) => {
                warn!(game = %game.name, error = %e, "updating shortcut failed");
                report.skip(&game.name, e.to_string());
            }
        }
    }

    for idx in matches.selected() {
        let game = &games[idx];
        let Some(record) = shortcut_for(game, artwork) else {
            report.skip(&game.name, "no executable");
            continue;
        };

        let identity = IdentityRecord::from_shortcut(&record);
        if let Some(first) = accepted.find(&identity) {
            debug!(game = %game.name, rule = ?first.rule, "repeats a game earlier in the batch");
            report.duplicates.push(game.name.clone());
            continue;
        }

        match apply_identity(catalog, game, &record, "", reconciler) {
            Ok(()) => {
                accepted.insert(identity);
                report.processed.push(game.name.clone());
                shortcuts.push(record);
            }
            Err(e) => {
                warn!(game = %game.name, error = %e, "export failed");
                report.skip(&game.name, e.to_string());
            }
        }
    }

    info!(
        exported = report.processed.len(),
        updated = report.updated.len(),
        duplicates = report.duplicates.len(),
        skipped = report.skipped.len(),
        "export finished"
    );
    Ok(ExportOutcome { shortcuts, report })
}

/// Imports shortcuts that the catalog does not know yet as new games.
pub fn import_shortcuts(
    catalog: &mut dyn GameCatalog,
    shortcuts: &[ShortcutRecord],
    reconciler: &LaunchActionReconciler,
) -> Result<BatchReport, SyncError> {
    let games = catalog.games()?;
    let existing_ids: Vec<_> = games.iter().map(IdentityRecord::from_catalog).collect();
    let candidate_ids: Vec<_> = shortcuts.iter().map(IdentityRecord::from_shortcut).collect();
    let matches = find_duplicates(&existing_ids, &candidate_ids);

    let mut report = BatchReport::default();
    for (idx, _) in matches.duplicates() {
        report.duplicates.push(shortcuts[idx].app_name.clone());
    }

    let mut accepted = IdentityIndex::default();
    for idx in matches.selected() {
        let shortcut = &shortcuts[idx];
        let name = shortcut.app_name.trim();
        if name.is_empty() {
            report.skip(&shortcut.app_name, "empty name");
            continue;
        }
        if unquote(&shortcut.exe).is_empty() {
            report.skip(name, "no executable");
            continue;
        }

        let game = match game_for(shortcut, reconciler) {
            Ok(game) => game,
            Err(e) => {
                report.skip(name, e.to_string());
                continue;
            }
        };
        let identity = IdentityRecord::from_catalog(&game);
        if accepted.find(&identity).is_some() {
            debug!(game = name, "repeats a shortcut earlier in the batch");
            report.duplicates.push(name.to_string());
            continue;
        }

        match catalog.add_game(game) {
            Ok(id) => {
                debug!(game = name, id = %id, "imported shortcut");
                accepted.insert(identity);
                report.processed.push(name.to_string());
            }
            Err(e) => {
                warn!(game = name, error = %e, "import failed");
                report.skip(name, e.to_string());
            }
        }
    }

    info!(
        imported = report.processed.len(),
        duplicates = report.duplicates.len(),
        skipped = report.skipped.len(),
        "import finished"
    );
    Ok(report)
}

/// Brings a shortcut in line with the current name and executable of the
/// game it was synced from. Returns `false` if both still agree.
fn follow_rename(
    catalog: &mut dyn GameCatalog,
    game: &CatalogGame,
    shortcut: &mut ShortcutRecord,
    reconciler: &LaunchActionReconciler,
) -> Result<bool, SyncError> {
    let Some(target) = shortcut_for(game, &NoArtwork) else {
        return Ok(false);
    };
    if shortcut.app_name.trim() == target.app_name
        && normalize_path(&shortcut.exe) == normalize_path(&target.exe)
    {
        return Ok(false);
    }

    let stale_url = shortcut.launch_url();
    let mut updated = shortcut.clone();
    updated.retarget(target.app_name, target.exe);
    updated.start_dir = target.start_dir;
    apply_identity(catalog, game, &updated, &stale_url, reconciler)?;

    info!(
        game = %game.name,
        old_app_id = shortcut.app_id,
        new_app_id = updated.app_id,
        "shortcut follows renamed game"
    );
    *shortcut = updated;
    Ok(true)
}

fn shortcut_for(game: &CatalogGame, artwork: &dyn ArtworkLookup) -> Option<ShortcutRecord> {
    let exe = expand_path_tokens(game.launch_executable()?, &game.install_dir);
    let exe = unquote(&exe);
    if exe.is_empty() {
        return None;
    }

    let start_dir = match unquote(&game.install_dir) {
        "" => Path::new(exe)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default(),
        dir => dir.to_string(),
    };

    let mut record = ShortcutRecord::new(game.name.trim(), quote(exe));
    record.start_dir = quote(&start_dir);
    record.tags = game.tags.clone();
    let app_id = record.ensure_app_id();
    if let Some(icon) = artwork.best_file(app_id) {
        record.icon = icon.to_string_lossy().into_owned();
    }
    Some(record)
}

fn apply_identity(
    catalog: &mut dyn GameCatalog,
    game: &CatalogGame,
    record: &ShortcutRecord,
    stale_url: &str,
    reconciler: &LaunchActionReconciler,
) -> Result<(), SyncError> {
    let is_stale = |a: &LaunchAction| a.kind == ActionKind::Url && a.path == stale_url;
    let kept: Vec<_> = game
        .actions
        .iter()
        .filter(|a| stale_url.is_empty() || !is_stale(a))
        .cloned()
        .collect();

    let reconciled = reconciler.ensure(&kept, &record.launch_url())?;
    if reconciled.changed || kept.len() != game.actions.len() {
        catalog.replace_actions(&game.id, reconciled.actions)?;
    }
    catalog.record_identity(&game.id, &record.stable_id(), record.app_id)
}

fn game_for(
    shortcut: &ShortcutRecord,
    reconciler: &LaunchActionReconciler,
) -> Result<CatalogGame, SyncError> {
    let mut shortcut = shortcut.clone();
    let app_id = shortcut.ensure_app_id();
    let actions = reconciler.ensure(&[], &shortcut.launch_url())?.actions;

    Ok(CatalogGame {
        id: String::new(),
        name: shortcut.app_name.trim().to_string(),
        install_dir: unquote(&shortcut.start_dir).to_string(),
        executable: unquote(&shortcut.exe).to_string(),
        tags: shortcut.tags.clone(),
        actions,
        stable_id: shortcut.stable_id(),
        steam_app_id: app_id,
    })
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"')
}

fn quote(s: &str) -> String {
    format!("\"{s}\"")
}
