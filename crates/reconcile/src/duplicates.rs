//! Duplicate detection between an existing set of games and incoming candidates.
//!
//! Rules, first match wins per candidate:
//! 1. StableId or AppId equality (hash index over the existing set).
//! 2. Same name and same executable after token expansion and path normalization.
//! 3. Same name and the candidate's expected launch URL equals the stored one.

use std::collections::HashMap;

use serde::Serialize;
use steamsync_protocol::CatalogGame;
use steamsync_steam::{
    ShortcutRecord, are_paths_equal, expand_path_tokens, expected_rungame_url, generate_app_id,
    normalize_path, stable_id,
};

/// Identity facts of one game, on either side of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityRecord {
    pub name: String,
    pub exe: String,
    pub install_dir: String,
    pub stable_id: String,
    /// 0 when unassigned.
    pub app_id: u32,
    /// Stored `steam://rungameid/` URL, empty when none.
    pub launch_url: String,
}

impl IdentityRecord {
    /// Identity of a Steam shortcut.
    pub fn from_shortcut(rec: &ShortcutRecord) -> Self {
        Self {
            name: rec.app_name.clone(),
            exe: rec.exe.clone(),
            install_dir: rec.start_dir.trim().trim_matches('"').to_string(),
            stable_id: rec.stable_id(),
            app_id: rec.app_id,
            launch_url: rec.launch_url(),
        }
    }

    /// Identity of a catalog game.
    ///
    /// Stored ids win; otherwise they are derived from the name and
    /// executable the game would be exported with.
    pub fn from_catalog(game: &CatalogGame) -> Self {
        let exe = game.launch_executable().unwrap_or_default().to_string();
        let stable = if game.stable_id.is_empty() {
            stable_id(&game.name, &exe)
        } else {
            game.stable_id.clone()
        };
        let app_id = if game.steam_app_id == 0 && !normalize_path(&exe).is_empty() {
            generate_app_id(&exe, &game.name)
        } else {
            game.steam_app_id
        };
        Self {
            name: game.name.clone(),
            exe,
            install_dir: game.install_dir.clone(),
            stable_id: stable,
            app_id,
            launch_url: game.stored_launch_url().unwrap_or_default().to_string(),
        }
    }
}

/// Which rule matched a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchRule {
    Identity,
    ExecutablePath,
    LaunchUrl,
}

/// A candidate found to duplicate an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateMatch {
    /// Index into the existing set.
    pub existing: usize,
    pub rule: MatchRule,
}

/// Classification of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateStatus {
    /// Index into the candidate set.
    pub candidate: usize,
    pub duplicate_of: Option<DuplicateMatch>,
    /// Duplicates start deselected, everything else selected.
    pub selected: bool,
}

/// Result of matching candidates against an existing set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    pub statuses: Vec<CandidateStatus>,
}

impl DuplicateReport {
    /// Candidate indices that are selected for import/export.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.statuses
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.candidate)
    }

    /// Candidates flagged as duplicates, with their match.
    pub fn duplicates(&self) -> impl Iterator<Item = (usize, DuplicateMatch)> + '_ {
        self.statuses
            .iter()
            .filter_map(|s| s.duplicate_of.map(|m| (s.candidate, m)))
    }

    /// Overrides the default selection of a candidate.
    pub fn set_selected(&mut self, candidate: usize, selected: bool) {
        if let Some(status) = self.statuses.iter_mut().find(|s| s.candidate == candidate) {
            status.selected = selected;
        }
    }
}

/// Hash index over a set of identities.
///
/// Entries can be added while a batch is applied, so later candidates are
/// also checked against the ones accepted before them. For a repeated
/// StableId or AppId the first inserted entry wins.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    records: Vec<IdentityRecord>,
    by_stable_id: HashMap<String, usize>,
    by_app_id: HashMap<u32, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl IdentityIndex {
    pub fn new(records: impl IntoIterator<Item = IdentityRecord>) -> Self {
        let mut index = Self::default();
        for rec in records {
            index.insert(rec);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds an identity and returns its position in the index.
    pub fn insert(&mut self, rec: IdentityRecord) -> usize {
        let i = self.records.len();
        if !rec.stable_id.is_empty() {
            self.by_stable_id.entry(rec.stable_id.clone()).or_insert(i);
        }
        if rec.app_id != 0 {
            self.by_app_id.entry(rec.app_id).or_insert(i);
        }
        self.by_name
            .entry(rec.name.trim().to_string())
            .or_default()
            .push(i);
        self.records.push(rec);
        i
    }

    /// Returns the first rule matching `candidate`, with the index of the
    /// matched entry.
    pub fn find(&self, candidate: &IdentityRecord) -> Option<DuplicateMatch> {
        self.by_identity(candidate)
            .map(|existing| DuplicateMatch {
                existing,
                rule: MatchRule::Identity,
            })
            .or_else(|| self.by_name_rules(candidate))
    }

    fn by_identity(&self, candidate: &IdentityRecord) -> Option<usize> {
        let by_stable = (!candidate.stable_id.is_empty())
            .then(|| self.by_stable_id.get(candidate.stable_id.as_str()))
            .flatten();
        let by_app = (candidate.app_id != 0)
            .then(|| self.by_app_id.get(&candidate.app_id))
            .flatten();
        match (by_stable, by_app) {
            (Some(&a), Some(&b)) => Some(a.min(b)),
            (Some(&a), None) | (None, Some(&a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Rules 2 and 3, only tried for candidates rule 1 left unresolved.
    fn by_name_rules(&self, candidate: &IdentityRecord) -> Option<DuplicateMatch> {
        let same_name = self.by_name.get(candidate.name.trim())?;

        let candidate_exe = expand_path_tokens(&candidate.exe, &candidate.install_dir);
        if !normalize_path(&candidate_exe).is_empty() {
            let hit = same_name.iter().copied().find(|&i| {
                let other = &self.records[i];
                let other_exe = expand_path_tokens(&other.exe, &other.install_dir);
                !normalize_path(&other_exe).is_empty()
                    && are_paths_equal(&candidate_exe, &other_exe)
            });
            if let Some(existing) = hit {
                return Some(DuplicateMatch {
                    existing,
                    rule: MatchRule::ExecutablePath,
                });
            }
        }

        let expected = expected_rungame_url(candidate.app_id);
        if expected.is_empty() {
            return None;
        }
        same_name
            .iter()
            .copied()
            .find(|&i| self.records[i].launch_url == expected)
            .map(|existing| DuplicateMatch {
                existing,
                rule: MatchRule::LaunchUrl,
            })
    }
}

/// Classifies every candidate as a duplicate of an existing entry or new.
pub fn find_duplicates(
    existing: &[IdentityRecord],
    candidates: &[IdentityRecord],
) -> DuplicateReport {
    let index = IdentityIndex::new(existing.iter().cloned());

    let statuses = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let duplicate_of = index.find(candidate);
            CandidateStatus {
                candidate: i,
                duplicate_of,
                selected: duplicate_of.is_none(),
            }
        })
        .collect::<Vec<_>>();

    let dup_count = statuses.iter().filter(|s| s.duplicate_of.is_some()).count();
    tracing::debug!(
        existing = existing.len(),
        candidates = candidates.len(),
        duplicates = dup_count,
        "duplicate scan finished"
    );

    DuplicateReport { statuses }
}
