use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::events::{EventRow, ResolvedEvent};
use crate::feed::{FeedLoader, MatchFiles};
use crate::resolve::resolve_match;

pub const DEFAULT_LINEUP_SUFFIX: &str = "_f7.json";
pub const DEFAULT_EVENTS_SUFFIX: &str = "_f24.json";

/// File-name suffixes that identify lineup and events files. Stripping the
/// suffix from a file name yields the match base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingRules {
    pub lineup_suffix: String,
    pub events_suffix: String,
}

impl Default for PairingRules {
    fn default() -> Self {
        Self {
            lineup_suffix: DEFAULT_LINEUP_SUFFIX.to_string(),
            events_suffix: DEFAULT_EVENTS_SUFFIX.to_string(),
        }
    }
}

impl PairingRules {
    pub fn lineup_base(&self, path: &Path) -> Option<String> {
        base_name(path, &self.lineup_suffix)
    }

    pub fn events_base(&self, path: &Path) -> Option<String> {
        base_name(path, &self.events_suffix)
    }
}

fn base_name(path: &Path, suffix: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let base = name.strip_suffix(suffix)?;
    if base.is_empty() {
        return None;
    }
    Some(base.to_string())
}

/// The set of files submitted together. Order is upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedUploads {
    pub lineups: Vec<PathBuf>,
    pub events: Vec<PathBuf>,
}

impl FeedUploads {
    pub fn is_empty(&self) -> bool {
        self.lineups.is_empty() && self.events.is_empty()
    }
}

/// Per-match problems. None of these stop other matches from loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchIssue {
    MissingEvents { match_id: String },
    MissingLineup { match_id: String },
    DuplicateFile { match_id: String, path: PathBuf },
    UnrecognizedFile { path: PathBuf },
    LoadFailed { match_id: String, message: String },
}

impl MatchIssue {
    pub fn match_id(&self) -> Option<&str> {
        match self {
            MatchIssue::MissingEvents { match_id }
            | MatchIssue::MissingLineup { match_id }
            | MatchIssue::DuplicateFile { match_id, .. }
            | MatchIssue::LoadFailed { match_id, .. } => Some(match_id),
            MatchIssue::UnrecognizedFile { .. } => None,
        }
    }

    pub fn is_load_error(&self) -> bool {
        matches!(self, MatchIssue::LoadFailed { .. })
    }

    /// Console line with the level prefix used across the app.
    pub fn log_line(&self) -> String {
        let level = if self.is_load_error() { "ERROR" } else { "WARN" };
        format!("[{level}] {self}")
    }
}

impl fmt::Display for MatchIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchIssue::MissingEvents { match_id } => {
                write!(f, "no events file found for '{match_id}'")
            }
            MatchIssue::MissingLineup { match_id } => {
                write!(f, "no lineup file found for '{match_id}'")
            }
            MatchIssue::DuplicateFile { match_id, path } => write!(
                f,
                "duplicate file for '{match_id}' skipped: {}",
                path.display()
            ),
            MatchIssue::UnrecognizedFile { path } => {
                write!(f, "file name has no known suffix: {}", path.display())
            }
            MatchIssue::LoadFailed { match_id, message } => {
                write!(f, "error loading match '{match_id}': {message}")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    pub matches: Vec<MatchFiles>,
    pub issues: Vec<MatchIssue>,
}

/// Pair lineup and events files by base name, in lineup upload order.
pub fn pair_feed_files(uploads: &FeedUploads, rules: &PairingRules) -> Pairing {
    let mut issues = Vec::new();

    let mut events_by_base: HashMap<String, PathBuf> = HashMap::new();
    let mut events_order: Vec<String> = Vec::new();
    for path in &uploads.events {
        let Some(base) = rules.events_base(path) else {
            issues.push(MatchIssue::UnrecognizedFile { path: path.clone() });
            continue;
        };
        if events_by_base.contains_key(&base) {
            issues.push(MatchIssue::DuplicateFile {
                match_id: base,
                path: path.clone(),
            });
            continue;
        }
        events_order.push(base.clone());
        events_by_base.insert(base, path.clone());
    }

    let mut matches = Vec::new();
    let mut seen_lineups = HashSet::new();
    for path in &uploads.lineups {
        let Some(base) = rules.lineup_base(path) else {
            issues.push(MatchIssue::UnrecognizedFile { path: path.clone() });
            continue;
        };
        if !seen_lineups.insert(base.clone()) {
            issues.push(MatchIssue::DuplicateFile {
                match_id: base,
                path: path.clone(),
            });
            continue;
        }
        match events_by_base.get(&base) {
            Some(events) => matches.push(MatchFiles {
                match_id: base,
                lineup: path.clone(),
                events: events.clone(),
            }),
            None => issues.push(MatchIssue::MissingEvents { match_id: base }),
        }
    }

    for base in events_order {
        if !seen_lineups.contains(&base) {
            issues.push(MatchIssue::MissingLineup { match_id: base });
        }
    }

    Pairing { matches, issues }
}

/// List lineup/events files in `dir`, sorted by file name.
pub fn discover_feed_files(dir: &Path, rules: &PairingRules) -> Result<FeedUploads> {
    let entries = fs::read_dir(dir).with_context(|| format!("read feed dir {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("list feed dir {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut uploads = FeedUploads::default();
    for path in paths {
        if rules.lineup_base(&path).is_some() {
            uploads.lineups.push(path);
        } else if rules.events_base(&path).is_some() {
            uploads.events.push(path);
        }
    }
    Ok(uploads)
}

/// One successfully loaded and name-resolved match.
#[derive(Debug, Clone)]
pub struct LoadedMatch {
    pub match_id: String,
    pub events: Vec<ResolvedEvent>,
}

/// Run the loader for every pair. Loads run in parallel; results keep the
/// order of `pairs`. A failing pair becomes a `LoadFailed` issue.
pub fn load_matches(
    loader: &dyn FeedLoader,
    pairs: &[MatchFiles],
) -> (Vec<LoadedMatch>, Vec<MatchIssue>) {
    let results: Vec<Result<LoadedMatch, MatchIssue>> = pairs
        .par_iter()
        .map(|files| load_match(loader, files))
        .collect();

    let mut matches = Vec::new();
    let mut issues = Vec::new();
    for result in results {
        match result {
            Ok(loaded) => matches.push(loaded),
            Err(issue) => issues.push(issue),
        }
    }
    (matches, issues)
}

fn load_match(loader: &dyn FeedLoader, files: &MatchFiles) -> Result<LoadedMatch, MatchIssue> {
    let feed = loader
        .load(files)
        .map_err(|err| MatchIssue::LoadFailed {
            match_id: files.match_id.clone(),
            message: format!("{err:#}"),
        })?;
    Ok(LoadedMatch {
        match_id: files.match_id.clone(),
        events: resolve_match(feed.events, &feed.metadata),
    })
}

/// Row-wise concatenation of every loaded match, in the given order.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    rows: Vec<EventRow>,
    match_ids: Vec<Arc<str>>,
}

impl EventTable {
    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    /// Ids of every loaded match, including matches without events.
    pub fn match_ids(&self) -> &[Arc<str>] {
        &self.match_ids
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn combine_matches(matches: Vec<LoadedMatch>) -> EventTable {
    let total = matches.iter().map(|m| m.events.len()).sum();
    let mut rows = Vec::with_capacity(total);
    let mut match_ids = Vec::with_capacity(matches.len());

    for loaded in matches {
        let match_id: Arc<str> = Arc::from(loaded.match_id.as_str());
        match_ids.push(match_id.clone());
        rows.extend(loaded.events.into_iter().map(|resolved| EventRow {
            match_id: match_id.clone(),
            event: resolved.event,
            player_name: resolved.player_name,
            team_name: resolved.team_name,
        }));
    }

    EventTable { rows, match_ids }
}

/// Result of loading one upload set.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub table: EventTable,
    pub issues: Vec<MatchIssue>,
}

pub fn load_feed_set(
    loader: &dyn FeedLoader,
    uploads: &FeedUploads,
    rules: &PairingRules,
) -> LoadReport {
    let pairing = pair_feed_files(uploads, rules);
    let mut issues = pairing.issues;
    let (matches, load_issues) = load_matches(loader, &pairing.matches);
    issues.extend(load_issues);
    LoadReport {
        table: combine_matches(matches),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploads(lineups: &[&str], events: &[&str]) -> FeedUploads {
        FeedUploads {
            lineups: lineups.iter().map(PathBuf::from).collect(),
            events: events.iter().map(PathBuf::from).collect(),
        }
    }

    #[test]
    fn base_name_strips_only_the_suffix() {
        let rules = PairingRules::default();
        assert_eq!(
            rules.lineup_base(Path::new("/data/derby_2024_f7.json")),
            Some("derby_2024".to_string())
        );
        assert_eq!(rules.lineup_base(Path::new("/data/_f7.json")), None);
        assert_eq!(rules.events_base(Path::new("/data/derby_f7.json")), None);
    }

    #[test]
    fn pairing_follows_lineup_order_and_reports_orphans() {
        let pairing = pair_feed_files(
            &uploads(
                &["b_f7.json", "a_f7.json", "lonely_f7.json"],
                &["a_f24.json", "b_f24.json", "orphan_f24.json"],
            ),
            &PairingRules::default(),
        );
        let ids: Vec<&str> = pairing.matches.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(
            pairing.issues,
            vec![
                MatchIssue::MissingEvents {
                    match_id: "lonely".to_string()
                },
                MatchIssue::MissingLineup {
                    match_id: "orphan".to_string()
                },
            ]
        );
    }

    #[test]
    fn duplicate_and_unknown_files_are_skipped() {
        let pairing = pair_feed_files(
            &uploads(&["a_f7.json", "a_f7.json", "notes.txt"], &["a_f24.json"]),
            &PairingRules::default(),
        );
        assert_eq!(pairing.matches.len(), 1);
        assert_eq!(pairing.issues.len(), 2);
        assert!(matches!(pairing.issues[0], MatchIssue::DuplicateFile { .. }));
        assert!(matches!(pairing.issues[1], MatchIssue::UnrecognizedFile { .. }));
    }

    #[test]
    fn load_errors_log_at_error_level() {
        let issue = MatchIssue::LoadFailed {
            match_id: "m1".to_string(),
            message: "bad xml".to_string(),
        };
        assert_eq!(issue.log_line(), "[ERROR] error loading match 'm1': bad xml");
        assert_eq!(issue.match_id(), Some("m1"));
    }
}
