use chrono::{DateTime, Local};

use crate::aggregate::{EventTable, FeedUploads, MatchIssue, PairingRules, load_feed_set};
use crate::counts::CountRow;
use crate::events::EventRow;
use crate::feed::FeedLoader;
use crate::filter::{EventFilter, FilterOptions, apply_filter, count_by_player};
use crate::sequences::{SequenceQuery, SequenceReport, analyze_sequences};

/// The data loaded from one upload set. Every query recomputes from the
/// combined table; nothing derived is cached between queries.
#[derive(Debug, Clone)]
pub struct Session {
    uploads: FeedUploads,
    table: EventTable,
    options: FilterOptions,
    loaded_at: DateTime<Local>,
}

/// Outcome of opening a session. `session` is `None` when no match loaded;
/// `issues` lists every per-match problem either way.
#[derive(Debug, Clone)]
pub struct SessionLoad {
    pub session: Option<Session>,
    pub issues: Vec<MatchIssue>,
}

/// Filtered events plus their per-player counts.
#[derive(Debug, Clone, Default)]
pub struct EventView<'a> {
    pub rows: Vec<&'a EventRow>,
    pub counts: Vec<CountRow>,
}

impl Session {
    pub fn open(loader: &dyn FeedLoader, uploads: FeedUploads, rules: &PairingRules) -> SessionLoad {
        let report = load_feed_set(loader, &uploads, rules);
        if report.table.match_ids().is_empty() {
            return SessionLoad {
                session: None,
                issues: report.issues,
            };
        }
        let options = FilterOptions::from_table(&report.table);
        SessionLoad {
            session: Some(Session {
                uploads,
                table: report.table,
                options,
                loaded_at: Local::now(),
            }),
            issues: report.issues,
        }
    }

    pub fn uploads(&self) -> &FeedUploads {
        &self.uploads
    }

    pub fn table(&self) -> &EventTable {
        &self.table
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }

    pub fn match_count(&self) -> usize {
        self.table.match_ids().len()
    }

    pub fn events(&self, filter: &EventFilter) -> EventView<'_> {
        let rows = apply_filter(&self.table, filter);
        let counts = count_by_player(&rows);
        EventView { rows, counts }
    }

    pub fn sequences(&self, query: &SequenceQuery) -> SequenceReport<'_> {
        analyze_sequences(&self.table, query)
    }
}
