use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;

use anyhow::Result;

use crate::aggregate::{FeedUploads, PairingRules, discover_feed_files};
use crate::demo_feed::DemoFeedLoader;
use crate::events::EventType;
use crate::feed::JsonFeedLoader;
use crate::filter::{EventFilter, MatchSelection, Zone};
use crate::sequences::SequenceQuery;
use crate::session::{Session, SessionLoad};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Events,
    Sequences,
}

/// Which rectangle the zone keys act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneFocus {
    Events,
    Reception,
    NextPass,
}

/// Where an upload set comes from. Reloading re-reads the source, so a
/// directory picks up files added since the last load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Files(FeedUploads),
    Directory(PathBuf),
    Demo { matches: usize },
}

impl FeedSource {
    /// Resolve the upload set and load it. Only a directory that cannot be
    /// read fails here; per-match problems come back in the load's issues.
    pub fn open(&self, rules: &PairingRules) -> Result<SessionLoad> {
        let load = match self {
            FeedSource::Files(uploads) => Session::open(&JsonFeedLoader, uploads.clone(), rules),
            FeedSource::Directory(dir) => {
                let uploads = discover_feed_files(dir, rules)?;
                Session::open(&JsonFeedLoader, uploads, rules)
            }
            FeedSource::Demo { matches } => {
                let uploads = DemoFeedLoader::uploads(*matches, rules);
                Session::open(&DemoFeedLoader::default(), uploads, rules)
            }
        };
        Ok(load)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub settings: Settings,
    pub source: FeedSource,
    pub session: Option<Session>,
    pub event_type: Option<EventType>,
    pub match_cursor: usize,
    pub excluded_matches: BTreeSet<String>,
    pub player: Option<String>,
    pub team: Option<String>,
    pub events_zone: Zone,
    pub reception_zone: Zone,
    pub next_pass_zone: Zone,
    pub zone_focus: ZoneFocus,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(settings: Settings, source: FeedSource) -> Self {
        Self {
            screen: Screen::Events,
            events_zone: settings.events_zone,
            reception_zone: settings.reception_zone,
            next_pass_zone: settings.next_pass_zone,
            settings,
            source,
            session: None,
            event_type: None,
            match_cursor: 0,
            excluded_matches: BTreeSet::new(),
            player: None,
            team: None,
            zone_focus: ZoneFocus::Events,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Load the current source as a new upload set. Selections tied to the
    /// previous data are dropped; zones are kept.
    pub fn reload(&mut self) {
        let load = match self.source.open(&self.settings.rules) {
            Ok(load) => load,
            Err(err) => {
                self.push_log(format!("[ERROR] {err:#}"));
                self.session = None;
                self.reset_selection();
                return;
            }
        };

        for issue in &load.issues {
            self.push_log(issue.log_line());
        }
        self.session = load.session;
        self.reset_selection();

        let (matches, rows) = self
            .session
            .as_ref()
            .map(|s| (s.match_count(), s.table().len()))
            .unwrap_or((0, 0));
        if matches == 0 {
            self.push_log("[WARN] No matches could be paired and loaded");
        } else {
            self.push_log(format!("[INFO] Loaded {matches} matches ({rows} events)"));
        }
    }

    fn reset_selection(&mut self) {
        self.match_cursor = 0;
        self.excluded_matches.clear();
        self.player = None;
        self.team = None;
        self.event_type = self.session.as_ref().and_then(|session| {
            let types = &session.options().event_types;
            types
                .iter()
                .find(|t| **t == EventType::Pass)
                .or_else(|| types.first())
                .cloned()
        });
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Events => Screen::Sequences,
            Screen::Sequences => Screen::Events,
        };
        self.zone_focus = match self.screen {
            Screen::Events => ZoneFocus::Events,
            Screen::Sequences => ZoneFocus::Reception,
        };
    }

    pub fn cycle_event_type(&mut self, forward: bool) {
        let Some(session) = &self.session else {
            return;
        };
        self.event_type = cycle_value(
            &session.options().event_types,
            self.event_type.as_ref(),
            forward,
            false,
        );
    }

    /// Steps through "all" and then each known player name.
    pub fn cycle_player(&mut self, forward: bool) {
        let Some(session) = &self.session else {
            return;
        };
        self.player = cycle_value(&session.options().players, self.player.as_ref(), forward, true);
    }

    pub fn cycle_team(&mut self, forward: bool) {
        let Some(session) = &self.session else {
            return;
        };
        self.team = cycle_value(&session.options().teams, self.team.as_ref(), forward, true);
    }

    pub fn move_match_cursor(&mut self, forward: bool) {
        let total = self.session.as_ref().map(|s| s.match_count()).unwrap_or(0);
        if total == 0 {
            self.match_cursor = 0;
            return;
        }
        self.match_cursor = if forward {
            (self.match_cursor + 1) % total
        } else {
            (self.match_cursor + total - 1) % total
        };
    }

    pub fn toggle_match_at_cursor(&mut self) {
        let Some(id) = self
            .session
            .as_ref()
            .and_then(|s| s.options().match_ids.get(self.match_cursor))
            .map(|id| id.to_string())
        else {
            return;
        };
        if !self.excluded_matches.remove(&id) {
            self.excluded_matches.insert(id);
        }
    }

    pub fn select_all_matches(&mut self) {
        self.excluded_matches.clear();
    }

    pub fn match_selection(&self) -> MatchSelection {
        if self.excluded_matches.is_empty() {
            return MatchSelection::All;
        }
        let ids = self
            .session
            .iter()
            .flat_map(|s| s.options().match_ids.iter())
            .map(|id| id.to_string())
            .filter(|id| !self.excluded_matches.contains(id));
        MatchSelection::only(ids)
    }

    pub fn event_filter(&self) -> Option<EventFilter> {
        let event_type = self.event_type.clone()?;
        Some(EventFilter {
            event_type,
            matches: self.match_selection(),
            player: self.player.clone(),
            team: self.team.clone(),
            zone: self.events_zone,
        })
    }

    pub fn sequence_query(&self) -> SequenceQuery {
        SequenceQuery {
            reception_zone: self.reception_zone,
            next_pass_zone: self.next_pass_zone,
            matches: self.match_selection(),
        }
    }

    pub fn cycle_zone_focus(&mut self) {
        self.zone_focus = match (self.screen, self.zone_focus) {
            (Screen::Events, _) => ZoneFocus::Events,
            (Screen::Sequences, ZoneFocus::Reception) => ZoneFocus::NextPass,
            (Screen::Sequences, _) => ZoneFocus::Reception,
        };
    }

    fn focused_zone_mut(&mut self) -> &mut Zone {
        match self.zone_focus {
            ZoneFocus::Events => &mut self.events_zone,
            ZoneFocus::Reception => &mut self.reception_zone,
            ZoneFocus::NextPass => &mut self.next_pass_zone,
        }
    }

    /// Move the focused zone by `dx`/`dy` zone steps.
    pub fn move_zone(&mut self, dx: i32, dy: i32) {
        let step = self.settings.zone_step;
        let zone = self.focused_zone_mut();
        *zone = zone.shifted(f64::from(dx) * step, f64::from(dy) * step);
    }

    pub fn resize_zone(&mut self, dw: i32, dh: i32) {
        let step = self.settings.zone_step;
        let zone = self.focused_zone_mut();
        *zone = zone.resized(f64::from(dw) * step, f64::from(dh) * step);
    }
}

/// Next/previous entry of `values` after `current`. With `allow_none`, `None`
/// ("all") is part of the cycle.
fn cycle_value<T: Clone + PartialEq>(
    values: &[T],
    current: Option<&T>,
    forward: bool,
    allow_none: bool,
) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let slots = values.len() + usize::from(allow_none);
    // Slot 0 is "none" when allowed.
    let offset = usize::from(allow_none);
    let pos = current
        .and_then(|cur| values.iter().position(|v| v == cur))
        .map(|idx| idx + offset)
        .unwrap_or(0);
    let next = if forward {
        (pos + 1) % slots
    } else {
        (pos + slots - 1) % slots
    };
    if allow_none && next == 0 {
        return None;
    }
    values.get(next - offset).cloned()
}

#[cfg(test)]
mod tests {
    use super::cycle_value;

    #[test]
    fn cycle_includes_all_slot_when_allowed() {
        let names = vec!["a".to_string(), "b".to_string()];
        let first = cycle_value(&names, None, true, true);
        assert_eq!(first.as_deref(), Some("a"));
        let second = cycle_value(&names, first.as_ref(), true, true);
        assert_eq!(second.as_deref(), Some("b"));
        assert_eq!(cycle_value(&names, second.as_ref(), true, true), None);
        assert_eq!(cycle_value(&names, None, false, true).as_deref(), Some("b"));
    }

    #[test]
    fn cycle_without_all_slot_wraps() {
        let kinds = vec![1, 2, 3];
        assert_eq!(cycle_value(&kinds, Some(&3), true, false), Some(1));
        assert_eq!(cycle_value(&kinds, Some(&1), false, false), Some(3));
        assert_eq!(cycle_value::<i32>(&[], None, true, false), None);
    }
}
