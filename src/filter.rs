use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::aggregate::EventTable;
use crate::counts::{CountRow, tally};
use crate::events::{EventRow, EventType};

pub const PITCH_MIN: f64 = 0.0;
pub const PITCH_MAX: f64 = 100.0;

/// Axis-aligned pitch rectangle on the 0..100 Opta scale, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Zone {
    pub const FULL: Zone = Zone {
        x_min: PITCH_MIN,
        x_max: PITCH_MAX,
        y_min: PITCH_MIN,
        y_max: PITCH_MAX,
    };

    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        for (label, value) in [("x min", x_min), ("x max", x_max), ("y min", y_min), ("y max", y_max)] {
            if !(PITCH_MIN..=PITCH_MAX).contains(&value) {
                return Err(anyhow!("zone {label} {value} outside {PITCH_MIN}..{PITCH_MAX}"));
            }
        }
        if x_min > x_max {
            return Err(anyhow!("zone x min {x_min} is greater than x max {x_max}"));
        }
        if y_min > y_max {
            return Err(anyhow!("zone y min {y_min} is greater than y max {y_max}"));
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Parse `xmin,xmax,ymin,ymax`.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts = raw
            .split([',', ';', ' '])
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|err| anyhow!("invalid zone value '{part}': {err}"))
            })
            .collect::<Result<Vec<_>>>()?;
        let &[x_min, x_max, y_min, y_max] = parts.as_slice() else {
            return Err(anyhow!("zone needs four values xmin,xmax,ymin,ymax, got '{raw}'"));
        };
        Self::new(x_min, x_max, y_min, y_max)
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// Shift the rectangle, keeping its size and staying on the pitch.
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        let dx = dx.clamp(PITCH_MIN - self.x_min, PITCH_MAX - self.x_max);
        let dy = dy.clamp(PITCH_MIN - self.y_min, PITCH_MAX - self.y_max);
        Self {
            x_min: self.x_min + dx,
            x_max: self.x_max + dx,
            y_min: self.y_min + dy,
            y_max: self.y_max + dy,
        }
    }

    /// Grow (or shrink, with negative deltas) around the far edges.
    pub fn resized(&self, dw: f64, dh: f64) -> Self {
        Self {
            x_min: self.x_min,
            x_max: (self.x_max + dw).clamp(self.x_min, PITCH_MAX),
            y_min: self.y_min,
            y_max: (self.y_max + dh).clamp(self.y_min, PITCH_MAX),
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::FULL
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x {:.0}-{:.0} y {:.0}-{:.0}",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

/// Which matches a filter admits. `All` follows whatever is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MatchSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl MatchSelection {
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MatchSelection::Only(ids.into_iter().map(Into::into).collect())
    }

    pub fn admits(&self, match_id: &str) -> bool {
        match self {
            MatchSelection::All => true,
            MatchSelection::Only(ids) => ids.contains(match_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub event_type: EventType,
    pub matches: MatchSelection,
    pub player: Option<String>,
    pub team: Option<String>,
    pub zone: Zone,
}

impl EventFilter {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            matches: MatchSelection::All,
            player: None,
            team: None,
            zone: Zone::FULL,
        }
    }

    pub fn admits(&self, row: &EventRow) -> bool {
        if row.event_type() != &self.event_type || !self.matches.admits(&row.match_id) {
            return false;
        }
        // A row with an unresolved name never equals a requested name.
        if let Some(player) = &self.player
            && row.player_name.as_deref() != Some(player.as_str())
        {
            return false;
        }
        if let Some(team) = &self.team
            && row.team_name.as_deref() != Some(team.as_str())
        {
            return false;
        }
        // Rows without a start location fall outside every zone.
        row.point()
            .is_some_and(|(x, y)| self.zone.contains(x, y))
    }
}

/// Rows admitted by `filter`, in table order.
pub fn apply_filter<'a>(table: &'a EventTable, filter: &EventFilter) -> Vec<&'a EventRow> {
    table.rows().iter().filter(|row| filter.admits(row)).collect()
}

/// (player, team) counts for a filtered row set.
pub fn count_by_player(rows: &[&EventRow]) -> Vec<CountRow> {
    tally(
        rows.iter()
            .map(|row| (row.player_name.as_deref(), row.team_name.as_deref())),
    )
}

/// Choices offered by the filter surface for the loaded table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// In order of first appearance.
    pub event_types: Vec<EventType>,
    /// In upload order.
    pub match_ids: Vec<Arc<str>>,
    /// Sorted, unresolved names dropped.
    pub players: Vec<String>,
    pub teams: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &EventTable) -> Self {
        let mut seen_types = HashSet::new();
        let mut event_types = Vec::new();
        let mut players = BTreeSet::new();
        let mut teams = BTreeSet::new();
        for row in table.rows() {
            if seen_types.insert(row.event_type()) {
                event_types.push(row.event_type().clone());
            }
            if let Some(name) = &row.player_name {
                players.insert(name.as_str());
            }
            if let Some(name) = &row.team_name {
                teams.insert(name.as_str());
            }
        }
        Self {
            event_types,
            match_ids: table.match_ids().to_vec(),
            players: players.into_iter().map(str::to_string).collect(),
            teams: teams.into_iter().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_rejects_out_of_range_and_inverted_bounds() {
        assert!(Zone::new(0.0, 100.0, 0.0, 100.0).is_ok());
        assert!(Zone::new(-1.0, 50.0, 0.0, 10.0).is_err());
        assert!(Zone::new(60.0, 50.0, 0.0, 10.0).is_err());
        assert!(Zone::new(0.0, 50.0, 20.0, 10.0).is_err());
        assert!(Zone::new(0.0, 50.0, 0.0, 100.5).is_err());
    }

    #[test]
    fn zone_bounds_are_inclusive() {
        let zone = Zone::new(40.0, 60.0, 40.0, 60.0).expect("valid zone");
        assert!(zone.contains(40.0, 60.0));
        assert!(zone.contains(50.0, 50.0));
        assert!(!zone.contains(60.01, 50.0));
    }

    #[test]
    fn zone_parses_comma_list() {
        let zone = Zone::parse("30, 70, 20, 80").expect("valid zone");
        assert_eq!(zone, Zone::new(30.0, 70.0, 20.0, 80.0).expect("valid zone"));
        assert!(Zone::parse("30,70,20").is_err());
        assert!(Zone::parse("a,b,c,d").is_err());
    }

    #[test]
    fn zone_moves_stay_on_pitch() {
        let zone = Zone::new(80.0, 95.0, 0.0, 10.0).expect("valid zone");
        let moved = zone.shifted(10.0, -5.0);
        assert_eq!(moved, Zone::new(85.0, 100.0, 0.0, 10.0).expect("valid zone"));
        let shrunk = zone.resized(-30.0, 5.0);
        assert_eq!(shrunk, Zone::new(80.0, 80.0, 0.0, 15.0).expect("valid zone"));
    }

    #[test]
    fn default_selection_admits_everything() {
        assert!(MatchSelection::All.admits("anything"));
        let only = MatchSelection::only(["a"]);
        assert!(only.admits("a"));
        assert!(!only.admits("b"));
    }
}
