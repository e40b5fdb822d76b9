//! Reception → next pass sequences.
//!
//! Every completed pass doubles as a reception by its receiver, anchored at
//! the pass's own timestamp (the feed has no separate reception event). The
//! reception is joined forward in time to the receiver's own next pass in
//! the same match and period, within [`RECEPTION_TOLERANCE_SECS`].

use std::collections::HashMap;

use chrono::TimeDelta;

use crate::aggregate::EventTable;
use crate::counts::{CountRow, tally};
use crate::events::{EventRow, EventType};
use crate::filter::{MatchSelection, Zone};

pub const RECEPTION_TOLERANCE_SECS: i64 = 20;

pub fn reception_tolerance() -> TimeDelta {
    TimeDelta::seconds(RECEPTION_TOLERANCE_SECS)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceQuery {
    pub reception_zone: Zone,
    pub next_pass_zone: Zone,
    pub matches: MatchSelection,
}

impl SequenceQuery {
    pub fn new(reception_zone: Zone, next_pass_zone: Zone) -> Self {
        Self {
            reception_zone,
            next_pass_zone,
            matches: MatchSelection::All,
        }
    }

    pub fn admits(&self, sequence: &Sequence<'_>) -> bool {
        let (rx, ry) = sequence.reception_point();
        let Some((px, py)) = sequence.next_pass.point() else {
            return false;
        };
        self.reception_zone.contains(rx, ry) && self.next_pass_zone.contains(px, py)
    }
}

/// A reception paired with the receiver's next pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sequence<'a> {
    /// The pass that delivered the ball; its end point is the reception.
    pub delivery: &'a EventRow,
    pub next_pass: &'a EventRow,
}

impl<'a> Sequence<'a> {
    pub fn match_id(&self) -> &'a str {
        &self.delivery.match_id
    }

    pub fn receiver_id(&self) -> Option<u32> {
        self.delivery.event.receiver_player_id
    }

    pub fn reception_point(&self) -> (f64, f64) {
        self.delivery.event.end_point().unwrap_or((f64::NAN, f64::NAN))
    }

    pub fn reception_time(&self) -> TimeDelta {
        self.delivery.event.timestamp
    }

    pub fn gap(&self) -> TimeDelta {
        self.next_pass.event.timestamp - self.delivery.event.timestamp
    }

    /// The receiver's name as resolved on their own next pass, which shares
    /// the delivery's match metadata.
    pub fn receiver_name(&self) -> Option<&'a str> {
        self.next_pass.player_name.as_deref()
    }

    pub fn receiver_team(&self) -> Option<&'a str> {
        self.next_pass.team_name.as_deref()
    }
}

/// Join key: ids and timestamps are only comparable inside one match period.
type PasserKey<'a> = (&'a str, u8, u32);

/// Per-player pass series, each sorted by timestamp with table order kept
/// for equal timestamps.
struct PassIndex<'a> {
    by_passer: HashMap<PasserKey<'a>, Vec<(TimeDelta, usize)>>,
}

impl<'a> PassIndex<'a> {
    fn build(passes: &[(usize, &'a EventRow)]) -> Self {
        let mut by_passer: HashMap<PasserKey<'a>, Vec<(TimeDelta, usize)>> = HashMap::new();
        for &(idx, row) in passes {
            let Some(player_id) = row.event.player_id else {
                continue;
            };
            by_passer
                .entry((&*row.match_id, row.event.period, player_id))
                .or_default()
                .push((row.event.timestamp, idx));
        }
        Self { by_passer }
    }

    /// First pass by `key` at or after `from`, no later than `from + tolerance`,
    /// other than `exclude`.
    fn next_pass(
        &self,
        key: &PasserKey<'a>,
        from: TimeDelta,
        tolerance: TimeDelta,
        exclude: usize,
    ) -> Option<usize> {
        let series = self.by_passer.get(key)?;
        let start = series.partition_point(|(ts, _)| *ts < from);
        let limit = from + tolerance;
        series[start..]
            .iter()
            .take_while(|(ts, _)| *ts <= limit)
            .find(|(_, idx)| *idx != exclude)
            .map(|(_, idx)| *idx)
    }
}

/// Pair every reception with its receiver's next pass.
///
/// Passes outside `matches` are ignored. Receptions without a receiver or an
/// end location, and receptions with no qualifying next pass, yield nothing.
/// Output is in chronological order of the deliveries.
pub fn detect_sequences<'a>(table: &'a EventTable, matches: &MatchSelection) -> Vec<Sequence<'a>> {
    let mut passes: Vec<&'a EventRow> = table
        .rows()
        .iter()
        .filter(|row| row.event_type() == &EventType::Pass && matches.admits(&row.match_id))
        .collect();
    // Stable: equal timestamps keep table order.
    passes.sort_by_key(|row| (row.event.period, row.event.timestamp));
    let passes: Vec<(usize, &'a EventRow)> = passes.into_iter().enumerate().collect();

    let index = PassIndex::build(&passes);
    let tolerance = reception_tolerance();

    passes
        .iter()
        .filter_map(|&(idx, delivery)| {
            let receiver = delivery.event.receiver_player_id?;
            delivery.event.end_point()?;
            let key = (&*delivery.match_id, delivery.event.period, receiver);
            let next_idx = index.next_pass(&key, delivery.event.timestamp, tolerance, idx)?;
            Some(Sequence {
                delivery,
                next_pass: passes[next_idx].1,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SequenceReport<'a> {
    /// Sequences passing both zone filters.
    pub sequences: Vec<Sequence<'a>>,
    /// Counts by receiver name and team.
    pub counts: Vec<CountRow>,
}

impl SequenceReport<'_> {
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

pub fn analyze_sequences<'a>(table: &'a EventTable, query: &SequenceQuery) -> SequenceReport<'a> {
    let sequences: Vec<Sequence<'a>> = detect_sequences(table, &query.matches)
        .into_iter()
        .filter(|sequence| query.admits(sequence))
        .collect();
    let counts = summarize_receivers(&sequences);
    SequenceReport { sequences, counts }
}

pub fn summarize_receivers(sequences: &[Sequence<'_>]) -> Vec<CountRow> {
    tally(
        sequences
            .iter()
            .map(|sequence| (sequence.receiver_name(), sequence.receiver_team())),
    )
}
