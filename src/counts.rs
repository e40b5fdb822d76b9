use std::cmp::Ordering;
use std::collections::HashMap;

pub const UNKNOWN_LABEL: &str = "(unknown)";

/// One line of an aggregate table: a (player, team) pair and how often it
/// occurred. Missing names stay `None` and render as unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRow {
    pub player: Option<String>,
    pub team: Option<String>,
    pub count: usize,
}

impl CountRow {
    pub fn player_label(&self) -> &str {
        self.player.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn team_label(&self) -> &str {
        self.team.as_deref().unwrap_or(UNKNOWN_LABEL)
    }
}

/// Group keys, count, and sort by count descending then player/team name
/// ascending. Unknown names sort after known ones.
pub fn tally<'a, I>(keys: I) -> Vec<CountRow>
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
{
    let mut counts: HashMap<(Option<&'a str>, Option<&'a str>), usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut rows: Vec<CountRow> = counts
        .into_iter()
        .map(|((player, team), count)| CountRow {
            player: player.map(str::to_string),
            team: team.map(str::to_string),
            count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| cmp_name(a.player.as_deref(), b.player.as_deref()))
            .then_with(|| cmp_name(a.team.as_deref(), b.team.as_deref()))
    });
    rows
}

fn cmp_name(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_sorts_by_count_then_name() {
        let rows = tally([
            (Some("Zed"), Some("A")),
            (Some("Amy"), Some("A")),
            (None, Some("A")),
            (Some("Zed"), Some("A")),
            (Some("Amy"), Some("A")),
            (Some("Bob"), Some("B")),
        ]);
        let labels: Vec<(&str, usize)> = rows.iter().map(|r| (r.player_label(), r.count)).collect();
        assert_eq!(
            labels,
            vec![("Amy", 2), ("Zed", 2), ("Bob", 1), (UNKNOWN_LABEL, 1)]
        );
    }

    #[test]
    fn empty_input_gives_empty_table() {
        assert!(tally(std::iter::empty()).is_empty());
    }
}
