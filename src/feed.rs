use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::events::{FeedEvent, MatchFeed, MatchMetadata};

/// The lineup + events file pair that makes up one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFiles {
    pub match_id: String,
    pub lineup: PathBuf,
    pub events: PathBuf,
}

/// Decodes one match from its file pair.
///
/// Loaders are called once per match and may be called from several threads
/// at once, so implementations must not rely on call order.
pub trait FeedLoader: Sync {
    fn load(&self, files: &MatchFiles) -> Result<MatchFeed>;
}

impl<F> FeedLoader for F
where
    F: Fn(&MatchFiles) -> Result<MatchFeed> + Sync,
{
    fn load(&self, files: &MatchFiles) -> Result<MatchFeed> {
        self(files)
    }
}

/// Reads the JSON export of a decoded F7/F24 pair: the lineup file holds the
/// team/player metadata, the events file holds the flat event records.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFeedLoader;

impl FeedLoader for JsonFeedLoader {
    fn load(&self, files: &MatchFiles) -> Result<MatchFeed> {
        let metadata = parse_lineup_json(&read_file(&files.lineup)?)
            .with_context(|| format!("parse lineup file {}", files.lineup.display()))?;
        let events = parse_events_json(&read_file(&files.events)?)
            .with_context(|| format!("parse events file {}", files.events.display()))?;
        Ok(MatchFeed { events, metadata })
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

pub fn parse_lineup_json(raw: &str) -> Result<MatchMetadata> {
    let metadata = serde_json::from_str::<MatchMetadata>(raw).context("decode lineup json")?;
    Ok(metadata)
}

/// Accepts a bare list of event records or an object with an `events` list.
pub fn parse_events_json(raw: &str) -> Result<Vec<FeedEvent>> {
    let value = serde_json::from_str::<Value>(raw).context("decode events json")?;
    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut file) => match file.remove("events") {
            Some(Value::Array(records)) => records,
            Some(_) => return Err(anyhow!("decode events json: `events` is not a list")),
            None => return Err(anyhow!("decode events json: no `events` list")),
        },
        _ => return Err(anyhow!("decode events json: expected a list of events")),
    };
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value::<FeedEvent>(record)
                .with_context(|| format!("decode events json: event #{index}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_json_accepts_bare_and_wrapped_lists() {
        let bare = r#"[{"event_type":"PASS","timestamp":1.0,"coordinates_x":50.0,"coordinates_y":50.0}]"#;
        let wrapped = format!(r#"{{"events": {bare}}}"#);
        assert_eq!(parse_events_json(bare).expect("bare list").len(), 1);
        assert_eq!(parse_events_json(&wrapped).expect("wrapped list").len(), 1);
    }

    #[test]
    fn events_without_start_coordinates_still_load() {
        let raw = r#"[
            {"event_type":"PASS","timestamp":1.0,"coordinates_x":50.0,"coordinates_y":50.0},
            {"event_type":"SUBSTITUTION","timestamp":2.0,"coordinates_x":null,"coordinates_y":null}
        ]"#;
        let events = parse_events_json(raw).expect("null coordinates are allowed");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].point(), None);
    }

    #[test]
    fn events_json_errors_keep_the_decode_message() {
        let raw = r#"[
            {"event_type":"PASS","timestamp":1.0,"coordinates_x":50.0,"coordinates_y":50.0},
            {"event_type":"PASS","timestamp":"abc","coordinates_x":50.0,"coordinates_y":50.0}
        ]"#;
        let message = format!("{:#}", parse_events_json(raw).expect_err("bad timestamp"));
        assert!(message.contains("event #1"), "{message}");
        assert!(message.contains("timestamp"), "{message}");
        assert!(message.contains("invalid type"), "{message}");

        let message = format!("{:#}", parse_events_json(r#"{"rows": []}"#).expect_err("no list"));
        assert!(message.contains("no `events` list"), "{message}");
    }

    #[test]
    fn lineup_json_requires_team_ids() {
        let raw = r#"{"teams":[{"name":"No Id FC","players":[]}]}"#;
        assert!(parse_lineup_json(raw).is_err());
    }

    #[test]
    fn closures_act_as_loaders() {
        let loader = |_: &MatchFiles| -> Result<MatchFeed> { Ok(MatchFeed::default()) };
        let files = MatchFiles {
            match_id: "m".to_string(),
            lineup: PathBuf::from("m_f7.json"),
            events: PathBuf::from("m_f24.json"),
        };
        assert!(loader.load(&files).expect("closure loader").events.is_empty());
    }
}
