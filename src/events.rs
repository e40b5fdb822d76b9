use std::fmt;
use std::sync::Arc;

use chrono::TimeDelta;
use serde::{Deserialize, Deserializer, Serialize};

/// Event categories emitted by the Opta F24 decoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Pass,
    Shot,
    TakeOn,
    Carry,
    Clearance,
    Interception,
    Duel,
    Recovery,
    Miscontrol,
    BallOut,
    FoulCommitted,
    Goalkeeper,
    Card,
    Substitution,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Pass => "PASS",
            EventType::Shot => "SHOT",
            EventType::TakeOn => "TAKE_ON",
            EventType::Carry => "CARRY",
            EventType::Clearance => "CLEARANCE",
            EventType::Interception => "INTERCEPTION",
            EventType::Duel => "DUEL",
            EventType::Recovery => "RECOVERY",
            EventType::Miscontrol => "MISCONTROL",
            EventType::BallOut => "BALL_OUT",
            EventType::FoulCommitted => "FOUL_COMMITTED",
            EventType::Goalkeeper => "GOALKEEPER",
            EventType::Card => "CARD",
            EventType::Substitution => "SUBSTITUTION",
            EventType::Other(raw) => raw.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        let key = raw.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match key.as_str() {
            "PASS" => EventType::Pass,
            "SHOT" => EventType::Shot,
            "TAKE_ON" => EventType::TakeOn,
            "CARRY" => EventType::Carry,
            "CLEARANCE" => EventType::Clearance,
            "INTERCEPTION" => EventType::Interception,
            "DUEL" => EventType::Duel,
            "RECOVERY" => EventType::Recovery,
            "MISCONTROL" => EventType::Miscontrol,
            "BALL_OUT" => EventType::BallOut,
            "FOUL_COMMITTED" => EventType::FoulCommitted,
            "GOALKEEPER" => EventType::Goalkeeper,
            "CARD" => EventType::Card,
            "SUBSTITUTION" => EventType::Substitution,
            _ => EventType::Other(key),
        }
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        EventType::parse(&raw)
    }
}

impl From<EventType> for String {
    fn from(kind: EventType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded event as produced by a feed loader, before any enrichment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedEvent {
    pub event_type: EventType,
    #[serde(default = "default_period", alias = "period_id")]
    pub period: u8,
    /// Offset from the start of `period`.
    #[serde(deserialize_with = "timestamp_from_secs")]
    pub timestamp: TimeDelta,
    /// Start location; substitutions and cards often carry none.
    #[serde(default, rename = "coordinates_x")]
    pub x: Option<f64>,
    #[serde(default, rename = "coordinates_y")]
    pub y: Option<f64>,
    #[serde(default, rename = "end_coordinates_x")]
    pub end_x: Option<f64>,
    #[serde(default, rename = "end_coordinates_y")]
    pub end_y: Option<f64>,
    #[serde(default, deserialize_with = "opt_feed_id")]
    pub player_id: Option<u32>,
    #[serde(default, deserialize_with = "opt_feed_id")]
    pub receiver_player_id: Option<u32>,
    #[serde(default, deserialize_with = "opt_feed_id")]
    pub team_id: Option<u32>,
}

impl FeedEvent {
    pub fn point(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    pub fn end_point(&self) -> Option<(f64, f64)> {
        match (self.end_x, self.end_y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

fn default_period() -> u8 {
    1
}

fn timestamp_from_secs<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)
        .map_err(|err| <D::Error as serde::de::Error>::custom(format!("timestamp: {err}")))?;
    timestamp_from_f64(secs).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid event timestamp: {secs}"))
    })
}

/// Opta ids arrive either as numbers or as strings such as `"p40720"` / `"t3"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(u64),
    Text(String),
}

fn parse_feed_id(raw: RawId) -> Option<u32> {
    match raw {
        RawId::Num(n) => u32::try_from(n).ok(),
        RawId::Text(s) => s
            .trim()
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .parse::<u32>()
            .ok(),
    }
}

fn feed_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawId::deserialize(deserializer)?;
    parse_feed_id(raw).ok_or_else(|| serde::de::Error::custom("invalid feed identifier"))
}

fn opt_feed_id<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    // Unparseable ids degrade to a missing id rather than failing the match.
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(raw.and_then(parse_feed_id))
}

pub fn timestamp_from_f64(secs: f64) -> Option<TimeDelta> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    TimeDelta::try_milliseconds((secs * 1000.0).round() as i64)
}

/// Display form `MM:SS.s` of a period offset.
pub fn format_timestamp(ts: TimeDelta) -> String {
    let millis = ts.num_milliseconds().max(0);
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) as f64 / 1000.0;
    format!("{minutes:02}:{seconds:04.1}")
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerMeta {
    #[serde(deserialize_with = "feed_id")]
    pub player_id: u32,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamMeta {
    #[serde(deserialize_with = "feed_id")]
    pub team_id: u32,
    pub name: String,
    #[serde(default)]
    pub players: Vec<PlayerMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MatchMetadata {
    pub teams: Vec<TeamMeta>,
}

/// Loader output for one lineup + events pair.
#[derive(Debug, Clone, Default)]
pub struct MatchFeed {
    pub events: Vec<FeedEvent>,
    pub metadata: MatchMetadata,
}

/// An event enriched with names looked up in its own match's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub event: FeedEvent,
    pub player_name: Option<String>,
    pub team_name: Option<String>,
}

/// A row of the combined multi-match table.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub match_id: Arc<str>,
    pub event: FeedEvent,
    pub player_name: Option<String>,
    pub team_name: Option<String>,
}

impl EventRow {
    pub fn event_type(&self) -> &EventType {
        &self.event.event_type
    }

    pub fn point(&self) -> Option<(f64, f64)> {
        self.event.point()
    }
}
