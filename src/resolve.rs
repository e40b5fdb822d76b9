use std::collections::HashMap;

use crate::events::{FeedEvent, MatchMetadata, ResolvedEvent};

/// Name lookups for a single match. Opta ids are only unique inside one
/// match's metadata, so a resolver is built per match and never merged.
#[derive(Debug, Clone, Default)]
pub struct IdResolver {
    players: HashMap<u32, String>,
    teams: HashMap<u32, String>,
}

impl IdResolver {
    pub fn for_match(metadata: &MatchMetadata) -> Self {
        let players = metadata
            .teams
            .iter()
            .flat_map(|team| team.players.iter())
            .map(|player| (player.player_id, player.full_name.clone()))
            .collect();
        let teams = metadata
            .teams
            .iter()
            .map(|team| (team.team_id, team.name.clone()))
            .collect();
        Self { players, teams }
    }

    pub fn player_name(&self, id: Option<u32>) -> Option<&str> {
        id.and_then(|id| self.players.get(&id)).map(String::as_str)
    }

    pub fn team_name(&self, id: Option<u32>) -> Option<&str> {
        id.and_then(|id| self.teams.get(&id)).map(String::as_str)
    }

    pub fn resolve(&self, event: FeedEvent) -> ResolvedEvent {
        let player_name = self.player_name(event.player_id).map(str::to_string);
        let team_name = self.team_name(event.team_id).map(str::to_string);
        ResolvedEvent {
            event,
            player_name,
            team_name,
        }
    }
}

/// Enrich one match's events with display names from that match's metadata.
/// Unknown ids resolve to `None`.
pub fn resolve_match(events: Vec<FeedEvent>, metadata: &MatchMetadata) -> Vec<ResolvedEvent> {
    let resolver = IdResolver::for_match(metadata);
    events.into_iter().map(|event| resolver.resolve(event)).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::events::{EventType, PlayerMeta, TeamMeta};

    fn shot(player_id: Option<u32>, team_id: Option<u32>) -> FeedEvent {
        FeedEvent {
            event_type: EventType::Shot,
            period: 1,
            timestamp: TimeDelta::seconds(10),
            x: Some(90.0),
            y: Some(50.0),
            end_x: None,
            end_y: None,
            player_id,
            receiver_player_id: None,
            team_id,
        }
    }

    fn metadata() -> MatchMetadata {
        MatchMetadata {
            teams: vec![TeamMeta {
                team_id: 1,
                name: "Rivers FC".to_string(),
                players: vec![PlayerMeta {
                    player_id: 9,
                    full_name: "Ana Goalscorer".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn known_ids_resolve_to_names() {
        let rows = resolve_match(vec![shot(Some(9), Some(1))], &metadata());
        assert_eq!(rows[0].player_name.as_deref(), Some("Ana Goalscorer"));
        assert_eq!(rows[0].team_name.as_deref(), Some("Rivers FC"));
    }

    #[test]
    fn unknown_or_missing_ids_resolve_to_none() {
        let rows = resolve_match(vec![shot(Some(99), None)], &metadata());
        assert_eq!(rows[0].player_name, None);
        assert_eq!(rows[0].team_name, None);
    }
}
