use std::path::PathBuf;

use anyhow::Result;
use chrono::TimeDelta;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::aggregate::{FeedUploads, PairingRules};
use crate::events::{EventType, FeedEvent, MatchFeed, MatchMetadata, PlayerMeta, TeamMeta};
use crate::feed::{FeedLoader, MatchFiles};

const HALF_SECS: i64 = 45 * 60;

/// Synthetic matches for running the explorer without feed files. The same
/// match id always produces the same match. Team and player ids repeat in
/// every match, so names only make sense within their own match.
#[derive(Debug, Clone, Copy)]
pub struct DemoFeedLoader {
    pub chains_per_half: usize,
}

impl Default for DemoFeedLoader {
    fn default() -> Self {
        Self {
            chains_per_half: 90,
        }
    }
}

impl DemoFeedLoader {
    /// Placeholder file names for `count` demo matches, shaped so that the
    /// normal pairing rules accept them.
    pub fn uploads(count: usize, rules: &PairingRules) -> FeedUploads {
        let mut uploads = FeedUploads::default();
        for idx in 1..=count {
            let base = format!("demo_{idx:02}");
            uploads
                .lineups
                .push(PathBuf::from(format!("{base}{}", rules.lineup_suffix)));
            uploads
                .events
                .push(PathBuf::from(format!("{base}{}", rules.events_suffix)));
        }
        uploads
    }

    pub fn generate(&self, match_id: &str) -> MatchFeed {
        let mut rng = StdRng::seed_from_u64(seed_for(match_id));
        let pick = rng.gen_range(0..SQUADS.len());
        let home = &SQUADS[pick];
        let away = &SQUADS[(pick + 1 + rng.gen_range(0..SQUADS.len() - 1)) % SQUADS.len()];

        let metadata = MatchMetadata {
            teams: vec![team_meta(1, home), team_meta(2, away)],
        };

        let mut events = Vec::new();
        for period in 1..=2u8 {
            simulate_half(&mut rng, period, self.chains_per_half, &mut events);
        }
        MatchFeed { events, metadata }
    }
}

impl FeedLoader for DemoFeedLoader {
    fn load(&self, files: &MatchFiles) -> Result<MatchFeed> {
        Ok(self.generate(&files.match_id))
    }
}

struct Squad {
    name: &'static str,
    players: [&'static str; 11],
}

static SQUADS: [Squad; 4] = [
    Squad {
        name: "Brazil",
        players: [
            "Alisson", "Danilo", "Marquinhos", "Thiago Silva", "Alex Sandro", "Casemiro",
            "Paqueta", "Bruno G", "Raphinha", "Vini Jr", "Rodrygo",
        ],
    },
    Squad {
        name: "Germany",
        players: [
            "Neuer", "Kimmich", "Rudiger", "Schlotterbeck", "Raum", "Gundogan", "Goretzka",
            "Musiala", "Wirtz", "Gnabry", "Havertz",
        ],
    },
    Squad {
        name: "Argentina",
        players: [
            "Martinez", "Molina", "Romero", "Otamendi", "Tagliafico", "De Paul", "Enzo",
            "Mac Allister", "Di Maria", "Messi", "Alvarez",
        ],
    },
    Squad {
        name: "France",
        players: [
            "Maignan", "Kounde", "Upamecano", "Saliba", "Hernandez", "Tchouameni",
            "Rabiot", "Griezmann", "Dembele", "Mbappe", "Giroud",
        ],
    },
];

fn team_meta(team_id: u32, squad: &Squad) -> TeamMeta {
    TeamMeta {
        team_id,
        name: squad.name.to_string(),
        players: squad
            .players
            .iter()
            .enumerate()
            .map(|(idx, name)| PlayerMeta {
                player_id: team_id * 100 + idx as u32 + 1,
                full_name: name.to_string(),
            })
            .collect(),
    }
}

fn seed_for(match_id: &str) -> u64 {
    // FNV-1a
    match_id
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

struct Possession {
    team_id: u32,
    holder: u32,
    x: f64,
    y: f64,
}

fn simulate_half(rng: &mut StdRng, period: u8, chains: usize, out: &mut Vec<FeedEvent>) {
    let mut clock_ms: i64 = 0;
    let mut poss = Possession {
        team_id: if period == 1 { 1 } else { 2 },
        holder: 0,
        x: 50.0,
        y: 50.0,
    };
    poss.holder = random_player(rng, poss.team_id, None);

    for _ in 0..chains {
        let passes = rng.gen_range(1..8);
        for _ in 0..passes {
            clock_ms += rng.gen_range(1_200..7_500);
            if clock_ms >= HALF_SECS * 1000 {
                return;
            }

            if poss.x > 78.0 && rng.gen_bool(0.35) {
                out.push(event(EventType::Shot, period, clock_ms, &poss, None, None));
                turnover(rng, &mut poss, 100.0 - 6.0, 50.0);
                break;
            }

            let end_x = (poss.x + rng.gen_range(-12.0..22.0)).clamp(0.5, 99.5);
            let end_y = (poss.y + rng.gen_range(-25.0..25.0)).clamp(0.5, 99.5);
            let completed = rng.gen_bool(0.8);
            let receiver = completed.then(|| random_player(rng, poss.team_id, Some(poss.holder)));
            out.push(event(
                EventType::Pass,
                period,
                clock_ms,
                &poss,
                Some((end_x, end_y)),
                receiver,
            ));

            let Some(receiver) = receiver else {
                turnover(rng, &mut poss, end_x, end_y);
                clock_ms += rng.gen_range(300..1_500);
                out.push(event(EventType::Recovery, period, clock_ms, &poss, None, None));
                break;
            };

            // Receiver sometimes carries the ball for a while before passing.
            if rng.gen_bool(0.15) {
                clock_ms += rng.gen_range(8_000..25_000);
            }
            poss.holder = receiver;
            poss.x = (end_x + rng.gen_range(-3.0..6.0)).clamp(0.5, 99.5);
            poss.y = (end_y + rng.gen_range(-3.0..3.0)).clamp(0.5, 99.5);
        }
    }
}

fn turnover(rng: &mut StdRng, poss: &mut Possession, x: f64, y: f64) {
    poss.team_id = if poss.team_id == 1 { 2 } else { 1 };
    poss.holder = random_player(rng, poss.team_id, None);
    // Coordinates are always from the acting team's attacking direction.
    poss.x = (100.0 - x).clamp(0.5, 99.5);
    poss.y = (100.0 - y).clamp(0.5, 99.5);
}

fn random_player(rng: &mut StdRng, team_id: u32, exclude: Option<u32>) -> u32 {
    loop {
        // Goalkeeper (slot 1) rarely involved.
        let slot = if rng.gen_bool(0.05) {
            1
        } else {
            rng.gen_range(2..=11)
        };
        let id = team_id * 100 + slot;
        if Some(id) != exclude {
            return id;
        }
    }
}

fn event(
    event_type: EventType,
    period: u8,
    clock_ms: i64,
    poss: &Possession,
    end: Option<(f64, f64)>,
    receiver: Option<u32>,
) -> FeedEvent {
    FeedEvent {
        event_type,
        period,
        timestamp: TimeDelta::milliseconds(clock_ms),
        x: Some(poss.x),
        y: Some(poss.y),
        end_x: end.map(|(x, _)| x),
        end_y: end.map(|(_, y)| y),
        player_id: Some(poss.holder),
        receiver_player_id: receiver,
        team_id: Some(poss.team_id),
    }
}
