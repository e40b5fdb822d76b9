use std::path::PathBuf;

use crate::aggregate::{DEFAULT_EVENTS_SUFFIX, DEFAULT_LINEUP_SUFFIX, PairingRules};
use crate::filter::Zone;

const DEFAULT_ZONE_STEP: u32 = 5;

/// Runtime configuration, read from the environment (`.env` files are loaded
/// by the binaries before this runs).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rules: PairingRules,
    pub data_dir: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub zone_step: f64,
    pub events_zone: Zone,
    pub reception_zone: Zone,
    pub next_pass_zone: Zone,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
        };
        let zone = |key: &str, fallback: Zone| {
            non_empty(key)
                .and_then(|raw| Zone::parse(&raw).ok())
                .unwrap_or(fallback)
        };

        let rules = PairingRules {
            lineup_suffix: non_empty("OPTA_LINEUP_SUFFIX")
                .unwrap_or_else(|| DEFAULT_LINEUP_SUFFIX.to_string()),
            events_suffix: non_empty("OPTA_EVENTS_SUFFIX")
                .unwrap_or_else(|| DEFAULT_EVENTS_SUFFIX.to_string()),
        };
        let zone_step = non_empty("OPTA_ZONE_STEP")
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_ZONE_STEP)
            .clamp(1, 25);

        Self {
            rules,
            data_dir: non_empty("OPTA_DATA_DIR").map(PathBuf::from),
            export_dir: non_empty("OPTA_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            zone_step: f64::from(zone_step),
            events_zone: zone("OPTA_EVENTS_ZONE", default_events_zone()),
            reception_zone: zone("OPTA_RECEPTION_ZONE", default_sequence_zone()),
            next_pass_zone: zone("OPTA_NEXT_PASS_ZONE", default_sequence_zone()),
        }
    }
}

fn default_events_zone() -> Zone {
    Zone::new(30.0, 70.0, 20.0, 80.0).unwrap_or(Zone::FULL)
}

fn default_sequence_zone() -> Zone {
    Zone::new(30.0, 70.0, 30.0, 70.0).unwrap_or(Zone::FULL)
}
