use std::path::PathBuf;

use anyhow::{Result, anyhow};

use opta_explorer::cli::CliArgs;
use opta_explorer::counts::CountRow;
use opta_explorer::events::EventType;
use opta_explorer::export::{default_export_path, export_events_xlsx, export_sequences_xlsx};
use opta_explorer::filter::{EventFilter, MatchSelection, Zone};
use opta_explorer::sequences::{RECEPTION_TOLERANCE_SECS, SequenceQuery};
use opta_explorer::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Events,
    Sequences,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let settings = Settings::from_env();
    let args = CliArgs::from_env();
    let mode = parse_mode_arg(&args)?;
    let source = args.feed_source(&settings)?;

    let load = source.open(&settings.rules)?;
    for issue in &load.issues {
        eprintln!("{}", issue.log_line());
    }
    let Some(session) = load.session else {
        return Err(anyhow!("no matches could be paired and loaded"));
    };
    println!(
        "Loaded {} matches ({} events)",
        session.match_count(),
        session.table().len()
    );

    let matches = parse_matches_arg(&args);
    let out = parse_out_arg(&args, &settings, mode);

    match mode {
        Mode::Events => {
            let filter = EventFilter {
                event_type: args
                    .value("--type")
                    .map(|raw| EventType::parse(&raw))
                    .unwrap_or(EventType::Pass),
                matches,
                player: args.value("--player"),
                team: args.value("--team"),
                zone: parse_zone_arg(&args, "--zone", settings.events_zone)?,
            };
            let view = session.events(&filter);
            println!("Type: {} | Zone: {}", filter.event_type, filter.zone);
            print_counts(&view.counts, view.rows.len(), "events");
            if let Some(path) = out {
                let report = export_events_xlsx(&path, &view.rows, &view.counts)?;
                println!("Exported {} rows to {}", report.rows, report.path.display());
            }
        }
        Mode::Sequences => {
            let query = SequenceQuery {
                reception_zone: parse_zone_arg(&args, "--rec-zone", settings.reception_zone)?,
                next_pass_zone: parse_zone_arg(&args, "--pass-zone", settings.next_pass_zone)?,
                matches,
            };
            let report = session.sequences(&query);
            println!(
                "Reception: {} | Next pass: {} | Window: {}s",
                query.reception_zone, query.next_pass_zone, RECEPTION_TOLERANCE_SECS
            );
            print_counts(&report.counts, report.sequences.len(), "sequences");
            if let Some(path) = out {
                let exported = export_sequences_xlsx(&path, &report.sequences, &report.counts)?;
                println!(
                    "Exported {} sequences to {}",
                    exported.rows,
                    exported.path.display()
                );
            }
        }
    }
    Ok(())
}

fn parse_mode_arg(args: &CliArgs) -> Result<Mode> {
    match args.value("--mode").as_deref() {
        None | Some("events") => Ok(Mode::Events),
        Some("sequences") | Some("seq") => Ok(Mode::Sequences),
        Some(other) => Err(anyhow!("unknown --mode '{other}' (events|sequences)")),
    }
}

fn parse_matches_arg(args: &CliArgs) -> MatchSelection {
    let ids = args.list("--matches");
    if ids.is_empty() {
        MatchSelection::All
    } else {
        MatchSelection::only(ids)
    }
}

fn parse_zone_arg(args: &CliArgs, name: &str, fallback: Zone) -> Result<Zone> {
    match args.value(name) {
        Some(raw) => Zone::parse(&raw),
        None => Ok(fallback),
    }
}

/// `--out <path>` writes there; a bare `--out` picks a timestamped name in
/// the export dir.
fn parse_out_arg(args: &CliArgs, settings: &Settings, mode: Mode) -> Option<PathBuf> {
    if let Some(path) = args.value("--out") {
        return Some(PathBuf::from(path));
    }
    if !args.has_flag("--out") {
        return None;
    }
    let prefix = match mode {
        Mode::Events => "events",
        Mode::Sequences => "sequences",
    };
    Some(default_export_path(&settings.export_dir, prefix))
}

fn print_counts(counts: &[CountRow], total: usize, unit: &str) {
    if counts.is_empty() {
        println!("No {unit} for this selection");
        return;
    }
    println!("{:<28} {:<20} {:>6}", "Player", "Team", "Count");
    for row in counts {
        println!(
            "{:<28} {:<20} {:>6}",
            row.player_label(),
            row.team_label(),
            row.count
        );
    }
    println!("Total {unit}: {total}");
}
