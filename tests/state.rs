use std::path::PathBuf;

use anyhow::anyhow;
use opta_explorer::aggregate::{FeedUploads, PairingRules};
use opta_explorer::events::{EventType, MatchFeed};
use opta_explorer::feed::MatchFiles;
use opta_explorer::filter::{MatchSelection, PITCH_MAX};
use opta_explorer::session::Session;
use opta_explorer::settings::Settings;
use opta_explorer::state::{AppState, FeedSource, Screen, ZoneFocus};

fn feeds_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("feeds");
    path
}

fn demo_state(matches: usize) -> AppState {
    let mut state = AppState::new(Settings::default(), FeedSource::Demo { matches });
    state.reload();
    state
}

#[test]
fn demo_reload_opens_a_session_on_passes() {
    let state = demo_state(2);
    let session = state.session.as_ref().expect("demo session");
    assert_eq!(session.match_count(), 2);
    assert!(session.table().len() > 100);
    assert_eq!(state.event_type, Some(EventType::Pass));
    assert_eq!(
        state.logs.back().map(String::as_str),
        Some(format!("[INFO] Loaded 2 matches ({} events)", session.table().len()).as_str())
    );
}

#[test]
fn directory_reload_logs_every_match_issue() {
    let mut state = AppState::new(Settings::default(), FeedSource::Directory(feeds_dir()));
    state.reload();

    assert_eq!(state.session.as_ref().map(Session::match_count), Some(2));
    assert!(
        state
            .logs
            .iter()
            .any(|line| line == "[WARN] no events file found for 'm1'")
    );
    assert!(
        state
            .logs
            .iter()
            .any(|line| line.starts_with("[ERROR] error loading match 'broken'"))
    );
}

#[test]
fn unreadable_directory_clears_the_session() {
    let mut state = demo_state(1);
    state.source = FeedSource::Directory(feeds_dir().join("does-not-exist"));
    state.reload();
    assert!(state.session.is_none());
    assert_eq!(state.event_type, None);
    assert!(
        state
            .logs
            .back()
            .is_some_and(|line| line.starts_with("[ERROR]"))
    );
}

#[test]
fn new_upload_set_replaces_the_session_and_selection() {
    let mut state = demo_state(3);
    state.move_match_cursor(true);
    state.toggle_match_at_cursor();
    state.cycle_player(true);
    assert!(!state.excluded_matches.is_empty());
    assert!(state.player.is_some());

    state.source = FeedSource::Demo { matches: 1 };
    state.reload();
    assert_eq!(state.session.as_ref().map(Session::match_count), Some(1));
    assert!(state.excluded_matches.is_empty());
    assert_eq!(state.player, None);
    assert_eq!(state.match_cursor, 0);
}

#[test]
fn excluded_matches_drop_out_of_filters_and_sequences() {
    let mut state = demo_state(2);
    state.toggle_match_at_cursor();
    assert_eq!(state.match_selection(), MatchSelection::only(["demo_02"]));

    let session = state.session.as_ref().expect("demo session");
    let filter = state.event_filter().expect("event type selected");
    let view = session.events(&filter);
    assert!(view.rows.iter().all(|row| &*row.match_id == "demo_02"));

    let report = session.sequences(&state.sequence_query());
    assert!(report.sequences.iter().all(|s| s.match_id() == "demo_02"));

    state.select_all_matches();
    assert_eq!(state.match_selection(), MatchSelection::All);
}

#[test]
fn player_cycle_passes_through_all() {
    let mut state = demo_state(1);
    let players = state
        .session
        .as_ref()
        .map(|s| s.options().players.clone())
        .unwrap_or_default();
    assert!(!players.is_empty());

    state.cycle_player(true);
    assert_eq!(state.player.as_ref(), players.first());
    state.cycle_player(false);
    assert_eq!(state.player, None);
    state.cycle_player(false);
    assert_eq!(state.player.as_ref(), players.last());
}

#[test]
fn zone_keys_act_on_the_focused_zone_and_stay_on_pitch() {
    let mut state = demo_state(1);
    state.move_zone(100, 0);
    assert_eq!(state.events_zone.x_max(), PITCH_MAX);

    state.toggle_screen();
    assert_eq!(state.screen, Screen::Sequences);
    assert_eq!(state.zone_focus, ZoneFocus::Reception);
    state.cycle_zone_focus();
    assert_eq!(state.zone_focus, ZoneFocus::NextPass);

    let reception = state.reception_zone;
    let before = state.next_pass_zone;
    state.move_zone(0, -1);
    state.resize_zone(1, 0);
    assert_eq!(state.reception_zone, reception);
    assert_eq!(state.next_pass_zone.y_min(), before.y_min() - state.settings.zone_step);
    assert_eq!(
        state.next_pass_zone.x_max(),
        before.x_max() + state.settings.zone_step
    );
}

#[test]
fn session_is_absent_when_nothing_loads() {
    let uploads = FeedUploads {
        lineups: vec![PathBuf::from("a_f7.json"), PathBuf::from("b_f7.json")],
        events: vec![PathBuf::from("a_f24.json")],
    };
    let loader = |_: &MatchFiles| -> anyhow::Result<MatchFeed> { Err(anyhow!("unreadable")) };
    let load = Session::open(&loader, uploads, &PairingRules::default());
    assert!(load.session.is_none());
    assert_eq!(load.issues.len(), 2);
    assert_eq!(
        load.issues.iter().filter(|issue| issue.is_load_error()).count(),
        1
    );
}
