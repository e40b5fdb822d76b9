use std::path::PathBuf;

use anyhow::anyhow;
use opta_explorer::aggregate::{
    FeedUploads, MatchIssue, PairingRules, discover_feed_files, load_feed_set,
};
use opta_explorer::events::{EventType, MatchFeed};
use opta_explorer::feed::{JsonFeedLoader, MatchFiles};
use opta_explorer::filter::{EventFilter, apply_filter};

fn feeds_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("feeds");
    path
}

fn load_fixture_dir() -> opta_explorer::aggregate::LoadReport {
    let rules = PairingRules::default();
    let uploads = discover_feed_files(&feeds_dir(), &rules).expect("fixture dir should list");
    load_feed_set(&JsonFeedLoader, &uploads, &rules)
}

#[test]
fn discovery_splits_files_by_suffix_in_name_order() {
    let uploads = discover_feed_files(&feeds_dir(), &PairingRules::default())
        .expect("fixture dir should list");
    let names = |paths: &[PathBuf]| {
        paths
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect::<Vec<_>>()
    };
    assert_eq!(
        names(&uploads.lineups),
        vec!["broken_f7.json", "m1_f7.json", "m2_f7.json", "m3_f7.json"]
    );
    assert_eq!(
        names(&uploads.events),
        vec!["broken_f24.json", "m2_f24.json", "m3_f24.json"]
    );
}

#[test]
fn lineup_without_events_and_broken_match_do_not_stop_the_rest() {
    let report = load_fixture_dir();

    let ids: Vec<&str> = report.table.match_ids().iter().map(|id| &**id).collect();
    assert_eq!(ids, vec!["m2", "m3"]);
    assert_eq!(report.table.len(), 10);

    assert_eq!(report.issues.len(), 2);
    assert_eq!(
        report.issues[0],
        MatchIssue::MissingEvents {
            match_id: "m1".to_string()
        }
    );
    assert!(report.issues[1].is_load_error());
    assert_eq!(report.issues[1].match_id(), Some("broken"));
    assert!(report.issues[1].to_string().contains("broken_f24.json"));
    assert!(report.issues.iter().all(|issue| issue.match_id() != Some("m2")));
}

#[test]
fn every_row_is_tagged_with_a_loaded_match_id() {
    let report = load_fixture_dir();
    let ids = report.table.match_ids();
    assert!(
        report
            .table
            .rows()
            .iter()
            .all(|row| ids.iter().any(|id| *id == row.match_id))
    );
    // Upload order is kept: every m2 row comes before every m3 row.
    let first_m3 = report
        .table
        .rows()
        .iter()
        .position(|row| &*row.match_id == "m3")
        .expect("m3 rows");
    assert!(report.table.rows()[..first_m3].iter().all(|row| &*row.match_id == "m2"));
}

#[test]
fn shared_ids_resolve_against_their_own_match() {
    let report = load_fixture_dir();
    let name_of = |match_id: &str, player_id: u32| {
        report
            .table
            .rows()
            .iter()
            .find(|row| &*row.match_id == match_id && row.event.player_id == Some(player_id))
            .and_then(|row| row.player_name.clone())
    };
    assert_eq!(name_of("m2", 7).as_deref(), Some("Ana Costa"));
    assert_eq!(name_of("m3", 7).as_deref(), Some("Carla Dias"));

    let team_of = |match_id: &str| {
        report
            .table
            .rows()
            .iter()
            .find(|row| &*row.match_id == match_id && row.event.team_id == Some(10))
            .and_then(|row| row.team_name.clone())
    };
    assert_eq!(team_of("m2").as_deref(), Some("Rivers FC"));
    assert_eq!(team_of("m3").as_deref(), Some("Coast Athletic"));
}

#[test]
fn unknown_ids_resolve_to_none() {
    let report = load_fixture_dir();
    let row = report
        .table
        .rows()
        .iter()
        .find(|row| row.event.player_id == Some(99))
        .expect("row for unknown player");
    assert_eq!(row.player_name, None);
    assert_eq!(row.team_name.as_deref(), Some("Rivers FC"));
    assert_eq!(row.event.event_type, EventType::Pass);
}

#[test]
fn closure_loaders_report_failures_per_match() {
    let uploads = FeedUploads {
        lineups: vec![PathBuf::from("a_f7.json"), PathBuf::from("b_f7.json")],
        events: vec![PathBuf::from("b_f24.json"), PathBuf::from("a_f24.json")],
    };
    let loader = |files: &MatchFiles| -> anyhow::Result<MatchFeed> {
        if files.match_id == "a" {
            Err(anyhow!("corrupt feed"))
        } else {
            Ok(MatchFeed::default())
        }
    };
    let report = load_feed_set(&loader, &uploads, &PairingRules::default());

    let ids: Vec<&str> = report.table.match_ids().iter().map(|id| &**id).collect();
    assert_eq!(ids, vec!["b"]);
    assert!(report.table.is_empty());
    assert_eq!(
        report.issues,
        vec![MatchIssue::LoadFailed {
            match_id: "a".to_string(),
            message: "corrupt feed".to_string(),
        }]
    );
}

#[test]
fn custom_suffixes_pair_other_naming_schemes() {
    let rules = PairingRules {
        lineup_suffix: "-meta.json".to_string(),
        events_suffix: "-events.json".to_string(),
    };
    let uploads = FeedUploads {
        lineups: vec![PathBuf::from("final-meta.json")],
        events: vec![PathBuf::from("final-events.json"), PathBuf::from("final_f24.json")],
    };
    let loader = |_: &MatchFiles| -> anyhow::Result<MatchFeed> { Ok(MatchFeed::default()) };
    let report = load_feed_set(&loader, &uploads, &rules);
    assert_eq!(report.table.match_ids().len(), 1);
    assert!(matches!(
        report.issues.as_slice(),
        [MatchIssue::UnrecognizedFile { .. }]
    ));
}

#[test]
fn rows_without_a_location_load_but_never_match_a_zone() {
    let report = load_fixture_dir();
    let substitution = report
        .table
        .rows()
        .iter()
        .find(|row| row.event.event_type == EventType::Substitution)
        .expect("substitution row");
    assert_eq!(&*substitution.match_id, "m2");
    assert_eq!(substitution.point(), None);
    assert_eq!(substitution.player_name.as_deref(), Some("Bia Lima"));

    assert!(apply_filter(&report.table, &EventFilter::new(EventType::Substitution)).is_empty());
}
