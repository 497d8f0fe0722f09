use std::fs;
use std::path::PathBuf;

use chrono::{Duration, TimeZone, Utc};

use gegenpress_companion::error::{ApiError, ScheduleError};
use gegenpress_companion::gameweek::{RemoteGameweek, WINDOW_SIZE};
use gegenpress_companion::league_api::{parse_images_json, parse_league_json};
use gegenpress_companion::schedule_fetch::{
    absorb_fetch_result, build_window, parse_schedule_json, window_from_schedule_json,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn schedule_window_starts_at_current_and_takes_next_three() {
    let raw = read_fixture("schedule.json");
    let window = window_from_schedule_json(&raw).expect("fixture should parse");
    let ids: Vec<u32> = window.iter().map(|gw| gw.id).collect();
    assert_eq!(ids, vec![21, 22, 23, 24]);
    assert_eq!(window.len(), WINDOW_SIZE);
    assert!(window.windows(2).all(|w| w[0].switch_time <= w[1].switch_time));
}

#[test]
fn schedule_window_is_short_at_end_of_season() {
    let raw = read_fixture("schedule_end_of_season.json");
    let window = window_from_schedule_json(&raw).expect("fixture should parse");
    let ids: Vec<u32> = window.iter().map(|gw| gw.id).collect();
    assert_eq!(ids, vec![37, 38]);
}

#[test]
fn schedule_window_breaks_ties_by_id_and_skips_repeated_ids() {
    let base = Utc.with_ymd_and_hms(2025, 1, 17, 18, 30, 0).unwrap();
    let t = base + Duration::days(7);
    let record = |id: u32, switch_time, is_current: bool| RemoteGameweek {
        id,
        switch_time,
        is_current,
    };
    let records = vec![
        record(1, base, true),
        record(5, t, false),
        record(3, t, false),
        record(3, t + Duration::days(1), false),
        record(1, t + Duration::days(2), false),
        record(7, t + Duration::days(3), false),
        record(8, t + Duration::days(4), false),
    ];
    let window = build_window(&records).expect("current record present");
    let ids: Vec<u32> = window.iter().map(|gw| gw.id).collect();
    assert_eq!(ids, vec![1, 3, 5, 7]);
    assert_eq!(window[1].switch_time, t);
}

#[test]
fn schedule_without_current_marker_is_empty() {
    let raw = read_fixture("schedule_no_current.json");
    let result = window_from_schedule_json(&raw);
    assert!(matches!(result, Err(ScheduleError::NoCurrentMarker)));
    assert!(absorb_fetch_result(result).is_empty());
}

#[test]
fn schedule_accepts_camel_case_records() {
    let raw = r#"{"appGameweekTimes":[{"id":3,"switchTime":"2024-08-30T17:00:00Z","isCurrent":true}]}"#;
    let records = parse_schedule_json(raw).expect("camelCase should parse");
    assert_eq!(records.len(), 1);
    assert!(records[0].is_current);
}

#[test]
fn schedule_shape_errors_are_malformed() {
    for raw in [
        "null",
        "{}",
        r#"{"appGameweekTimes": {"id": 1}}"#,
        r#"{"appGameweekTimes": [{"id": "x", "app_switch_time": "2024-08-30T17:00:00Z"}]}"#,
        r#"{"appGameweekTimes": [{"id": 1, "app_switch_time": "soon", "is_current": true}]}"#,
        "<html>bad gateway</html>",
    ] {
        let result = window_from_schedule_json(raw);
        assert!(
            matches!(result, Err(ScheduleError::MalformedResponse(_))),
            "expected malformed for {raw}"
        );
        assert!(absorb_fetch_result(result).is_empty());
    }
}

#[test]
fn parses_league_fixture_with_sorted_managers() {
    let raw = read_fixture("league.json");
    let lookup = parse_league_json(&raw, "1234567").expect("fixture should parse");
    assert_eq!(lookup.league_id, "1234567");
    assert_eq!(lookup.league_name, "Sunday Gegenpressers");
    assert_eq!(lookup.referral_code.as_deref(), Some("GP-7781"));
    let names: Vec<&str> = lookup
        .managers
        .iter()
        .map(|m| m.player_name.as_str())
        .collect();
    assert_eq!(names, vec!["alex moreno", "Bea Quint", "Zoe Hart"]);
}

#[test]
fn league_lookup_miss_is_not_found() {
    let err = parse_league_json(r#"{"leagueId": null}"#, "55555").unwrap_err();
    assert!(matches!(err, ApiError::LeagueNotFound(_)));
}

#[test]
fn parses_images_fixture() {
    let raw = read_fixture("images.json");
    let images = parse_images_json(&raw).expect("fixture should parse");
    assert_eq!(images.len(), 2);
    assert!(images[0].ends_with("overview.png"));
}
