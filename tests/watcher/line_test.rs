//! Integration tests for line framing and log naming.

use std::path::Path;

use eqlog_tracker::watcher::{detect_zone, parse_line, player_name, TrackerError};

#[test]
fn line_parse_with_zone() {
    let line = parse_line("[Sat Mar 02 08:00:01 2024] You have entered Greater Faydark.").unwrap();
    assert_eq!(line.message, "You have entered Greater Faydark.");
    assert_eq!(line.zone, Some("Greater Faydark"));
    assert_eq!(
        line.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        "2024-03-02 08:00:01"
    );
}

#[test]
fn line_levitation_is_not_a_zone() {
    assert_eq!(
        detect_zone("You have entered an area where levitation effects do not function."),
        None
    );
}

#[test]
fn line_without_timestamp_is_ignored() {
    assert!(parse_line("no brackets at all").is_none());
    assert!(parse_line("[not a date] You slash a gnoll for 1 point of damage.").is_none());
}

#[test]
fn log_name_conventions() {
    assert_eq!(
        player_name(Path::new("/logs/eqlog_Shin_project1999.txt")).unwrap(),
        "Shin"
    );
    assert!(matches!(
        player_name(Path::new("/logs/notes.txt")),
        Err(TrackerError::InvalidLogPath { .. })
    ));
}
