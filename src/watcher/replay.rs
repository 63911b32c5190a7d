//! Synchronous replay of a complete log through a combat engine.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::combat::CombatEngine;

use super::error::TrackerError;
use super::line::parse_line;

/// Counters for one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub lines: u64,
    /// Lines with a parseable timestamp.
    pub stamped: u64,
    pub zones: u64,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
}

/// Feed every line of `reader` to `engine`, in order.
///
/// Uses the same framing and dispatch as the live tracker, so replaying a
/// file into a fresh engine yields the events a live tail would have.
///
/// # Errors
///
/// Returns an error if reading fails.
pub fn replay<R: BufRead>(mut reader: R, engine: &mut CombatEngine) -> Result<ReplayStats, TrackerError> {
    let mut stats = ReplayStats::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        stats.lines += 1;

        let raw = String::from_utf8_lossy(&buf);
        let raw = raw.trim_end_matches(|c| c == '\r' || c == '\n');
        let Some(line) = parse_line(raw) else {
            continue;
        };

        stats.stamped += 1;
        stats.first.get_or_insert(line.timestamp);
        stats.last = Some(line.timestamp);

        engine.process(line.timestamp, line.message);
        if let Some(zone) = line.zone {
            stats.zones += 1;
            engine.on_zone(line.timestamp, zone);
        }
    }
    tracing::debug!(
        lines = stats.lines,
        stamped = stats.stamped,
        zones = stats.zones,
        "Replay finished"
    );
    Ok(stats)
}

/// Replay the log at `path`.
///
/// # Errors
///
/// Returns `TrackerError::InvalidLogPath` if the file does not exist, or an
/// I/O error if it cannot be read.
pub fn replay_file(path: &Path, engine: &mut CombatEngine) -> Result<ReplayStats, TrackerError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TrackerError::InvalidLogPath {
            path: path.to_path_buf(),
            reason: "file does not exist",
        },
        _ => TrackerError::Io(e),
    })?;
    replay(BufReader::new(file), engine)
}
