//! Framing of raw log lines: `[Mon Jan 02 15:04:05 2006] message`.

use chrono::NaiveDateTime;

/// `chrono` format of the bracketed timestamp.
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

const ZONE_MARKER: &str = "You have entered ";

/// A raw line split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine<'a> {
    pub timestamp: NaiveDateTime,
    /// Text after the `] ` separator.
    pub message: &'a str,
    /// Zone name if this line announces a zone change.
    pub zone: Option<&'a str>,
}

/// Split a raw line into timestamp and message.
///
/// Returns `None` for lines without a parseable bracketed timestamp; such
/// lines are ignored entirely.
#[must_use]
pub fn split_timestamp(raw: &str) -> Option<(NaiveDateTime, &str)> {
    let rest = raw.strip_prefix('[')?;
    let (stamp, message) = rest.split_once(']')?;
    let timestamp = NaiveDateTime::parse_from_str(stamp.trim(), TIMESTAMP_FORMAT).ok()?;
    let message = message.strip_prefix(' ').unwrap_or(message);
    Some((timestamp, message.trim_end()))
}

/// Zone name announced by `message`, if any.
///
/// `"You have entered an area where levitation effects do not function."`
/// shares the prefix and is not a zone change.
#[must_use]
pub fn detect_zone(message: &str) -> Option<&str> {
    let start = message.find(ZONE_MARKER)? + ZONE_MARKER.len();
    let zone = &message[start..];
    if zone.contains("levitation effects") {
        return None;
    }
    let zone = zone.trim_end();
    let zone = zone.strip_suffix('.').unwrap_or(zone).trim();
    (!zone.is_empty()).then_some(zone)
}

/// Parse a raw line. See [`split_timestamp`] and [`detect_zone`].
#[must_use]
pub fn parse_line(raw: &str) -> Option<LogLine<'_>> {
    let (timestamp, message) = split_timestamp(raw)?;
    Some(LogLine {
        timestamp,
        message,
        zone: detect_zone(message),
    })
}
