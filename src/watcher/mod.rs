//! Log source: file naming, line framing, tailing and replay.

mod error;
mod line;
mod path;
mod replay;
mod tailer;
mod tracker;

pub use error::{TailError, TrackerError};
pub use line::{detect_zone, parse_line, split_timestamp, LogLine, TIMESTAMP_FORMAT};
pub use path::player_name;
pub use replay::{replay, replay_file, ReplayStats};
pub use tailer::LogTailer;
pub use tracker::{LineSubscriber, Tracker, ZoneSubscriber};
