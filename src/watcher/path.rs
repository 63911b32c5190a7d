//! Log file naming convention.

use std::path::Path;

use super::error::TrackerError;

const LOG_PREFIX: &str = "eqlog_";

/// Extract the character name from a log path such as `eqlog_Bob_server.txt`.
///
/// The name is the text between `eqlog_` and the next `_` in the file name.
/// Without a second `_` the extension is dropped instead.
///
/// # Errors
///
/// Returns `TrackerError::InvalidLogPath` if the file name lacks the prefix
/// or the name comes out empty.
pub fn player_name(path: &Path) -> Result<String, TrackerError> {
    let invalid = |reason| TrackerError::InvalidLogPath {
        path: path.to_path_buf(),
        reason,
    };

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| invalid("no file name"))?;
    let (_, rest) = file_name
        .split_once(LOG_PREFIX)
        .ok_or_else(|| invalid("missing eqlog_ prefix"))?;

    let name = match rest.split_once('_') {
        Some((name, _)) => name,
        None => rest.split('.').next().unwrap_or_default(),
    };
    if name.is_empty() {
        return Err(invalid("empty player name"));
    }
    Ok(name.to_string())
}
