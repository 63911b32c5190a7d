//! Watcher error types.

use std::path::PathBuf;

/// Errors surfaced by the tracker to its caller.
#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    /// The path does not follow the log naming convention, or does not exist.
    #[error("Invalid log path {path}: {reason}")]
    InvalidLogPath { path: PathBuf, reason: &'static str },

    /// A component was initialized twice.
    #[error("{0} already initialized")]
    AlreadyInitialized(&'static str),

    /// Subscribing to a stream whose producer does not exist yet.
    #[error("Cannot subscribe before {0} is initialized")]
    SubscriptionOnUninitialized(&'static str),

    /// The log could not be opened for tailing.
    #[error(transparent)]
    Tail(#[from] TailError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a single poll of the log file. The tail loop logs and retries these.
#[derive(thiserror::Error, Debug)]
pub enum TailError {
    /// Watched file was deleted.
    #[error("Log file deleted: {0}")]
    FileDeleted(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
