//! Incremental log file tailer.
//!
//! Polls the file for appended bytes and returns complete lines only. A
//! line still being written is left for the next poll.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::error::TailError;

/// Incremental line reader that tracks its read position.
#[derive(Debug)]
pub struct LogTailer {
    /// Path to the log file.
    path: PathBuf,
    /// Byte offset just past the last complete line consumed.
    offset: u64,
}

impl LogTailer {
    /// Create a tailer that reads the file from the beginning.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, offset: 0 }
    }

    /// Create a tailer positioned at the current end of the file, so only
    /// lines appended from now on are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's metadata cannot be read.
    pub fn at_end(path: PathBuf) -> Result<Self, TailError> {
        let offset = Self::open(&path)?.metadata()?.len();
        Ok(Self { path, offset })
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path) -> Result<File, TailError> {
        File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TailError::FileDeleted(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => TailError::PermissionDenied(path.to_path_buf()),
            _ => TailError::Io(e),
        })
    }

    /// Read complete lines appended since the last read.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped and blank lines
    /// dropped. Invalid UTF-8 is replaced rather than rejected.
    ///
    /// If the file shrank below the current offset (truncated or replaced),
    /// reading restarts from the beginning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn read_new_lines(&mut self) -> Result<Vec<String>, TailError> {
        let mut file = Self::open(&self.path)?;
        let file_len = file.metadata()?.len();

        if file_len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                old_offset = self.offset,
                new_len = file_len,
                "Log truncated, resetting offset to 0"
            );
            self.offset = 0;
        }

        if file_len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::new();
        file.take(file_len - self.offset).read_to_end(&mut buf)?;

        let Some(last_newline) = buf.iter().rposition(|b| *b == b'\n') else {
            return Ok(Vec::new());
        };
        let complete = &buf[..=last_newline];
        self.offset += complete.len() as u64;

        Ok(complete
            .split(|b| *b == b'\n')
            .map(|line| {
                String::from_utf8_lossy(line)
                    .trim_end_matches('\r')
                    .to_string()
            })
            .filter(|line| !line.trim().is_empty())
            .collect())
    }
}
