//! The append-only match log.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::SessionError;

/// Plain-text match results, one line per event.
///
/// The file is created on first use if it does not exist. Every line is
/// also echoed through `tracing` at debug level.
#[derive(Debug, Clone)]
pub struct MatchLog {
    path: PathBuf,
}

impl MatchLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the log file (and its parent directories) if absent.
    ///
    /// # Errors
    /// [`SessionError::Log`] if the file cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let log = Self::new(path);
        log.open_append().map_err(|source| log.error(source))?;
        tracing::info!(path = %log.path.display(), "logging match results");
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line.
    ///
    /// # Errors
    /// [`SessionError::Log`] if the file cannot be opened or written.
    pub fn append(&self, line: &str) -> Result<(), SessionError> {
        tracing::debug!("Game Output: {line}");
        let mut file = self.open_append().map_err(|source| self.error(source))?;
        writeln!(file, "{line}").map_err(|source| self.error(source))
    }

    /// Opens for appending, creating the file. A missing parent directory
    /// is created and the open retried once.
    fn open_append(&self) -> io::Result<fs::File> {
        let open = || OpenOptions::new().create(true).append(true).open(&self.path);
        match open() {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                open()
            }
            result => result,
        }
    }

    fn error(&self, source: io::Error) -> SessionError {
        SessionError::Log {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "deathrope-log-{}-{name}",
            std::process::id()
        ))
    }

    #[test]
    fn test_append_creates_file_and_adds_lines() {
        let path = temp_path("append.txt");
        let _ = fs::remove_file(&path);
        let log = MatchLog::new(&path);

        log.append("first").unwrap();
        log.append("second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_creates_missing_parent_dirs() {
        let dir = temp_path("nested");
        let path = dir.join("deeper").join("gamelog.txt");
        let _ = fs::remove_dir_all(&dir);

        let log = MatchLog::open(&path).unwrap();

        assert!(log.path().exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_open_keeps_existing_content() {
        let path = temp_path("existing.txt");
        fs::write(&path, "old\n").unwrap();

        let log = MatchLog::open(&path).unwrap();
        log.append("new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
        fs::remove_file(&path).unwrap();
    }
}
