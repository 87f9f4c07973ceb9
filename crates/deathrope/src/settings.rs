//! Match settings persisted as JSON.
//!
//! A missing or corrupted settings file is never fatal: it is rewritten
//! with defaults (with a warning) and the defaults are used.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use deathrope_match::{GameModeKind, MatchConfig};
use deathrope_tick::TickConfig;
use serde::{Deserialize, Serialize};

/// Errors reading or writing settings and key-binding files.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    /// Controller slots are numbered from 1.
    #[error("controller slot {slot} out of range 1..={max}")]
    InvalidSlot { slot: usize, max: usize },
}

/// Everything needed to set up and run a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Scene the match is played in.
    pub level: String,
    /// Number of teams (two players each).
    pub teams: usize,
    pub game_mode: GameModeKind,
    #[serde(rename = "match")]
    pub match_config: MatchConfig,
    pub tick: TickConfig,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            level: "Cliffs_Level".to_string(),
            teams: 2,
            game_mode: GameModeKind::default(),
            match_config: MatchConfig::default(),
            tick: TickConfig::default(),
        }
    }
}

impl MatchSettings {
    pub const MAX_TEAMS: usize = 4;

    /// Loads settings from `path`.
    ///
    /// A missing or unparseable file is replaced with the defaults, which
    /// are returned.
    ///
    /// # Errors
    /// [`SettingsError::Io`] if the file exists but cannot be read, or the
    /// default file cannot be written.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "settings file not found, generating defaults");
                return Self::regenerate(path);
            }
            Err(source) => return Err(io_error(path, source)),
        };

        match serde_json::from_str::<Self>(&text) {
            Ok(settings) => Ok(settings.validated()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "settings file corrupted, regenerating");
                Self::regenerate(path)
            }
        }
    }

    /// Writes these settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        write_json(path, self)
    }

    /// Fixes out-of-range values.
    ///
    /// - `teams` clamped to `1..=MAX_TEAMS`.
    /// - Nested configs run their own validation.
    pub fn validated(mut self) -> Self {
        let teams = self.teams.clamp(1, Self::MAX_TEAMS);
        if teams != self.teams {
            tracing::warn!(teams = self.teams, clamped = teams, "team count out of range");
            self.teams = teams;
        }
        self.match_config = self.match_config.validated();
        self.tick = self.tick.validated();
        self
    }

    fn regenerate(path: &Path) -> Result<Self, SettingsError> {
        let settings = Self::default();
        settings.save(path)?;
        Ok(settings)
    }
}

// ---------------------------------------------------------------------------
// File helpers shared with the key-binding store
// ---------------------------------------------------------------------------

pub(crate) fn io_error(path: &Path, source: io::Error) -> SettingsError {
    SettingsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Pretty-prints `value` to `path`, creating parent directories.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::write(path, json).map_err(|e| io_error(path, e))
}
