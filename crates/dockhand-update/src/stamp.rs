//! Last update-check timestamp
//!
//! The stamp is an RFC 3339 timestamp stored under the user cache directory.
//! A missing or unreadable stamp means no check was ever recorded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use dockhand_fs::io::{read_text, write_atomic};

use crate::Result;

const STAMP_DIR: &str = "dockhand";
const STAMP_FILE: &str = "last-update-check";

/// Records when the release API was last consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStamp {
    path: PathBuf,
}

impl UpdateStamp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Stamp in `<cache dir>/dockhand/last-update-check`.
    ///
    /// Falls back to the system temporary directory when the platform has
    /// no cache directory.
    pub fn in_cache_dir() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join(STAMP_DIR).join(STAMP_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        let text = read_text(&self.path).ok()?;
        match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(time) => Some(time.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), "Ignoring unreadable update stamp: {e}");
                None
            }
        }
    }

    /// Time since the last recorded check, or `None` if there is none.
    ///
    /// A stamp in the future counts as zero elapsed time.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_check()?;
        Some((now - last).to_std().unwrap_or(Duration::ZERO))
    }

    pub fn touch(&self, now: DateTime<Utc>) -> Result<()> {
        let text = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        write_atomic(&self.path, text.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "Recorded update check");
        Ok(())
    }
}
