//! Timestamp fingerprints of directory trees
//!
//! A fingerprint mixes arbitrary text with the modification time of every
//! regular file under a directory. Touching a file changes the fingerprint
//! even when its bytes are unchanged; file content itself is never read.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Incremental SHA-256 fingerprint rendered as lowercase hex.
#[derive(Debug, Clone, Default)]
pub struct TreeFingerprint {
    hasher: Sha256,
}

impl TreeFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mix a string into the fingerprint.
    pub fn text(mut self, value: &str) -> Self {
        self.hasher.update(value.as_bytes());
        self
    }

    /// Mix in the modification time of every regular file under `dir`.
    ///
    /// Entries are visited in file-name order. Files whose path contains
    /// `exclude` are skipped, as are entries that cannot be read.
    pub fn file_times(mut self, dir: &Path, exclude: &str) -> Self {
        let walker = WalkDir::new(dir).sort_by_file_name();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().to_string_lossy().contains(exclude) {
                continue;
            }
            let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
                continue;
            };
            let stamp = DateTime::<Utc>::from(modified).to_rfc3339_opts(SecondsFormat::Nanos, true);
            self.hasher.update(stamp.as_bytes());
        }
        self
    }

    /// Finish and render the digest as lowercase hex.
    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn text_fingerprint_is_deterministic() {
        let a = TreeFingerprint::new().text("layer").text("RUN true").finish();
        let b = TreeFingerprint::new().text("layer").text("RUN true").finish();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn touching_a_file_changes_fingerprint() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("script.sh");
        fs::write(&file, "echo hi").unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(&file, base);

        let before = TreeFingerprint::new().file_times(temp.path(), "descriptor").finish();
        let again = TreeFingerprint::new().file_times(temp.path(), "descriptor").finish();
        assert_eq!(before, again);

        set_mtime(&file, base + Duration::from_secs(60));
        let after = TreeFingerprint::new().file_times(temp.path(), "descriptor").finish();
        assert_ne!(before, after);
    }

    #[test]
    fn nested_file_times_are_included() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("scripts/deep/run.sh");
        fs::create_dir_all(nested.parent().unwrap()).unwrap();
        fs::write(&nested, "echo hi").unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(&nested, base);

        let empty = TreeFingerprint::new().finish();
        let before = TreeFingerprint::new().file_times(temp.path(), "descriptor").finish();
        assert_ne!(empty, before);

        set_mtime(&nested, base + Duration::from_secs(1));
        let after = TreeFingerprint::new().file_times(temp.path(), "descriptor").finish();
        assert_ne!(before, after);
    }

    #[test]
    fn excluded_files_do_not_affect_fingerprint() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("keep.txt"), "x").unwrap();
        let before = TreeFingerprint::new().file_times(temp.path(), "descriptor").finish();

        fs::write(temp.path().join("descriptor.123"), "FROM scratch").unwrap();
        let after = TreeFingerprint::new().file_times(temp.path(), "descriptor").finish();

        assert_eq!(before, after);
    }

    #[test]
    fn missing_directory_contributes_nothing() {
        let temp = TempDir::new().unwrap();
        let empty = TreeFingerprint::new().text("x").finish();
        let missing = TreeFingerprint::new()
            .text("x")
            .file_times(&temp.path().join("nope"), "descriptor")
            .finish();
        assert_eq!(empty, missing);
    }
}
