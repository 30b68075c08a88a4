//! Error types for dockhand-update

use std::path::PathBuf;

/// Result type for dockhand-update operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while checking for or applying an update
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The release API could not be queried
    #[error("Unable to query the latest release at {url}: {reason}")]
    ReleaseQuery { url: String, reason: String },

    /// A release version could not be parsed
    #[error("Invalid release version `{version}`: {reason}")]
    InvalidVersion { version: String, reason: String },

    /// The release artifact could not be downloaded
    #[error("Unable to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// The release artifact holds nothing to install
    #[error("Release artifact {url} does not contain an executable")]
    EmptyArtifact { url: String },

    /// The running executable could not be located
    #[error("Unable to locate the running executable: {0}")]
    CurrentExe(std::io::Error),

    /// The new binary failed to install; the previous one was restored
    #[error("Failed to install the new binary at {path}: {cause}")]
    Install { path: PathBuf, cause: String },

    /// The new binary failed to install and the previous one could not be restored
    #[error("Failed to install the new binary: {cause}\nRollback from the bad update also failed: {rollback}")]
    RollbackFailed { cause: String, rollback: String },

    // Transparent wrappers for underlying crate errors
    /// Error from dockhand-core
    #[error(transparent)]
    Core(#[from] dockhand_core::Error),

    /// Filesystem error from dockhand-fs
    #[error(transparent)]
    Fs(#[from] dockhand_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
