//! Configuration file discovery along the ancestor chain
//!
//! Walks from a working directory up to the filesystem root and reports the
//! configuration files that exist at each level. Files are only checked for
//! existence here; reading and parsing happen later in the merge pipeline.

use std::path::{Path, PathBuf};

use crate::{ConfigFile, Error, Result};

/// Canonicalize a working directory without the `\\?\` prefix on Windows.
pub fn canonical_dir(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|e| Error::io(path, e))
}

/// Return every configuration file found from the filesystem root down to `cwd`.
///
/// The result is ordered root-to-leaf so that later entries are more specific.
/// Within a directory the user file comes before the project file. When
/// `include_user` is false only project files are reported.
pub fn find_config_files(cwd: &Path, include_user: bool) -> Vec<PathBuf> {
    let mut levels: Vec<Vec<PathBuf>> = Vec::new();
    let mut current = Some(cwd);

    while let Some(dir) = current {
        let found: Vec<PathBuf> = ConfigFile::lookup_order(include_user)
            .iter()
            .map(|name| dir.join(name))
            .filter(|candidate| candidate.exists())
            .collect();
        if !found.is_empty() {
            tracing::trace!(dir = %dir.display(), count = found.len(), "Found config files");
        }
        levels.push(found);
        current = dir.parent();
    }

    levels.into_iter().rev().flatten().collect()
}
