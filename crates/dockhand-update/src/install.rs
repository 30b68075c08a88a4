//! Replacing the running executable
//!
//! The new binary is staged next to the target, the current binary is moved
//! aside to a backup path in the same directory, and the staged file is
//! renamed into place. Any failure after the old binary was moved aside
//! restores it.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::{Error, Result};

type Verifier = Box<dyn Fn(&Path) -> std::result::Result<(), String>>;

/// Extract the first regular file from a gzip-compressed tar archive.
///
/// Returns `None` when the archive holds no regular file.
pub fn extract_payload(archive: impl Read) -> Result<Option<Vec<u8>>> {
    let mut archive = tar::Archive::new(GzDecoder::new(archive));
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type() != tar::EntryType::Regular {
            continue;
        }
        tracing::debug!(path = %entry.path()?.display(), "Extracting update payload");
        let mut payload = Vec::new();
        entry.read_to_end(&mut payload)?;
        return Ok(Some(payload));
    }
    Ok(None)
}

/// Swaps a binary on disk for a new one, with rollback.
pub struct BinaryInstaller {
    target: PathBuf,
    verify: Option<Verifier>,
}

impl std::fmt::Debug for BinaryInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryInstaller")
            .field("target", &self.target)
            .field("verify", &self.verify.is_some())
            .finish()
    }
}

impl BinaryInstaller {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            verify: None,
        }
    }

    /// Installer for the executable of the running process.
    pub fn current_exe() -> Result<Self> {
        let exe = std::env::current_exe().map_err(Error::CurrentExe)?;
        let exe = dunce::canonicalize(&exe).unwrap_or(exe);
        Ok(Self::new(exe))
    }

    /// Check the installed binary before the backup is discarded.
    ///
    /// A failing check rolls the installation back.
    pub fn with_verifier(
        mut self,
        verify: impl Fn(&Path) -> std::result::Result<(), String> + 'static,
    ) -> Self {
        self.verify = Some(Box::new(verify));
        self
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Where the previous binary is kept while the new one is installed.
    pub fn backup_path(&self) -> PathBuf {
        let name = self
            .target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dockhand".to_string());
        self.target.with_file_name(format!(".{name}.previous-version"))
    }

    pub fn install(&self, payload: &[u8]) -> Result<()> {
        let dir = self
            .target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut staged = tempfile::Builder::new()
            .prefix(".dockhand-new")
            .tempfile_in(dir)?;
        staged.write_all(payload)?;
        staged.as_file().sync_all()?;
        if let Ok(metadata) = fs::metadata(&self.target) {
            fs::set_permissions(staged.path(), metadata.permissions())?;
        }

        let backup = self.backup_path();
        if backup.exists() {
            fs::remove_file(&backup)?;
        }
        fs::rename(&self.target, &backup)?;
        tracing::debug!(backup = %backup.display(), "Saved the previous binary");

        let outcome = staged
            .persist(&self.target)
            .map_err(|e| e.error.to_string())
            .and_then(|_| match &self.verify {
                Some(verify) => verify(&self.target),
                None => Ok(()),
            });

        match outcome {
            Ok(()) => {
                if let Err(e) = fs::remove_file(&backup) {
                    tracing::debug!(backup = %backup.display(), "Previous binary left in place: {e}");
                }
                tracing::info!(path = %self.target.display(), "Installed the new binary");
                Ok(())
            }
            Err(cause) => self.rollback(&backup, cause),
        }
    }

    fn rollback(&self, backup: &Path, cause: String) -> Result<()> {
        tracing::warn!("Installation failed, restoring the previous binary: {cause}");
        match fs::rename(backup, &self.target) {
            Ok(()) => Err(Error::Install {
                path: self.target.clone(),
                cause,
            }),
            Err(e) => Err(Error::RollbackFailed {
                cause,
                rollback: e.to_string(),
            }),
        }
    }
}
