//! Update eligibility and the check/apply cycle

use chrono::{DateTime, Utc};
use dockhand_core::{ResolvedConfig, ToolVersion};
use semver::Version;

use crate::install::{BinaryInstaller, extract_payload};
use crate::release::{ReleaseSource, parse_release_version};
use crate::stamp::UpdateStamp;
use crate::{Error, Result};

/// What the command line asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateRequest {
    /// Follow `auto-update` and `auto-update-delay`
    #[default]
    Auto,
    /// `--update`
    Force,
    /// `--no-update`
    Disable,
}

impl UpdateRequest {
    /// `--no-update` wins when both flags are given.
    pub fn from_flags(update: bool, no_update: bool) -> Self {
        match (update, no_update) {
            (_, true) => Self::Disable,
            (true, false) => Self::Force,
            (false, false) => Self::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateState {
    /// Nothing to do
    Skip,
    /// A release check should run
    DueForCheck,
    /// A newer release is being installed
    Updating { version: Version },
    /// The newer release is installed; the process should restart
    Applied { version: Version },
    /// Installation failed and the previous binary was restored
    RolledBack { version: Version, cause: String },
}

/// Drives one update cycle for the running binary.
#[derive(Debug)]
pub struct UpdateCoordinator {
    current: ToolVersion,
    source: ReleaseSource,
    stamp: UpdateStamp,
    installer: BinaryInstaller,
}

impl UpdateCoordinator {
    pub fn new(
        current: ToolVersion,
        source: ReleaseSource,
        stamp: UpdateStamp,
        installer: BinaryInstaller,
    ) -> Self {
        Self {
            current,
            source,
            stamp,
            installer,
        }
    }

    /// Coordinator for the running executable with the default release source.
    pub fn for_current_exe() -> Result<Self> {
        Ok(Self::new(
            ToolVersion::current(),
            ReleaseSource::default(),
            UpdateStamp::in_cache_dir(),
            BinaryInstaller::current_exe()?,
        ))
    }

    pub fn stamp(&self) -> &UpdateStamp {
        &self.stamp
    }

    /// Decide between [`UpdateState::Skip`] and [`UpdateState::DueForCheck`].
    pub fn evaluate(
        &self,
        config: &ResolvedConfig,
        request: UpdateRequest,
        now: DateTime<Utc>,
    ) -> UpdateState {
        match request {
            UpdateRequest::Disable => {
                tracing::debug!("Auto update is force disabled. Bypassing update version check.");
                UpdateState::Skip
            }
            UpdateRequest::Force => {
                tracing::debug!(local = self.current.is_local_build(), "Auto update is forced. Checking version...");
                UpdateState::DueForCheck
            }
            UpdateRequest::Auto if !config.auto_update => {
                tracing::debug!("Auto update is disabled in the config. Bypassing update version check.");
                UpdateState::Skip
            }
            UpdateRequest::Auto => {
                let recent = self
                    .stamp
                    .elapsed(now)
                    .is_some_and(|elapsed| elapsed < config.auto_update_delay);
                if recent {
                    tracing::debug!(
                        delay = ?config.auto_update_delay,
                        "Update checked recently. Bypassing update version check."
                    );
                    UpdateState::Skip
                } else if self.current.is_local_build() {
                    tracing::debug!("Running a local build. Bypassing update version check.");
                    UpdateState::Skip
                } else {
                    tracing::debug!("An update is due. Checking version...");
                    UpdateState::DueForCheck
                }
            }
        }
    }

    /// Version of the running binary; local builds compare as `0.0.0`.
    pub fn current_version(&self) -> Result<Version> {
        if self.current.is_local_build() {
            return Ok(Version::new(0, 0, 0));
        }
        parse_release_version(self.current.as_str())
    }

    /// Latest release, honouring a pinned `update-version`.
    pub fn check_latest(&self, config: &ResolvedConfig) -> Result<Version> {
        self.source.latest_version(config.update_version.as_deref())
    }

    /// Download and install `version`.
    ///
    /// Returns [`UpdateState::RolledBack`] when installation failed but the
    /// previous binary was restored; a failed restore is an error.
    pub fn apply(&self, version: &Version) -> Result<UpdateState> {
        let updating = UpdateState::Updating {
            version: version.clone(),
        };
        tracing::debug!(state = ?updating, binary = %self.installer.target().display(), "Applying update");

        let url = self.source.artifact_url(version);
        let artifact = self.source.download(&url)?;
        let payload = extract_payload(artifact.as_slice())?
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::EmptyArtifact { url: url.clone() })?;

        match self.installer.install(&payload) {
            Ok(()) => Ok(UpdateState::Applied {
                version: version.clone(),
            }),
            Err(Error::Install { cause, .. }) => Ok(UpdateState::RolledBack {
                version: version.clone(),
                cause,
            }),
            Err(e) => Err(e),
        }
    }

    /// Run one full cycle: evaluate, check, then apply when newer.
    pub fn run(
        &self,
        config: &ResolvedConfig,
        request: UpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<UpdateState> {
        if self.evaluate(config, request, now) == UpdateState::Skip {
            return Ok(UpdateState::Skip);
        }

        let latest = self.check_latest(config)?;
        let current = self.current_version()?;
        if latest <= current {
            tracing::debug!(%current, %latest, "Already running the latest version");
            self.stamp.touch(now)?;
            return Ok(UpdateState::Skip);
        }

        tracing::info!("Updating dockhand from {current} to {latest}");
        let state = self.apply(&latest)?;
        if matches!(state, UpdateState::Applied { .. }) {
            self.stamp.touch(now)?;
        }
        Ok(state)
    }
}
