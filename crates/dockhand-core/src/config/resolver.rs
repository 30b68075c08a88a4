//! Configuration resolution
//!
//! The `ConfigResolver` owns the cloud gate and credential session for one
//! resolution pass and assembles the layers in precedence order:
//!
//! 1. Remote files from the configured (or parameter-store provided) location
//! 2. The parameter-store aggregate, only when no remote file was found
//! 3. Local files from the filesystem root down to the working directory
//!
//! Command-line overrides are applied last.

use std::path::{Path, PathBuf};

use dockhand_cloud::{
    AwsCliBackend, CONFIG_LOCATION_KEY, CONFIG_PATHS_KEY, CloudContextGate, SessionManager,
    synthesize_config,
};

use super::{ConfigLayer, ResolveOptions, ResolvedConfig, merge_layers};
use crate::Result;
use crate::source::{RemoteFetcher, load_local_layers};
use crate::version::{ToolVersion, enforce, validate};

/// Resolves the effective configuration for a working directory.
#[derive(Debug)]
pub struct ConfigResolver {
    cwd: PathBuf,
    options: ResolveOptions,
    gate: CloudContextGate,
    sessions: SessionManager,
    fetcher: RemoteFetcher,
}

impl ConfigResolver {
    /// Resolver using the real environment and the `aws` CLI backend.
    pub fn new(cwd: impl Into<PathBuf>, options: ResolveOptions) -> Self {
        let gate = CloudContextGate::new(options.use_cloud);
        let sessions = SessionManager::new(AwsCliBackend::new(), options.aws_profile.clone());
        Self::with_cloud(cwd, options, gate, sessions)
    }

    /// [`new`](Self::new) for a working directory that must exist.
    ///
    /// The directory is canonicalized so relative config locations and build
    /// folders resolve against the real path.
    pub fn for_dir(cwd: &Path, options: ResolveOptions) -> Result<Self> {
        let cwd = dockhand_fs::canonical_dir(cwd)?;
        Ok(Self::new(cwd, options))
    }

    /// Resolver with an explicit gate and session manager.
    pub fn with_cloud(
        cwd: impl Into<PathBuf>,
        options: ResolveOptions,
        gate: CloudContextGate,
        sessions: SessionManager,
    ) -> Self {
        let cwd = cwd.into();
        Self {
            fetcher: RemoteFetcher::new(&cwd),
            cwd,
            options,
            gate,
            sessions,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Collect and merge every layer, then apply command-line overrides.
    ///
    /// Source failures only degrade the result; they never abort.
    pub fn resolve(&self) -> ResolvedConfig {
        let mut config = ResolvedConfig::default();
        let mut location = self.options.config_location.clone();
        let mut files = self.options.config_files.clone();

        let cloud = self.gate.is_cloud_context() && self.start_session(&mut config);
        if cloud && location.is_none() {
            let values = self.sessions.read_parameters(&self.options.parameter_path);
            location = values.get(CONFIG_LOCATION_KEY).cloned();
            if files.is_none() {
                files = values.get(CONFIG_PATHS_KEY).cloned();
            }
        }

        let mut layers = self.fetcher.fetch(location.as_deref(), files.as_deref());
        if cloud && layers.is_empty() {
            if let Some(layer) = self.parameter_store_layer() {
                layers.push(layer);
            }
        }
        layers.extend(load_local_layers(&self.cwd, self.options.include_user_config));

        tracing::debug!(count = layers.len(), "Merging configuration layers");
        let mut config = merge_layers(config, &layers, &self.cwd);
        self.options.overrides.apply(&mut config);
        config
    }

    /// [`resolve`](Self::resolve), then abort on fatal version findings.
    pub fn resolve_validated(&self, tool: &ToolVersion) -> Result<ResolvedConfig> {
        let config = self.resolve();
        enforce(
            validate(&config, tool),
            self.options.overrides.image_version_forced(),
        )?;
        Ok(config)
    }

    /// Acquire the session and seed its variables into `environment`.
    ///
    /// Returns false when no session could be established.
    fn start_session(&self, config: &mut ResolvedConfig) -> bool {
        let session = match self.sessions.acquire(None) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Unable to establish a cloud session, cloud configuration skipped: {e}");
                return false;
            }
        };
        if !self.options.config_dump {
            for (key, value) in session.env_vars() {
                config.environment.insert(key.to_string(), value);
            }
        }
        true
    }

    fn parameter_store_layer(&self) -> Option<ConfigLayer> {
        let path = &self.options.parameter_path;
        let text = synthesize_config(&self.sessions.read_parameters(path));
        if text.is_empty() {
            return None;
        }
        Some(ConfigLayer::parameter_store(path.clone(), text))
    }
}
