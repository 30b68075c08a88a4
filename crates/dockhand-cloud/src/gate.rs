//! Cloud-context gate
//!
//! Decides once per resolver whether the environment looks cloud-configured
//! enough to try a credential session. The check runs before any network call
//! so local-only invocations never wait on metadata endpoints.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variables whose presence marks a cloud context.
pub const GATE_ENV_VARS: &[&str] = &[
    "AWS_PROFILE",
    "AWS_ACCESS_KEY_ID",
    "AWS_CONFIG_FILE",
    "DOCKHAND_USE_AWS_CONFIG",
];

/// Name of the cloud CLI binary looked up on `PATH`.
pub const CLOUD_CLI: &str = "aws";

/// Credentials directory under the user's home.
pub const CREDENTIALS_DIR: &str = ".aws";

/// The parts of the process environment the gate inspects.
pub trait CloudEnvironment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
    fn on_path(&self, program: &str) -> bool;
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl CloudEnvironment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn on_path(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// Memoized cloud-context decision.
pub struct CloudContextGate {
    enabled: bool,
    environment: Box<dyn CloudEnvironment>,
    decision: OnceLock<bool>,
}

impl std::fmt::Debug for CloudContextGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudContextGate")
            .field("enabled", &self.enabled)
            .field("decision", &self.decision.get())
            .finish()
    }
}

impl CloudContextGate {
    /// Gate over the real process environment.
    ///
    /// When `enabled` is false the gate always answers `false`.
    pub fn new(enabled: bool) -> Self {
        Self::with_environment(enabled, SystemEnvironment)
    }

    pub fn with_environment(enabled: bool, environment: impl CloudEnvironment + 'static) -> Self {
        Self {
            enabled,
            environment: Box::new(environment),
            decision: OnceLock::new(),
        }
    }

    /// Whether cloud sources should be consulted.
    ///
    /// Computed on first call; later calls return the same answer even if the
    /// environment has changed since.
    pub fn is_cloud_context(&self) -> bool {
        *self.decision.get_or_init(|| self.evaluate())
    }

    fn evaluate(&self) -> bool {
        if !self.enabled {
            tracing::debug!("Not reading configuration from AWS, it is disabled");
            return false;
        }

        tracing::debug!("Checking whether configuration should be read from AWS");

        let env_present = GATE_ENV_VARS
            .iter()
            .any(|key| self.environment.var(key).is_some_and(|v| !v.is_empty()));
        tracing::debug!(env_present, vars = ?GATE_ENV_VARS, "Cloud identity variables");
        if env_present {
            return true;
        }

        let cli_installed = self.environment.on_path(CLOUD_CLI);
        tracing::debug!(cli_installed, "Cloud CLI on PATH");
        if cli_installed {
            return true;
        }

        let dir_exists = self
            .environment
            .home_dir()
            .map(|home| home.join(CREDENTIALS_DIR).is_dir())
            .unwrap_or(false);
        tracing::debug!(dir_exists, "Cloud credentials directory");
        dir_exists
    }
}
