//! Credential session manager
//!
//! Resolves one credential session per resolver and caches it. Sessions that
//! expire within the hour are renegotiated with the role's maximum duration
//! when possible; if that fails the short session is kept.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use regex::Regex;

use crate::parameters::relative_key;
use crate::{CloudBackend, CredentialSession, Result};

/// Sessions with less lifetime than this are renegotiated.
pub const MIN_SESSION_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Duration assumed when the role's maximum cannot be determined.
pub const FALLBACK_ROLE_DURATION: Duration = Duration::from_secs(60 * 60);

/// Profile-selection variables cleared before exporting credentials.
const PROFILE_VARS: &[&str] = &["AWS_PROFILE", "AWS_DEFAULT_PROFILE"];

/// Caches a single credential session for the lifetime of a resolver.
pub struct SessionManager {
    backend: Box<dyn CloudBackend>,
    profile: Option<String>,
    export_env: bool,
    cached: Mutex<Option<CredentialSession>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("profile", &self.profile)
            .field("export_env", &self.export_env)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager for `profile` (or the default credential chain).
    pub fn new(backend: impl CloudBackend + 'static, profile: Option<String>) -> Self {
        Self {
            backend: Box::new(backend),
            profile: profile.filter(|p| !p.is_empty()),
            export_env: true,
            cached: Mutex::new(None),
        }
    }

    /// Keep resolved credentials out of the process environment.
    pub fn without_env_export(mut self) -> Self {
        self.export_env = false;
        self
    }

    /// The cached session, if one has been acquired.
    pub fn current(&self) -> Option<CredentialSession> {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the process session, resolving it on first use.
    ///
    /// `requested` is the assume-role duration for the first resolution; it
    /// is ignored once a session is cached.
    pub fn acquire(&self, requested: Option<Duration>) -> Result<CredentialSession> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = cached.as_ref() {
            tracing::debug!("Using cached credential session");
            return Ok(session.clone());
        }

        self.warn_conflicting_env();
        tracing::debug!(profile = ?self.profile, ?requested, "Resolving credential session");
        let session = self.backend.resolve(self.profile.as_deref(), requested)?;
        let session = self.extend_if_short_lived(session);

        if self.export_env {
            export_to_process_env(&session);
        }

        tracing::debug!("Caching credential session for future calls");
        *cached = Some(session.clone());
        Ok(session)
    }

    /// Read every parameter under `path`, keyed relative to `path`.
    ///
    /// Any failure is logged and yields an empty mapping.
    pub fn read_parameters(&self, path: &str) -> BTreeMap<String, String> {
        let session = match self.acquire(None) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Caught an error while creating a cloud session: {e}");
                return BTreeMap::new();
            }
        };

        tracing::debug!(path, region = ?session.region, "Reading configuration from parameter store");
        match self.backend.parameters_by_path(&session, path) {
            Ok(parameters) => parameters
                .into_iter()
                .map(|p| (relative_key(path, &p.name), p.value))
                .collect(),
            Err(e) => {
                tracing::warn!("Caught an error while reading from `{path}` in parameter store: {e}");
                BTreeMap::new()
            }
        }
    }

    fn extend_if_short_lived(&self, session: CredentialSession) -> CredentialSession {
        let Some(remaining) = session.remaining(Utc::now()) else {
            return session;
        };
        if remaining >= MIN_SESSION_LIFETIME {
            return session;
        }

        let extended = self.max_assume_role_duration(&session);
        tracing::warn!(
            "Credentials for the current session expire in less than one hour ({}s). Will extend to {}s.",
            remaining.as_secs(),
            extended.as_secs()
        );
        tracing::warn!(
            "You should consider defining duration_seconds = {} in your AWS config profile {}",
            extended.as_secs(),
            self.display_profile()
        );

        match self.backend.resolve(self.profile.as_deref(), Some(extended)) {
            Ok(longer) => longer,
            Err(e) => {
                tracing::warn!("Failed to extend the current session, keeping the short one: {e}");
                session
            }
        }
    }

    /// Maximum assume-role duration for the identity behind `session`.
    fn max_assume_role_duration(&self, session: &CredentialSession) -> Duration {
        tracing::debug!(
            fallback = FALLBACK_ROLE_DURATION.as_secs(),
            "Looking up maximum assume-role duration"
        );

        let arn = match self.backend.caller_arn(session) {
            Ok(arn) => arn,
            Err(e) => {
                tracing::debug!("Caller identity lookup failed, using fallback: {e}");
                return FALLBACK_ROLE_DURATION;
            }
        };

        let Some(role) = assumed_role_name(&arn) else {
            tracing::debug!(%arn, "Current identity is not an assumed role, using fallback");
            return FALLBACK_ROLE_DURATION;
        };

        match self.backend.role_max_session_duration(session, &role) {
            Ok(duration) => {
                tracing::debug!(%role, seconds = duration.as_secs(), "Found role maximum duration");
                duration
            }
            Err(e) => {
                tracing::debug!("Role lookup failed, using fallback: {e}");
                FALLBACK_ROLE_DURATION
            }
        }
    }

    fn display_profile(&self) -> String {
        if let Some(profile) = &self.profile {
            return profile.clone();
        }
        match std::env::var("AWS_PROFILE") {
            Ok(profile) if !profile.is_empty() => profile,
            _ => "default".to_string(),
        }
    }

    fn warn_conflicting_env(&self) {
        let set = |key: &str| std::env::var(key).is_ok_and(|v| !v.is_empty());
        if self.profile.is_none() && set("AWS_ACCESS_KEY_ID") && set("AWS_PROFILE") {
            tracing::warn!("You set both AWS_ACCESS_KEY_ID and AWS_PROFILE, AWS_PROFILE will be ignored");
        }
    }
}

/// Extract the role name from an `...:assumed-role/<role>/<session>` ARN.
pub fn assumed_role_name(arn: &str) -> Option<String> {
    let pattern = Regex::new(r".*:assumed-role/(.*)/.*").ok()?;
    pattern
        .captures(arn)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn export_to_process_env(session: &CredentialSession) {
    // SAFETY: configuration resolution runs on the main thread before any
    // other thread is spawned, so no concurrent environment access exists.
    unsafe {
        for key in PROFILE_VARS {
            std::env::remove_var(key);
        }
        for (key, value) in session.env_vars() {
            std::env::set_var(key, value);
        }
    }
}
