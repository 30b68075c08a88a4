//! Credential session types and the backend seam

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::Result;

/// Temporary or long-lived cloud credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    /// `None` for credentials that never expire (static access keys)
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A resolved credential session: credentials plus the region they apply to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSession {
    pub credentials: Credentials,
    pub region: Option<String>,
}

impl CredentialSession {
    pub fn new(credentials: Credentials, region: Option<String>) -> Self {
        Self {
            credentials,
            region,
        }
    }

    /// Lifetime left at `now`; `None` when the credentials do not expire.
    ///
    /// Already-expired sessions report a zero duration.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.credentials
            .expires_at
            .map(|expires| (expires - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Environment variables a launched container inherits from this session.
    ///
    /// Variables without a value (no session token, unknown region) are omitted.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        [
            ("AWS_ACCESS_KEY_ID", Some(&self.credentials.access_key_id)),
            ("AWS_SECRET_ACCESS_KEY", Some(&self.credentials.secret_access_key)),
            ("AWS_SESSION_TOKEN", self.credentials.session_token.as_ref()),
            ("AWS_REGION", self.region.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.clone()))
        })
        .collect()
    }
}

/// A single parameter-store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Full parameter name including the path prefix
    pub name: String,
    pub value: String,
}

/// Access to the cloud provider.
///
/// Every call is blocking. Implementations must not cache; caching is the
/// job of [`crate::SessionManager`].
pub trait CloudBackend: Send + Sync {
    /// Resolve credentials through the provider's credential chain.
    ///
    /// `duration` requests a specific assume-role session lifetime.
    fn resolve(&self, profile: Option<&str>, duration: Option<Duration>)
    -> Result<CredentialSession>;

    /// ARN of the identity behind `session`.
    fn caller_arn(&self, session: &CredentialSession) -> Result<String>;

    /// Maximum session duration configured on an IAM role.
    fn role_max_session_duration(
        &self,
        session: &CredentialSession,
        role_name: &str,
    ) -> Result<Duration>;

    /// All parameters under `path`, recursively, with values decrypted.
    fn parameters_by_path(&self, session: &CredentialSession, path: &str)
    -> Result<Vec<Parameter>>;
}
