//! Error types for dockhand-cloud

/// Result type for dockhand-cloud operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the cloud provider
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cloud CLI could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The cloud CLI exited with a failure status
    #[error("`{command}` failed with exit code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Output from the cloud CLI could not be understood
    #[error("unexpected response from {what}: {message}")]
    Response { what: String, message: String },

    /// No credentials could be found in the credential chain
    #[error("no credentials available{}", profile.as_ref().map(|p| format!(" for profile {p}")).unwrap_or_default())]
    NoCredentials { profile: Option<String> },
}
