//! Error types for dockhand-core

/// Result type for dockhand-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dockhand-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration layer could not be parsed in any supported format
    #[error("Unable to parse configuration from {origin}, it must be valid YAML, JSON or TOML\n{reason}")]
    LayerParse { origin: String, reason: String },

    /// A remote configuration file could not be fetched
    #[error("Unable to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A version range in the configuration is malformed
    #[error("Invalid version range `{range}` in {field}: {reason}")]
    InvalidRange {
        field: String,
        range: String,
        reason: String,
    },

    /// A version string could not be parsed
    #[error("Invalid version `{version}`: {reason}")]
    InvalidVersion { version: String, reason: String },

    /// The image version does not satisfy `required-image-version`
    #[error("Image {image} does not meet the required version range {range}")]
    ImageVersionMismatch { image: String, range: String },

    /// Alias expansion revisited an alias already on the chain
    #[error("Alias cycle detected: {}", chain.join(" -> "))]
    AliasCycle { chain: Vec<String> },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from dockhand-fs
    #[error(transparent)]
    Fs(#[from] dockhand_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
