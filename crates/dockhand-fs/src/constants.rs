//! Well-known configuration file names.

use std::path::Path;

/// Configuration files looked up at every level of the ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    /// Per-user overrides, usually kept out of version control
    User,
    /// Project configuration shared with the team
    Project,
}

impl ConfigFile {
    /// Get the file name on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "dockhand.user.config",
            Self::Project => ".dockhand.config",
        }
    }

    /// Files to look for in a single directory, in precedence order (lowest first).
    pub fn lookup_order(include_user: bool) -> &'static [ConfigFile] {
        if include_user {
            &[ConfigFile::User, ConfigFile::Project]
        } else {
            &[ConfigFile::Project]
        }
    }
}

impl AsRef<Path> for ConfigFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl std::fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
