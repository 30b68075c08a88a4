//! Configuration layers and where they came from

use std::fmt;
use std::path::{Path, PathBuf};

/// Where a layer's text was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerOrigin {
    /// A file fetched from the remote configuration location
    Remote { url: String },
    /// Values synthesized from the parameter store
    ParameterStore { path: String },
    /// A configuration file in the working directory's ancestor chain
    File { path: PathBuf },
}

impl LayerOrigin {
    /// Directory relative build folders are resolved against.
    ///
    /// Local files resolve against their own directory; remote and
    /// parameter-store layers resolve against `cwd`.
    pub fn base_dir(&self, cwd: &Path) -> PathBuf {
        match self {
            Self::File { path } => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf()),
            Self::Remote { .. } | Self::ParameterStore { .. } => cwd.to_path_buf(),
        }
    }
}

impl fmt::Display for LayerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { url } => write!(f, "{url}"),
            Self::ParameterStore { path } => write!(f, "parameter-store:{path}"),
            Self::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// One configuration source: its origin plus raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub origin: LayerOrigin,
    pub content: String,
}

impl ConfigLayer {
    pub fn new(origin: LayerOrigin, content: impl Into<String>) -> Self {
        Self {
            origin,
            content: content.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(LayerOrigin::File { path: path.into() }, content)
    }

    pub fn remote(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(LayerOrigin::Remote { url: url.into() }, content)
    }

    pub fn parameter_store(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(LayerOrigin::ParameterStore { path: path.into() }, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layers_resolve_against_their_directory() {
        let origin = LayerOrigin::File {
            path: PathBuf::from("/work/project/.dockhand.config"),
        };
        assert_eq!(
            origin.base_dir(Path::new("/elsewhere")),
            PathBuf::from("/work/project")
        );
    }

    #[test]
    fn remote_layers_resolve_against_cwd() {
        let cwd = Path::new("/work/project");
        assert_eq!(
            LayerOrigin::Remote {
                url: "https://example.com/DockhandConfig".into()
            }
            .base_dir(cwd),
            cwd
        );
        assert_eq!(
            LayerOrigin::ParameterStore {
                path: "/default/dockhand".into()
            }
            .base_dir(cwd),
            cwd
        );
    }

    #[test]
    fn display_names_the_source() {
        let origin = LayerOrigin::ParameterStore {
            path: "/default/dockhand".into(),
        };
        assert_eq!(origin.to_string(), "parameter-store:/default/dockhand");
    }
}
