//! Command-line inputs to resolution

use dockhand_cloud::DEFAULT_PARAMETER_PATH;

use super::ResolvedConfig;

/// Values forced on the command line; they win over every layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub image: Option<String>,
    pub image_version: Option<String>,
    pub image_tag: Option<String>,
    pub entry_point: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut ResolvedConfig) {
        if let Some(image) = &self.image {
            config.image.clone_from(image);
        }
        if self.image_version.is_some() {
            config.image_version.clone_from(&self.image_version);
        }
        if self.image_tag.is_some() {
            config.image_tag.clone_from(&self.image_tag);
        }
        if let Some(entry_point) = &self.entry_point {
            config.entry_point.clone_from(entry_point);
        }
    }

    /// Whether the image version was pinned on the command line.
    ///
    /// A pinned version downgrades a required-range mismatch to a warning.
    pub fn image_version_forced(&self) -> bool {
        self.image_version.is_some()
    }
}

/// Everything that shapes a resolution pass apart from the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub overrides: Overrides,
    /// Read `dockhand.user.config` files
    pub include_user_config: bool,
    /// Allow credential sessions and the parameter store
    pub use_cloud: bool,
    /// Parameter-store path holding shared settings
    pub parameter_path: String,
    /// Colon-separated remote file names
    pub config_files: Option<String>,
    /// Remote configuration location
    pub config_location: Option<String>,
    /// Keep credentials out of the resolved environment
    pub config_dump: bool,
    pub aws_profile: Option<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            overrides: Overrides::default(),
            include_user_config: true,
            use_cloud: true,
            parameter_path: DEFAULT_PARAMETER_PATH.to_string(),
            config_files: None,
            config_location: None,
            config_dump: false,
            aws_profile: None,
        }
    }
}
