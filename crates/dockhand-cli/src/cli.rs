//! CLI argument parsing using clap derive

use clap::Parser;
use dockhand_cloud::DEFAULT_PARAMETER_PATH;
use dockhand_core::config::{Overrides, ResolveOptions};
use dockhand_update::UpdateRequest;

/// dockhand - run your infrastructure tooling inside a managed container
///
/// Configuration is read from `dockhand.user.config` and `.dockhand.config`
/// files in every directory from the filesystem root down to the current
/// directory, after any remote or parameter-store configuration.
#[derive(Parser, Debug)]
#[command(name = "dockhand")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Use the specified image instead of the configured one
    #[arg(long, short = 'i', value_name = "IMAGE")]
    pub image: Option<String>,

    /// Use a specific version of the image
    #[arg(long, value_name = "VERSION")]
    pub image_version: Option<String>,

    /// Use a specific tag of the image
    #[arg(long, short = 't', value_name = "TAG")]
    pub tag: Option<String>,

    /// Override the entry point of the container
    #[arg(long = "entrypoint", short = 'E', value_name = "PROGRAM")]
    pub entry_point: Option<String>,

    /// Ignore all dockhand.user.config files
    #[arg(long)]
    pub no_user_config: bool,

    /// Do not use AWS sessions or the parameter store
    #[arg(long = "no-aws")]
    pub no_aws: bool,

    /// Parameter store path holding shared configuration
    #[arg(long = "ps-path", env = "DOCKHAND_SSM_PATH", value_name = "PATH", default_value = DEFAULT_PARAMETER_PATH)]
    pub parameter_path: String,

    /// Colon-separated list of remote configuration file names
    #[arg(long, env = "DOCKHAND_CONFIG_FILES", value_name = "FILES")]
    pub config_files: Option<String>,

    /// Location of remote configuration files
    #[arg(long, env = "DOCKHAND_CONFIG_LOCATION", value_name = "URL")]
    pub config_location: Option<String>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub config_dump: bool,

    /// List the keys a configuration file may set and exit
    #[arg(long)]
    pub config_keys: bool,

    /// Check for a newer dockhand release now
    #[arg(long)]
    pub update: bool,

    /// Never check for a newer dockhand release
    #[arg(long)]
    pub no_update: bool,

    /// AWS profile used for the cloud session
    #[arg(long, value_name = "PROFILE")]
    pub aws_profile: Option<String>,

    /// Log level (critical, error, warning, notice, info, debug, trace)
    #[arg(long, short = 'L', value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Arguments passed to the entry point
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            image: self.image.clone(),
            image_version: self.image_version.clone(),
            image_tag: self.tag.clone(),
            entry_point: self.entry_point.clone(),
        }
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            overrides: self.overrides(),
            include_user_config: !self.no_user_config,
            use_cloud: !self.no_aws,
            parameter_path: self.parameter_path.clone(),
            config_files: self.config_files.clone(),
            config_location: self.config_location.clone(),
            config_dump: self.config_dump,
            aws_profile: self.aws_profile.clone(),
        }
    }

    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest::from_flags(self.update, self.no_update)
    }

    /// Level requested on the command line; `--log-level` wins over `-v`.
    pub fn requested_log_level(&self) -> Option<&str> {
        match (&self.log_level, self.verbose) {
            (Some(level), _) => Some(level),
            (None, true) => Some("debug"),
            (None, false) => None,
        }
    }
}
