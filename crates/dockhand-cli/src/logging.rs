//! Log subscriber with a level that can change after configuration loads
//!
//! The initial level comes from the command line or `DOCKHAND_LOG`. When
//! neither is set, the resolved `logging-level` replaces the default once
//! configuration resolution is done.

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::error::{CliError, Result};

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "DOCKHAND_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Map a dockhand level name to a tracing filter directive.
pub fn level_directive(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "critical" | "error" => Some("error"),
        "warning" | "warn" => Some("warn"),
        "notice" | "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" | "full" => Some("trace"),
        _ => None,
    }
}

pub struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    /// The level was chosen explicitly and configuration must not change it
    pinned: bool,
}

impl Logging {
    /// Install the global subscriber, writing to stderr.
    pub fn init(requested: Option<&str>) -> Result<Self> {
        let (filter, pinned) = match requested {
            Some(level) => {
                let directive = level_directive(level).ok_or_else(|| {
                    CliError::user(format!("Unknown log level `{level}`"))
                })?;
                (EnvFilter::new(directive), true)
            }
            None => match EnvFilter::try_from_env(LOG_ENV) {
                Ok(filter) => (filter, true),
                Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVE), false),
            },
        };

        let (filter_layer, handle) = reload::Layer::new(filter);
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| CliError::Logging(e.to_string()))?;

        Ok(Self { handle, pinned })
    }

    /// Apply the configured `logging-level` unless the level was pinned.
    pub fn apply_config_level(&self, level: &str) -> Result<()> {
        if self.pinned {
            return Ok(());
        }
        let Some(directive) = level_directive(level) else {
            tracing::warn!("Unknown logging-level `{level}` in configuration, keeping {DEFAULT_DIRECTIVE}");
            return Ok(());
        };
        self.handle
            .modify(|filter| *filter = EnvFilter::new(directive))
            .map_err(|e| CliError::Logging(e.to_string()))?;
        tracing::debug!(level = directive, "Log level set from configuration");
        Ok(())
    }
}
