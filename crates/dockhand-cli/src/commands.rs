//! Command implementations

use std::path::Path;
use std::process::Command;

use chrono::Utc;
use colored::Colorize;
use dockhand_core::{ConfigResolver, FIELDS, LaunchPlan, ResolvedConfig, ToolVersion};
use dockhand_update::{UpdateCoordinator, UpdateRequest, UpdateState};

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::logging::Logging;

/// Print every configuration key with its description.
pub fn run_config_keys() {
    println!("{}", "Configuration keys".bold());
    println!();
    let width = FIELDS.iter().map(|f| f.key.len()).max().unwrap_or(0);
    for field in FIELDS {
        println!("  {:<width$}  {}", field.key.green(), field.description);
    }
}

/// Resolve and validate configuration for `cwd`.
pub fn resolve(cli: &Cli, cwd: &Path, logging: &Logging) -> Result<ResolvedConfig> {
    let resolver = ConfigResolver::for_dir(cwd, cli.resolve_options())?;
    let config = resolver.resolve_validated(&ToolVersion::current())?;
    logging.apply_config_level(&config.log_level)?;
    tracing::debug!(sources = ?config.sources, "Configuration resolved");
    Ok(config)
}

pub fn run_config_dump(config: &ResolvedConfig) -> Result<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}

/// Run an update cycle. Returns the exit code of the restarted binary when
/// an update was applied.
pub fn run_update(config: &ResolvedConfig, request: UpdateRequest) -> Result<Option<i32>> {
    if request == UpdateRequest::Disable {
        return Ok(None);
    }

    let coordinator = UpdateCoordinator::for_current_exe()?;
    let state = match coordinator.run(config, request, Utc::now()) {
        Ok(state) => state,
        Err(e @ dockhand_update::Error::ReleaseQuery { .. }) => {
            tracing::warn!("Unable to check for a newer dockhand release: {e}");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    match state {
        UpdateState::Applied { version } => {
            println!("{} dockhand {version}", "Updated to".green().bold());
            restart().map(Some)
        }
        UpdateState::RolledBack { version, cause } => Err(CliError::user(format!(
            "Update to {version} failed and the previous version was restored: {cause}"
        ))),
        _ => Ok(None),
    }
}

pub fn run_launch(config: &ResolvedConfig, args: &[String]) -> Result<()> {
    let plan = LaunchPlan::new(config, args)?;
    for build in &plan.builds {
        tracing::info!(image = %build.image, context = %build.context.display(), "Custom image layer");
    }
    print!("{}", plan.to_yaml()?);
    Ok(())
}

/// Re-run the freshly installed binary with the same arguments.
fn restart() -> Result<i32> {
    let exe = std::env::current_exe()?;
    let status = Command::new(exe)
        .args(std::env::args_os().skip(1))
        .status()?;
    Ok(status.code().unwrap_or(1))
}
