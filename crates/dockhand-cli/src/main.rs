//! dockhand CLI
//!
//! Resolves layered configuration for the current directory, keeps the
//! binary up to date and prints the launch plan for the container.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::Cli;
use error::Result;
use logging::Logging;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let logging = Logging::init(cli.requested_log_level())?;

    if cli.config_keys {
        commands::run_config_keys();
        return Ok(0);
    }

    let cwd = std::env::current_dir()?;
    let config = commands::resolve(&cli, &cwd, &logging)?;

    if cli.config_dump {
        commands::run_config_dump(&config)?;
        return Ok(0);
    }

    if let Some(code) = commands::run_update(&config, cli.update_request())? {
        return Ok(code);
    }

    commands::run_launch(&config, &cli.args)?;
    Ok(0)
}
