//! Cloud integration for dockhand
//!
//! This crate decides whether the current environment looks cloud-configured,
//! establishes one credential session per resolver, and reads the parameter
//! store. All cloud access goes through the [`CloudBackend`] trait; the
//! shipped [`AwsCliBackend`] drives the `aws` command-line tool.

pub mod aws_cli;
pub mod backend;
pub mod error;
pub mod gate;
pub mod parameters;
pub mod session;

pub use aws_cli::AwsCliBackend;
pub use backend::{CloudBackend, CredentialSession, Credentials, Parameter};
pub use error::{Error, Result};
pub use gate::{CloudContextGate, CloudEnvironment, SystemEnvironment};
pub use parameters::{
    CONFIG_LOCATION_KEY, CONFIG_PATHS_KEY, DEFAULT_PARAMETER_PATH, synthesize_config,
};
pub use session::SessionManager;
