//! Configuration resolution engine for dockhand
//!
//! This crate turns a working directory, command-line overrides and any
//! number of remote, parameter-store and local configuration sources into
//! one [`ResolvedConfig`]:
//!
//! - **Layer merge**: scalar replacement, key-wise map merge, and
//!   accumulation of build specs and run hooks
//! - **Version validation**: semantic-version range checks classified as
//!   warnings or fatal mismatches
//! - **Build tags**: timestamp-sensitive fingerprints for custom image layers
//! - **Aliases**: recursive rewriting of the leading argument
//!
//! # Architecture
//!
//! ```text
//!                 dockhand-cli
//!                /            \
//!       dockhand-core    dockhand-update
//!          /       \            |
//!   dockhand-fs  dockhand-cloud  dockhand-fs
//! ```

pub mod alias;
pub mod build;
pub mod config;
pub mod error;
pub mod image;
pub mod launch;
pub mod source;
pub mod version;

pub use alias::expand_aliases;
pub use build::{BUILD_DESCRIPTOR_PATTERN, BuildSpec};
pub use config::{
    ConfigLayer, ConfigResolver, FIELDS, LayerOrigin, Overrides, ResolveOptions, ResolvedConfig,
};
pub use error::{Error, Result};
pub use image::compose_image_name;
pub use launch::{LaunchPlan, PlannedBuild};
pub use version::{ToolVersion, VersionFinding, check_version_range};
