//! Filesystem layer for dockhand
//!
//! Provides configuration file discovery along the ancestor chain of a
//! working directory, atomic writes, and timestamp fingerprinting of
//! build-context trees.

pub mod constants;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod io;

pub use constants::ConfigFile;
pub use discovery::{canonical_dir, find_config_files};
pub use error::{Error, Result};
pub use fingerprint::TreeFingerprint;
