//! Self-update for the dockhand binary
//!
//! The [`UpdateCoordinator`] decides whether a release check is due, asks
//! the [`ReleaseSource`] for the latest version and lets the
//! [`BinaryInstaller`] swap the running executable, restoring the previous
//! binary when the swap fails.

pub mod coordinator;
pub mod error;
pub mod install;
pub mod release;
pub mod stamp;

pub use coordinator::{UpdateCoordinator, UpdateRequest, UpdateState};
pub use error::{Error, Result};
pub use install::{BinaryInstaller, extract_payload};
pub use release::{ReleaseSource, parse_release_version};
pub use stamp::UpdateStamp;
