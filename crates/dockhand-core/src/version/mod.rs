//! Version checks against configured ranges
//!
//! [`check_version_range`] is the single entry point used by the validator:
//! it pads `major.minor` versions so an omitted patch never causes a
//! mismatch, then evaluates a [`VersionRange`].

mod range;
mod validator;

pub use range::{RangeError, VersionRange};
pub use validator::{ToolVersion, VersionFinding, enforce, validate};

use semver::Version;

use crate::{Error, Result};

/// Patch component appended to `major.minor` versions.
const PARTIAL_VERSION_PATCH: &str = "9999";

/// Parse a version for range checks.
///
/// `1.2` becomes `1.2.9999`: when the patch is omitted any patch of that
/// minor release is acceptable.
pub fn parse_checked_version(version: &str) -> Result<Version> {
    let padded = if version.matches('.').count() == 1 {
        format!("{version}.{PARTIAL_VERSION_PATCH}")
    } else {
        version.to_string()
    };
    Version::parse(&padded).map_err(|e| Error::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Check `version` against the range expression `range`.
///
/// `field` names the configuration key in errors.
pub fn check_version_range(version: &str, range: &str, field: &str) -> Result<bool> {
    let parsed_range = VersionRange::parse(range).map_err(|e| Error::InvalidRange {
        field: field.to_string(),
        range: range.to_string(),
        reason: e.to_string(),
    })?;
    let version = parse_checked_version(version)?;
    Ok(parsed_range.contains(&version))
}
