//! Version validation of a resolved configuration

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use super::check_version_range;
use crate::config::ResolvedConfig;
use crate::{Error, Result};

/// Version reported by binaries built outside the release pipeline.
pub const LOCAL_BUILD: &str = "(local build)";

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(\.\d+)?").expect("Invalid version regex"));

static REGISTRY_PORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*:\d+/").expect("Invalid registry port regex"));

/// Version of the running dockhand binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion(String);

impl ToolVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn local() -> Self {
        Self(LOCAL_BUILD.to_string())
    }

    /// Version stamped at build time through `DOCKHAND_RELEASE_VERSION`.
    pub fn current() -> Self {
        match option_env!("DOCKHAND_RELEASE_VERSION") {
            Some(version) if !version.is_empty() => Self::new(version),
            _ => Self::local(),
        }
    }

    pub fn is_local_build(&self) -> bool {
        self.0 == LOCAL_BUILD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Semantic version for comparisons; local builds compare as `0.0.0`.
    pub fn semver(&self) -> Result<Version> {
        if self.is_local_build() {
            return Ok(Version::new(0, 0, 0));
        }
        let trimmed = self.0.trim_start_matches('v');
        Version::parse(trimmed).map_err(|e| Error::InvalidVersion {
            version: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionFinding {
    /// Advisory only
    Warning(String),
    /// The image version is outside `required-image-version`
    Mismatch { image: String, range: String },
    /// A range or version could not be evaluated
    Invalid {
        field: &'static str,
        value: String,
        range: String,
        reason: String,
    },
}

fn invalid(field: &'static str, value: &str, range: &str, error: Error) -> VersionFinding {
    let reason = match error {
        Error::InvalidRange { reason, .. } => reason,
        Error::InvalidVersion { version, reason } => format!("invalid version {version}: {reason}"),
        other => other.to_string(),
    };
    VersionFinding::Invalid {
        field,
        value: value.to_string(),
        range: range.to_string(),
        reason,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Run every version rule against `config`.
///
/// Evaluation stops after the required-image-version check fails or cannot
/// be evaluated.
pub fn validate(config: &ResolvedConfig, tool: &ToolVersion) -> Vec<VersionFinding> {
    let mut findings = Vec::new();

    if REGISTRY_PORT.replace_all(&config.image, "").contains(':') {
        findings.push(VersionFinding::Warning(format!(
            "Image should not contain the version: {}",
            config.image
        )));
    }

    if let Some(version) = &config.image_version {
        if version.contains([':', '-']) {
            findings.push(VersionFinding::Warning(format!(
                "Image version parameter should not contain the image name nor the specialized version: {version}"
            )));
        }
    }

    if let Some(tag) = &config.image_tag {
        if tag.contains(':') {
            findings.push(VersionFinding::Warning(format!(
                "Image tag parameter should not contain the image name: {tag}"
            )));
        }
    }

    if let Some(range) = non_empty(&config.recommended_tool_version) {
        if !tool.is_local_build() {
            let field = "recommended-tool-version";
            match check_version_range(tool.as_str(), range, field) {
                Ok(true) => {}
                Ok(false) => findings.push(VersionFinding::Warning(format!(
                    "dockhand v{tool} does not meet the recommended version range {range}"
                ))),
                Err(e) => findings.push(invalid(field, tool.as_str(), range, e)),
            }
        }
    }

    let image_version = non_empty(&config.image_version).filter(|v| VERSION_PATTERN.is_match(v));
    let Some(image_version) = image_version else {
        return findings;
    };

    if let Some(range) = non_empty(&config.required_image_version) {
        let field = "required-image-version";
        match check_version_range(image_version, range, field) {
            Ok(true) => {}
            Ok(false) => {
                findings.push(VersionFinding::Mismatch {
                    image: config.image_name(),
                    range: range.to_string(),
                });
                return findings;
            }
            Err(e) => {
                findings.push(invalid(field, image_version, range, e));
                return findings;
            }
        }
    }

    if let Some(range) = non_empty(&config.recommended_image_version) {
        let field = "recommended-image-version";
        match check_version_range(image_version, range, field) {
            Ok(true) => {}
            Ok(false) => findings.push(VersionFinding::Warning(format!(
                "Image {} does not meet the recommended version range {range}",
                config.image_name()
            ))),
            Err(e) => findings.push(invalid(field, image_version, range, e)),
        }
    }

    findings
}

/// Log findings and decide whether resolution may continue.
///
/// A mismatch is fatal unless `image_version_forced`; an invalid range is
/// always fatal.
pub fn enforce(findings: Vec<VersionFinding>, image_version_forced: bool) -> Result<()> {
    for finding in findings {
        match finding {
            VersionFinding::Warning(message) => tracing::warn!("{message}"),
            VersionFinding::Mismatch { image, range } => {
                if !image_version_forced {
                    return Err(Error::ImageVersionMismatch { image, range });
                }
                tracing::warn!(
                    "Image {image} does not meet the required version range {range}, continuing because the version was set on the command line"
                );
            }
            VersionFinding::Invalid {
                field,
                value,
                range,
                reason,
            } => {
                return Err(Error::InvalidRange {
                    field: field.to_string(),
                    range,
                    reason: format!("while checking {value}: {reason}"),
                });
            }
        }
    }
    Ok(())
}
