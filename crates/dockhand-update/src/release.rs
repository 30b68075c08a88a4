//! Release discovery and artifact download

use std::io::Read;

use semver::Version;
use serde::Deserialize;

use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.github.com/repos/dockhand/dockhand/releases/latest";
const DEFAULT_DOWNLOAD_URL: &str = "https://github.com/dockhand/dockhand/releases/download";
const USER_AGENT: &str = concat!("dockhand/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct LatestRelease {
    #[serde(default)]
    tag_name: String,
}

/// Where releases are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    /// Endpoint answering with the latest release as JSON
    pub api_url: String,
    /// Base under which `v{version}/<artifact>` is served
    pub download_url: String,
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
        }
    }
}

impl ReleaseSource {
    /// Latest available version.
    ///
    /// A `pinned` version is returned as is without touching the network.
    pub fn latest_version(&self, pinned: Option<&str>) -> Result<Version> {
        if let Some(pinned) = pinned.filter(|p| !p.trim().is_empty()) {
            tracing::debug!(version = pinned, "Using the pinned update version");
            return parse_release_version(pinned);
        }

        tracing::debug!(url = %self.api_url, "Querying the latest release");
        let query_error = |reason: String| Error::ReleaseQuery {
            url: self.api_url.clone(),
            reason,
        };
        let release: LatestRelease = match ureq::get(&self.api_url)
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT)
            .call()
        {
            Ok(response) => response.into_json().map_err(|e| query_error(e.to_string()))?,
            Err(ureq::Error::Status(code, _)) => {
                return Err(query_error(format!("HTTP status {code}")));
            }
            Err(e) => return Err(query_error(e.to_string())),
        };

        if release.tag_name.is_empty() {
            return Err(query_error("response has no tag_name".to_string()));
        }
        parse_release_version(&release.tag_name)
    }

    /// Download URL of the artifact for `version` on this platform.
    pub fn artifact_url(&self, version: &Version) -> String {
        let base = self.download_url.trim_end_matches('/');
        format!(
            "{base}/v{version}/dockhand_{version}_{}_{}.tar.gz",
            platform_os(),
            platform_arch()
        )
    }

    /// Fetch the raw artifact bytes.
    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(%url, "Downloading release artifact");
        let download_error = |reason: String| Error::Download {
            url: url.to_string(),
            reason,
        };
        let response = match ureq::get(url).set("User-Agent", USER_AGENT).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(download_error(format!("HTTP status {code}")));
            }
            Err(e) => return Err(download_error(e.to_string())),
        };

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| download_error(e.to_string()))?;
        Ok(bytes)
    }
}

/// Parse a release tag such as `v1.4.2` or `1.4`.
pub fn parse_release_version(tag: &str) -> Result<Version> {
    let trimmed = tag.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let padded = if trimmed.matches('.').count() == 1 {
        format!("{trimmed}.0")
    } else {
        trimmed.to_string()
    };
    Version::parse(&padded).map_err(|e| Error::InvalidVersion {
        version: tag.to_string(),
        reason: e.to_string(),
    })
}

fn platform_os() -> &'static str {
    std::env::consts::OS
}

fn platform_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}
