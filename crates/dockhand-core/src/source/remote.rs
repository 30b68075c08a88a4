//! Remote configuration files
//!
//! A remote location is a base URL or directory plus a colon-separated list
//! of file names. Each file is copied into a transient directory, checked and
//! read; any failure is logged and that file skipped.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ConfigLayer;
use crate::{Error, Result};

/// File fetched when no file names are configured.
pub const DEFAULT_REMOTE_FILE: &str = "DockhandConfig";

const USER_AGENT: &str = concat!("dockhand/", env!("CARGO_PKG_VERSION"));

/// Fetches configuration layers from a remote location.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    /// Directory relative plain paths are resolved against
    cwd: PathBuf,
}

impl RemoteFetcher {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Fetch every file under `location`, in the order listed in `files`.
    ///
    /// Returns nothing when `location` is unset. Empty files are skipped.
    pub fn fetch(&self, location: Option<&str>, files: Option<&str>) -> Vec<ConfigLayer> {
        let Some(location) = location.filter(|l| !l.is_empty()) else {
            return Vec::new();
        };
        let mut base = location.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let files = files.filter(|f| !f.is_empty()).unwrap_or(DEFAULT_REMOTE_FILE);

        let temp_dir = match tempfile::Builder::new().prefix("dockhand-config-files").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("Unable to create a directory for remote configuration: {e}");
                return Vec::new();
            }
        };

        let mut layers = Vec::new();
        for (index, name) in files.split(':').filter(|n| !n.is_empty()).enumerate() {
            let url = format!("{base}{name}");
            // Listed names may be absolute or contain `..`; they never name the local copy.
            let destination = temp_dir.path().join(format!("layer-{index}"));
            tracing::debug!(%url, "Reading configuration from remote location");

            if let Err(e) = self.fetch_file(&url, &destination) {
                tracing::warn!("Error fetching config at {url}: {e}");
                continue;
            }

            match fs::read_to_string(&destination) {
                Ok(content) if content.is_empty() => {
                    tracing::debug!(%url, "Remote configuration is empty, skipped");
                }
                Ok(content) => layers.push(ConfigLayer::remote(url, content)),
                Err(e) => tracing::warn!("Error reading fetched config file {name}: {e}"),
            }
        }
        layers
    }

    fn fetch_file(&self, url: &str, destination: &Path) -> Result<()> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = ureq::get(url)
                .set("User-Agent", USER_AGENT)
                .call()
                .map_err(|e| Error::Fetch {
                    url: url.to_string(),
                    reason: match e {
                        ureq::Error::Status(code, _) => format!("HTTP status {code}"),
                        other => other.to_string(),
                    },
                })?;
            let mut file = File::create(destination)?;
            io::copy(&mut response.into_reader(), &mut file)?;
        } else {
            let source = self.local_path(url)?;
            fs::copy(&source, destination).map_err(|e| Error::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        }

        if !destination.exists() {
            return Err(Error::Fetch {
                url: url.to_string(),
                reason: "config file was not found at the source".to_string(),
            });
        }
        Ok(())
    }

    fn local_path(&self, url: &str) -> Result<PathBuf> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(Error::Fetch {
                url: url.to_string(),
                reason: format!("unsupported scheme `{scheme}`"),
            });
        }
        let path = Path::new(url);
        Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerOrigin;
    use dockhand_test_utils::TestTree;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn contents(layers: &[ConfigLayer]) -> Vec<&str> {
        layers.iter().map(|l| l.content.as_str()).collect()
    }

    #[test]
    fn no_location_means_no_layers() {
        let fetcher = RemoteFetcher::new("/");
        assert!(fetcher.fetch(None, Some("a")).is_empty());
        assert!(fetcher.fetch(Some(""), None).is_empty());
    }

    #[test]
    fn reads_default_file_from_directory() {
        let tree = TestTree::new();
        tree.write("shared/DockhandConfig", "docker-image: shared\n");
        let location = tree.path("shared").display().to_string();

        let layers = RemoteFetcher::new(tree.root()).fetch(Some(&location), None);

        assert_eq!(contents(&layers), vec!["docker-image: shared\n"]);
        assert_eq!(
            layers[0].origin,
            LayerOrigin::Remote {
                url: format!("{location}/DockhandConfig")
            }
        );
    }

    #[test]
    fn relative_location_resolves_against_cwd() {
        let tree = TestTree::new();
        tree.write("shared/one.yml", "entry-point: sh\n");
        let layers = RemoteFetcher::new(tree.root()).fetch(Some("shared"), Some("one.yml"));
        assert_eq!(contents(&layers), vec!["entry-point: sh\n"]);
    }

    #[test]
    fn file_urls_and_listed_order() {
        let tree = TestTree::new();
        tree.write("shared/a.yml", "a: 1\n");
        tree.write("shared/nested/b.yml", "b: 2\n");
        let location = format!("file://{}/", tree.path("shared").display());

        let layers = RemoteFetcher::new(tree.root()).fetch(Some(&location), Some("nested/b.yml:a.yml"));

        assert_eq!(contents(&layers), vec!["b: 2\n", "a: 1\n"]);
    }

    #[test]
    fn missing_empty_and_unsupported_files_are_skipped() {
        let tree = TestTree::new();
        tree.write("shared/empty.yml", "");
        tree.write("shared/good.yml", "a: 1\n");
        let location = tree.path("shared").display().to_string();
        let fetcher = RemoteFetcher::new(tree.root());

        let layers = fetcher.fetch(Some(&location), Some("missing.yml:empty.yml:good.yml"));
        assert_eq!(contents(&layers), vec!["a: 1\n"]);

        assert!(fetcher.fetch(Some("s3://bucket/config"), None).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn absolute_file_names_never_write_outside_the_fetch_dir() {
        let tree = TestTree::new();
        let victim = tree.write("victim.txt", "precious");
        let victim_name = victim.display().to_string();
        tree.write(&format!("shared{victim_name}"), "docker-image: evil\n");
        let location = tree.path("shared").display().to_string();

        let layers = RemoteFetcher::new(tree.root()).fetch(Some(&location), Some(&victim_name));

        assert_eq!(contents(&layers), vec!["docker-image: evil\n"]);
        assert_eq!(fs::read_to_string(&victim).unwrap(), "precious");
    }

    #[test]
    fn parent_segments_read_the_source_but_not_the_destination() {
        let tree = TestTree::new();
        tree.write("outside.yml", "entry-point: sh\n");
        tree.mkdir("shared");
        let location = tree.path("shared").display().to_string();

        let layers = RemoteFetcher::new(tree.root()).fetch(Some(&location), Some("../outside.yml"));

        assert_eq!(contents(&layers), vec!["entry-point: sh\n"]);
        assert_eq!(fs::read_to_string(tree.path("outside.yml")).unwrap(), "entry-point: sh\n");
    }

    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buffer = [0u8; 2048];
                let _ = stream.read(&mut buffer);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{address}")
    }

    #[test]
    fn fetches_over_http() {
        let base = serve_once("200 OK", "docker-image: remote\n");
        let layers = RemoteFetcher::new("/").fetch(Some(&base), None);
        assert_eq!(contents(&layers), vec!["docker-image: remote\n"]);
    }

    #[test]
    fn http_errors_are_skipped() {
        let base = serve_once("404 Not Found", "");
        assert!(RemoteFetcher::new("/").fetch(Some(&base), None).is_empty());
    }
}
