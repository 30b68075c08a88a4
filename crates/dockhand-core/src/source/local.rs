//! Configuration files along the working directory's ancestor chain

use std::path::Path;

use dockhand_fs::{find_config_files, io::read_text};

use crate::config::ConfigLayer;

/// Read every configuration file from the filesystem root down to `cwd`.
///
/// Files that exist but cannot be read are logged and skipped.
pub fn load_local_layers(cwd: &Path, include_user: bool) -> Vec<ConfigLayer> {
    find_config_files(cwd, include_user)
        .into_iter()
        .filter_map(|path| {
            tracing::debug!(path = %path.display(), "Reading configuration from file");
            match read_text(&path) {
                Ok(content) => Some(ConfigLayer::file(path, content)),
                Err(e) => {
                    tracing::error!("Error while loading configuration file {}\n{e}", path.display());
                    None
                }
            }
        })
        .collect()
}
