//! Resolved configuration and the layer fold
//!
//! Layers are folded left to right onto [`ResolvedConfig::default`]. Scalars
//! and docker options are replaced by later layers, the `environment` and
//! `alias` maps merge per key, and build specs plus run hooks accumulate.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use super::document::parse_layer;
use super::layer::ConfigLayer;
use super::schema::PartialConfig;
use crate::{Error, Result};
use crate::build::BuildSpec;

pub const DEFAULT_IMAGE: &str = "dockhand/toolbox";
pub const DEFAULT_ENTRY_POINT: &str = "terragrunt";
pub const DEFAULT_LOG_LEVEL: &str = "notice";
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_AUTO_UPDATE_DELAY: Duration = Duration::from_secs(2 * 60 * 60);

/// The effective configuration after every layer has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedConfig {
    #[serde(rename = "docker-image")]
    pub image: String,
    #[serde(rename = "docker-image-version", skip_serializing_if = "Option::is_none")]
    pub image_version: Option<String>,
    #[serde(rename = "docker-image-tag", skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
    /// Build layers, least specific first
    #[serde(rename = "docker-image-builds", skip_serializing_if = "Vec::is_empty")]
    pub build_specs: Vec<BuildSpec>,
    #[serde(rename = "logging-level")]
    pub log_level: String,
    pub entry_point: String,
    #[serde(rename = "docker-refresh", with = "humantime_serde")]
    pub refresh: Duration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub docker_options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_image_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_image_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_tool_version: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    /// Pre-run commands, most specific layer first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_before: Vec<String>,
    /// Post-run commands, least specific layer first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<String>,
    #[serde(rename = "alias", skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_version: Option<String>,
    #[serde(with = "humantime_serde")]
    pub auto_update_delay: Duration,
    pub auto_update: bool,
    /// Identifiers of the layers that were applied, in order
    #[serde(skip)]
    pub sources: Vec<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            image_version: None,
            image_tag: None,
            build_specs: Vec::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            refresh: DEFAULT_REFRESH,
            docker_options: Vec::new(),
            recommended_image_version: None,
            required_image_version: None,
            recommended_tool_version: None,
            environment: BTreeMap::new(),
            run_before: Vec::new(),
            run_after: Vec::new(),
            aliases: BTreeMap::new(),
            update_version: None,
            auto_update_delay: DEFAULT_AUTO_UPDATE_DELAY,
            auto_update: true,
            sources: Vec::new(),
        }
    }
}

impl ResolvedConfig {
    /// Fold one parsed layer into this configuration.
    ///
    /// `source` identifies the layer; `source_dir` anchors relative build
    /// folders.
    pub fn apply(&mut self, partial: &PartialConfig, source: &str, source_dir: &Path) {
        set(&mut self.image, &partial.image);
        set_opt(&mut self.image_version, &partial.image_version);
        set_opt(&mut self.image_tag, &partial.image_tag);
        set(&mut self.log_level, &partial.log_level);
        set(&mut self.entry_point, &partial.entry_point);
        set(&mut self.refresh, &partial.refresh);
        set(&mut self.docker_options, &partial.docker_options);
        set_opt(&mut self.recommended_image_version, &partial.recommended_image_version);
        set_opt(&mut self.required_image_version, &partial.required_image_version);
        set_opt(&mut self.recommended_tool_version, &partial.recommended_tool_version);
        set_opt(&mut self.update_version, &partial.update_version);
        set(&mut self.auto_update_delay, &partial.auto_update_delay);
        set(&mut self.auto_update, &partial.auto_update);

        if let Some(environment) = &partial.environment {
            self.environment
                .extend(environment.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(aliases) = &partial.aliases {
            self.aliases
                .extend(aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        if let Some(instructions) = partial.image_build.as_ref().filter(|s| !s.is_empty()) {
            self.build_specs.push(BuildSpec {
                instructions: instructions.clone(),
                folder: partial.image_build_folder.clone().filter(|s| !s.is_empty()),
                tag: partial.image_build_tag.clone().filter(|s| !s.is_empty()),
                source: source.to_string(),
                source_dir: source_dir.to_path_buf(),
            });
        }

        // Prepending keeps the list reversed relative to layer order at every
        // step, so partial folds compose.
        if let Some(command) = partial.run_before.as_ref().filter(|s| !s.is_empty()) {
            self.run_before.insert(0, command.clone());
        }
        if let Some(command) = partial.run_after.as_ref().filter(|s| !s.is_empty()) {
            self.run_after.push(command.clone());
        }

        self.sources.push(source.to_string());
    }

    /// Effective image reference, `repository[:version[-tag]]`.
    pub fn image_name(&self) -> String {
        crate::image::compose_image_name(
            &self.image,
            self.image_version.as_deref(),
            self.image_tag.as_deref(),
        )
    }

    /// Render as YAML for `--config-dump`.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

/// Fold `layers` onto `base` in order.
///
/// A layer that fails to parse is logged with its origin and skipped.
pub fn merge_layers(mut base: ResolvedConfig, layers: &[ConfigLayer], cwd: &Path) -> ResolvedConfig {
    for layer in layers {
        let source = layer.origin.to_string();
        match parse_layer(&layer.content) {
            Ok(partial) => {
                tracing::debug!(%source, "Applying configuration layer");
                base.apply(&partial, &source, &layer.origin.base_dir(cwd));
            }
            Err(reason) => {
                let error = Error::LayerParse {
                    origin: source,
                    reason,
                };
                tracing::warn!("{error}\nContent:\n{}", layer.content);
            }
        }
    }
    base
}
