//! Launch plan handed to the container runtime layer
//!
//! The plan is everything needed to start the container: the final image
//! (after custom build layers), the entry point with alias-expanded
//! arguments, environment, runtime options and hooks.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::Result;
use crate::alias::expand_aliases;
use crate::config::ResolvedConfig;

/// One custom image layer to build before launching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlannedBuild {
    /// Image this layer is built on
    pub from: String,
    /// Image produced by this layer
    pub image: String,
    pub tag: String,
    pub context: PathBuf,
    pub instructions: String,
    pub source: String,
}

/// Fully resolved invocation of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LaunchPlan {
    pub image: String,
    pub entry_point: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub docker_options: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_before: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub builds: Vec<PlannedBuild>,
}

impl LaunchPlan {
    /// Build the plan for `args`, expanding aliases on the first argument.
    pub fn new(config: &ResolvedConfig, args: &[String]) -> Result<Self> {
        let args = expand_aliases(&config.aliases, args)?;

        let mut image = config.image_name();
        let mut builds = Vec::with_capacity(config.build_specs.len());
        for spec in &config.build_specs {
            let tag = spec.tag();
            let produced = layered_image(&image, &tag);
            builds.push(PlannedBuild {
                from: image,
                image: produced.clone(),
                tag,
                context: spec.context_dir(),
                instructions: spec.instructions.clone(),
                source: spec.source.clone(),
            });
            image = produced;
        }

        Ok(Self {
            image,
            entry_point: config.entry_point.clone(),
            args,
            environment: config.environment.clone(),
            docker_options: config.docker_options.clone(),
            run_before: config.run_before.clone(),
            run_after: config.run_after.clone(),
            builds,
        })
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Name of the image built from `base` with `tag`.
///
/// The tag extends an existing version suffix, or becomes the suffix.
fn layered_image(base: &str, tag: &str) -> String {
    let name = base.rsplit('/').next().unwrap_or(base);
    if name.contains(':') {
        format!("{base}-{tag}")
    } else {
        format!("{base}:{tag}")
    }
}
