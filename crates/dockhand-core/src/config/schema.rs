//! Configuration schema
//!
//! [`PartialConfig`] holds what a single layer sets. [`FIELDS`] is the
//! hand-maintained table of every recognised key; it drives scalar coercion
//! before deserialization and the key listing printed by the CLI.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Shape of the value a configuration key accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text; numbers and booleans are accepted and stringified
    Text,
    /// Boolean; `"true"` / `"false"` strings are accepted
    Flag,
    /// Duration such as `1h` or `90m`
    Interval,
    /// List of strings; a single string is a one-element list
    List,
    /// String-to-string mapping
    Mapping,
}

/// One row of the schema table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Field name on [`PartialConfig`]
    pub name: &'static str,
    /// Key used in configuration documents
    pub key: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

/// Every key a configuration layer may set.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "image",
        key: "docker-image",
        kind: FieldKind::Text,
        description: "Container image repository to launch",
    },
    FieldSpec {
        name: "image_version",
        key: "docker-image-version",
        kind: FieldKind::Text,
        description: "Version part of the image reference",
    },
    FieldSpec {
        name: "image_tag",
        key: "docker-image-tag",
        kind: FieldKind::Text,
        description: "Tag appended to the image version",
    },
    FieldSpec {
        name: "image_build",
        key: "docker-image-build",
        kind: FieldKind::Text,
        description: "Build instructions layered on top of the image",
    },
    FieldSpec {
        name: "image_build_folder",
        key: "docker-image-build-folder",
        kind: FieldKind::Text,
        description: "Build context folder, relative to the declaring file",
    },
    FieldSpec {
        name: "image_build_tag",
        key: "docker-image-build-tag",
        kind: FieldKind::Text,
        description: "Explicit tag for the custom image layer",
    },
    FieldSpec {
        name: "log_level",
        key: "logging-level",
        kind: FieldKind::Text,
        description: "Log level (critical, error, warning, notice, info, debug)",
    },
    FieldSpec {
        name: "entry_point",
        key: "entry-point",
        kind: FieldKind::Text,
        description: "Program started inside the container",
    },
    FieldSpec {
        name: "refresh",
        key: "docker-refresh",
        kind: FieldKind::Interval,
        description: "Interval between image refreshes",
    },
    FieldSpec {
        name: "docker_options",
        key: "docker-options",
        kind: FieldKind::List,
        description: "Extra options passed to the container runtime",
    },
    FieldSpec {
        name: "recommended_image_version",
        key: "recommended-image-version",
        kind: FieldKind::Text,
        description: "Image version range that only warns when unmet",
    },
    FieldSpec {
        name: "required_image_version",
        key: "required-image-version",
        kind: FieldKind::Text,
        description: "Image version range that aborts when unmet",
    },
    FieldSpec {
        name: "recommended_tool_version",
        key: "recommended-tool-version",
        kind: FieldKind::Text,
        description: "Range of dockhand versions recommended for this project",
    },
    FieldSpec {
        name: "environment",
        key: "environment",
        kind: FieldKind::Mapping,
        description: "Environment variables passed to the container",
    },
    FieldSpec {
        name: "run_before",
        key: "run-before",
        kind: FieldKind::Text,
        description: "Script executed before the entry point",
    },
    FieldSpec {
        name: "run_after",
        key: "run-after",
        kind: FieldKind::Text,
        description: "Script executed after the entry point",
    },
    FieldSpec {
        name: "aliases",
        key: "alias",
        kind: FieldKind::Mapping,
        description: "Command aliases expanded on the first argument",
    },
    FieldSpec {
        name: "update_version",
        key: "update-version",
        kind: FieldKind::Text,
        description: "Pinned dockhand version for self-update",
    },
    FieldSpec {
        name: "auto_update_delay",
        key: "auto-update-delay",
        kind: FieldKind::Interval,
        description: "Interval between update checks",
    },
    FieldSpec {
        name: "auto_update",
        key: "auto-update",
        kind: FieldKind::Flag,
        description: "Whether dockhand updates itself automatically",
    },
];

/// Look up the schema row for a document key.
pub fn field_for_key(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.key == key)
}

/// The settings contributed by a single configuration layer.
///
/// Every field is optional; `None` means the layer leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartialConfig {
    #[serde(rename = "docker-image")]
    pub image: Option<String>,
    #[serde(rename = "docker-image-version")]
    pub image_version: Option<String>,
    #[serde(rename = "docker-image-tag")]
    pub image_tag: Option<String>,
    #[serde(rename = "docker-image-build")]
    pub image_build: Option<String>,
    #[serde(rename = "docker-image-build-folder")]
    pub image_build_folder: Option<String>,
    #[serde(rename = "docker-image-build-tag")]
    pub image_build_tag: Option<String>,
    #[serde(rename = "logging-level")]
    pub log_level: Option<String>,
    pub entry_point: Option<String>,
    #[serde(rename = "docker-refresh", default, with = "humantime_serde")]
    pub refresh: Option<Duration>,
    pub docker_options: Option<Vec<String>>,
    pub recommended_image_version: Option<String>,
    pub required_image_version: Option<String>,
    pub recommended_tool_version: Option<String>,
    pub environment: Option<BTreeMap<String, String>>,
    pub run_before: Option<String>,
    pub run_after: Option<String>,
    #[serde(rename = "alias")]
    pub aliases: Option<BTreeMap<String, String>>,
    pub update_version: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub auto_update_delay: Option<Duration>,
    pub auto_update: Option<bool>,
}

impl PartialConfig {
    /// Deserialize a flattened document, coercing scalars per [`FIELDS`].
    pub fn from_document(mut document: Map<String, Value>) -> serde_json::Result<Self> {
        coerce_values(&mut document);
        serde_json::from_value(Value::Object(document))
    }
}

/// Normalize loosely typed values so they fit the schema.
///
/// YAML reads `docker-image-version: 1.2` as a number and the parameter
/// store delivers every value as a string; both are accepted here.
fn coerce_values(document: &mut Map<String, Value>) {
    for (key, value) in document.iter_mut() {
        let Some(field) = field_for_key(key) else {
            tracing::debug!(key = %key, "Ignoring unknown configuration key");
            continue;
        };
        match field.kind {
            FieldKind::Text => stringify_scalar(value),
            FieldKind::Flag => {
                if let Value::String(s) = value {
                    match s.trim().to_ascii_lowercase().as_str() {
                        "true" | "yes" | "on" => *value = Value::Bool(true),
                        "false" | "no" | "off" => *value = Value::Bool(false),
                        _ => {}
                    }
                }
            }
            FieldKind::Interval => {}
            FieldKind::List => {
                if let Value::String(_) = value {
                    *value = Value::Array(vec![value.take()]);
                }
                if let Value::Array(items) = value {
                    items.iter_mut().for_each(stringify_scalar);
                }
            }
            FieldKind::Mapping => {
                if let Value::Object(entries) = value {
                    entries.values_mut().for_each(stringify_scalar);
                }
            }
        }
    }
}

fn stringify_scalar(value: &mut Value) {
    match value {
        Value::Number(n) => *value = Value::String(n.to_string()),
        Value::Bool(b) => *value = Value::String(b.to_string()),
        _ => {}
    }
}
