//! Configuration document parsing
//!
//! A layer may be written as JSON, YAML or TOML. The text is parsed into a
//! generic map, OS-specific sections are flattened into the top level, and
//! the result is handed to [`PartialConfig::from_document`].

use serde_json::{Map, Value};

use super::schema::PartialConfig;

/// Keys that introduce OS-specific sections.
pub const OS_KEYS: &[&str] = &["unix", "linux", "darwin", "macos", "windows"];

/// Serialization a layer was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

/// Parse raw layer text into a document map.
///
/// JSON is tried when the text starts with `{`; otherwise YAML, falling back
/// to TOML when YAML does not yield a mapping. Empty text is an empty YAML
/// document.
///
/// A YAML mapping is only kept when the text is not also a TOML document
/// with keys: `key = "a: b"` is a one-entry YAML mapping with a junk key.
pub fn parse_document(raw: &str) -> Result<(Format, Map<String, Value>), String> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Ok((Format::Yaml, Map::new()));
    }

    if trimmed.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
            return Ok((Format::Json, map));
        }
    }

    let toml = toml::from_str::<Map<String, Value>>(raw);
    let yaml_error = match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => {
            return Ok(match toml {
                Ok(toml_map) if !toml_map.is_empty() => (Format::Toml, toml_map),
                _ => (Format::Yaml, map),
            });
        }
        Ok(Value::Null) => return Ok((Format::Yaml, Map::new())),
        Ok(_) => "document is not a mapping".to_string(),
        Err(e) => e.to_string(),
    };

    match toml {
        Ok(map) => Ok((Format::Toml, map)),
        Err(toml_error) => Err(format!(
            "not valid YAML, JSON or TOML\nYAML: {yaml_error}\nTOML: {}",
            toml_error.message()
        )),
    }
}

/// OS section keys that apply to the running host, lowest precedence first.
pub fn host_os_keys() -> Vec<&'static str> {
    let mut keys = Vec::new();
    if cfg!(unix) {
        keys.push("unix");
    }
    match std::env::consts::OS {
        "linux" => keys.push("linux"),
        "macos" => keys.extend(["darwin", "macos"]),
        "windows" => keys.push("windows"),
        _ => {}
    }
    keys
}

/// Merge the sections named by `host_keys` into the top level and drop every
/// OS section.
///
/// Entries from a later section replace earlier ones and top-level entries.
pub fn flatten_os_sections(document: &mut Map<String, Value>, host_keys: &[&str]) {
    let mut sections: Vec<(String, Value)> = Vec::new();
    for key in OS_KEYS {
        if let Some(section) = document.remove(*key) {
            sections.push((key.to_string(), section));
        }
    }

    for host_key in host_keys {
        let Some((_, section)) = sections.iter_mut().find(|(k, _)| k == host_key) else {
            continue;
        };
        match section.take() {
            Value::Object(entries) => document.extend(entries),
            Value::Null => {}
            other => tracing::warn!(section = %host_key, value = %other, "OS section is not a mapping, ignored"),
        }
    }
}

/// Parse, flatten and deserialize one layer.
pub fn parse_layer(raw: &str) -> Result<PartialConfig, String> {
    let (format, mut document) = parse_document(raw)?;
    tracing::trace!(?format, keys = document.len(), "Parsed configuration document");
    flatten_os_sections(&mut document, &host_os_keys());
    PartialConfig::from_document(document).map_err(|e| e.to_string())
}
