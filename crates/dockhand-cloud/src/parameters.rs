//! Parameter-store layout and synthesis into configuration text

use std::collections::BTreeMap;

/// Parameter path read when none is given on the command line.
pub const DEFAULT_PARAMETER_PATH: &str = "/default/dockhand";

/// Parameter holding the remote configuration location.
pub const CONFIG_LOCATION_KEY: &str = "config-location";

/// Parameter holding the colon-separated remote configuration file names.
pub const CONFIG_PATHS_KEY: &str = "config-paths";

/// Strip `path` from a full parameter name, yielding the relative key.
pub fn relative_key(path: &str, name: &str) -> String {
    name.replacen(path, "", 1).trim_start_matches('/').to_string()
}

/// Render parameter values as YAML so they go through the regular parser.
///
/// Values shaped like objects or arrays pass through unquoted; everything
/// else becomes a double-quoted scalar. Keys are emitted in sorted order.
pub fn synthesize_config(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        let is_object = value.starts_with('{') && value.ends_with('}');
        let is_array = value.starts_with('[') && value.ends_with(']');
        let rendered = if is_object || is_array {
            value.clone()
        } else {
            serde_json::Value::String(value.clone()).to_string()
        };
        out.push_str(&format!("{key}: {rendered}\n"));
    }
    out
}
