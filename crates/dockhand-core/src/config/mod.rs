//! Layered configuration
//!
//! Layers are parsed from JSON, YAML or TOML into a [`PartialConfig`] and
//! folded onto the defaults in precedence order (lowest first):
//!
//! 1. **Remote files** - fetched from the configured location
//! 2. **Parameter store** - only when no remote file was found
//! 3. **Local files** - `dockhand.user.config` then `.dockhand.config` in each
//!    directory from the filesystem root down to the working directory
//! 4. **Command line** - forced image, version, tag and entry point

mod document;
mod layer;
mod merge;
mod overrides;
mod resolver;
mod schema;

pub use document::{Format, OS_KEYS, flatten_os_sections, host_os_keys, parse_document, parse_layer};
pub use layer::{ConfigLayer, LayerOrigin};
pub use merge::{
    DEFAULT_AUTO_UPDATE_DELAY, DEFAULT_ENTRY_POINT, DEFAULT_IMAGE, DEFAULT_LOG_LEVEL,
    DEFAULT_REFRESH, ResolvedConfig, merge_layers,
};
pub use overrides::{Overrides, ResolveOptions};
pub use resolver::ConfigResolver;
pub use schema::{FIELDS, FieldKind, FieldSpec, PartialConfig, field_for_key};
