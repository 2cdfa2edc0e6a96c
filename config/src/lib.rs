//! Configuration loading for catlint.
//!
//! Global settings live in `~/.catlint/config.toml`; a `.catlint.toml` found
//! in a document's directory or any ancestor overrides them field by field.

mod file;
mod source;

pub use file::{
    CatlintConfig, ConfigError, ConfigLocations, RawAnalyzer, RawConfig, RawLint,
    WORKSPACE_CONFIG_FILE, expand_env_vars, find_workspace_config, global_config_path,
};
pub use source::FileConfigSource;
