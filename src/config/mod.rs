//! Config module.
//! Provides configuration types, default paths and XML loading.

pub mod paths;
pub mod types;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{create_template_config, load_config_from_xml, load_config_from_xml_path, LoadResult};

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "RELINK_CONFIG";
/// How long the CLI waits for probe results by default.
pub const PROBE_TIMEOUT_DEFAULT: std::time::Duration = std::time::Duration::from_millis(2000);
