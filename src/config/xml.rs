//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Creates a template if missing (unless RELINK_CONFIG is set).
//!
//! Notes:
//! - Unknown XML fields are an error so that typos surface instead of being ignored.
//! - Empty elements fall back to defaults.

use anyhow::{bail, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use super::{CONFIG_ENV, PROBE_TIMEOUT_DEFAULT};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
    #[serde(rename = "probe_timeout_ms", default, deserialize_with = "de_u64_trimmed_opt")]
    probe_timeout_ms: Option<u64>,
}

// Custom deserializer that trims surrounding whitespace for optional u64
fn de_u64_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<u64>().ok()))
}

/// Outcome of looking for the config file.
#[derive(Debug)]
pub enum LoadResult {
    /// The file existed and parsed.
    Loaded(Config),
    /// No file existed at the default location; a template was written there.
    CreatedTemplate(PathBuf),
    /// No file, and none was created (explicit RELINK_CONFIG path missing).
    Missing(PathBuf),
}

/// Locate and read the config file, creating a template at the default location if absent.
pub fn load_config_from_xml() -> Result<LoadResult> {
    let env_set = env::var_os(CONFIG_ENV).is_some();
    let cfg_path = default_config_path()?;

    if !cfg_path.exists() {
        if env_set {
            debug!("Config named by {CONFIG_ENV} does not exist: {}", cfg_path.display());
            return Ok(LoadResult::Missing(cfg_path));
        }
        create_template_config(&cfg_path)?;
        return Ok(LoadResult::CreatedTemplate(cfg_path));
    }

    load_config_from_xml_path(&cfg_path).map(LoadResult::Loaded)
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    debug!("Loaded config from {}", path.display());
    Ok(xml_to_config(parsed))
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(level) = parsed
        .log_level
        .as_deref()
        .and_then(|s| s.trim().parse::<LogLevel>().ok())
    {
        cfg.log_level = level;
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }
    cfg.probe_timeout = parsed
        .probe_timeout_ms
        .map(Duration::from_millis)
        .unwrap_or(PROBE_TIMEOUT_DEFAULT);

    cfg
}

/// Create the template config file and its parent directory.
/// Refuses to write through a symlinked ancestor and never overwrites an existing file.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir '{}'", parent.display()))?;
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/relink.log".into());

    let content = format!(
        "<!--\n  relink configuration (XML)\n\n    log_level         -> quiet | normal | info | debug\n    log_file          -> path to log file (optional; stdout still used)\n    probe_timeout_ms  -> how long to wait for existence probes before reporting\n\n  CLI flags override XML values.\n-->\n<config>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <probe_timeout_ms>{}</probe_timeout_ms>\n</config>\n",
        suggested_log,
        PROBE_TIMEOUT_DEFAULT.as_millis()
    );

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("create config '{}'", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("write config '{}'", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }

    info!("Created template config at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses_back() {
        let td = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(td.path()).unwrap();
        let path = root.join("nested").join("config.xml");
        create_template_config(&path).unwrap();
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Normal);
        assert_eq!(cfg.probe_timeout, PROBE_TIMEOUT_DEFAULT);
    }

    #[test]
    fn template_never_overwrites() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("config.xml");
        fs::write(&path, "<config/>").unwrap();
        assert!(create_template_config(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "<config/>");
    }
}
