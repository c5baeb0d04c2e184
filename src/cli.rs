//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - Positional paths get their kind from disk; use --dir for directories that may not exist.
//! - --debug is a shorthand for --log-level debug.
//! - Replacement specs are OLD=NEW and are normalized like tracked paths.

use clap::{ArgAction, Parser, ValueHint};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::RelinkError;
use crate::path::{PathKind, RelinkablePath};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Stage, check and commit path relinks while probing existence in the background"
)]
pub struct Args {
    /// Paths to track. Existing directories are tracked as directories, anything else as files.
    #[arg(value_name = "PATH", value_hint = ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Track PATH as a directory even if it does not exist.
    #[arg(long = "dir", value_name = "PATH", value_hint = ValueHint::DirPath, action = ArgAction::Append)]
    pub dirs: Vec<PathBuf>,

    /// Track every file and directory below DIR.
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath, action = ArgAction::Append)]
    pub scan: Vec<PathBuf>,

    /// Relink one file: OLD=NEW (exact match on file entries).
    #[arg(long = "replace-file", value_name = "OLD=NEW", action = ArgAction::Append)]
    pub replace_file: Vec<String>,

    /// Relink a directory prefix: OLD=NEW (applies to everything at or below OLD).
    #[arg(long = "replace-dir", value_name = "OLD=NEW", action = ArgAction::Append)]
    pub replace_dir: Vec<String>,

    /// Commit staged relinks (refused if two entries would land on the same path).
    #[arg(long, conflicts_with = "rollback")]
    pub commit: bool,

    /// Discard staged relinks before reporting.
    #[arg(long)]
    pub rollback: bool,

    /// How long to wait for existence probes, in milliseconds (overrides config).
    #[arg(long, value_name = "MS")]
    pub probe_timeout_ms: Option<u64>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Print where relink will look for the config file, then exit.
    #[arg(long, help = "Print the config file location used by relink and exit")]
    pub print_config: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

/// A parsed OLD=NEW replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub prefix: String,
    pub replacement: String,
    pub kind: PathKind,
}

impl Args {
    /// Explicitly named paths with their kinds, in command-line order (positionals first).
    pub fn tracked_paths(&self) -> Vec<RelinkablePath> {
        let positional = self.paths.iter().map(|p| {
            let kind = if p.is_dir() { PathKind::Directory } else { PathKind::File };
            RelinkablePath::new(&path_to_string(p), kind)
        });
        let dirs = self
            .dirs
            .iter()
            .map(|p| RelinkablePath::new(&path_to_string(p), PathKind::Directory));
        positional.chain(dirs).collect()
    }

    /// All replacements, file replacements first.
    pub fn replacements(&self) -> Result<Vec<Replacement>, RelinkError> {
        let files = self
            .replace_file
            .iter()
            .map(|s| parse_replacement(s, PathKind::File));
        let dirs = self
            .replace_dir
            .iter()
            .map(|s| parse_replacement(s, PathKind::Directory));
        files.chain(dirs).collect()
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }
}

/// Parse `OLD=NEW`. Both sides are normalized; OLD must not be empty.
pub fn parse_replacement(arg: &str, kind: PathKind) -> Result<Replacement, RelinkError> {
    let (old, new) = arg
        .split_once('=')
        .ok_or_else(|| RelinkError::InvalidReplacement(arg.to_string()))?;
    let (old, new) = (old.trim(), new.trim());
    if old.is_empty() || new.is_empty() {
        return Err(RelinkError::InvalidReplacement(arg.to_string()));
    }
    Ok(Replacement {
        prefix: RelinkablePath::normalize_path(old),
        replacement: RelinkablePath::normalize_path(new),
        kind,
    })
}

/// Absolute, simplified string form of a command-line path.
pub fn path_to_string(p: &Path) -> String {
    let abs = std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
    dunce::simplified(&abs).to_string_lossy().into_owned()
}

pub fn parse() -> Args {
    Args::parse()
}
