//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the Ctrl-C handler,
//! builds the registry, applies the requested relinks, and prints a report.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use relink_probe::cli::{path_to_string, Args};
use relink_probe::output as out;
use relink_probe::{
    default_config_path, load_config_from_xml, shutdown, Config, LoadResult, LogLevel, PathKind,
    ProbeStatus, RelinkError, RelinkablePath, RelinkingRegistry,
};

use crate::logging::init_tracing;

/// Upper bound on one blocking wait, so Ctrl-C is noticed promptly.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        match default_config_path() {
            Ok(p) => {
                out::print_info(&format!("relink config path:\n  {}\n", p.display()));
                if p.exists() {
                    out::print_info("A config file already exists at that location.");
                } else {
                    out::print_info("No config file exists there yet.");
                }
            }
            Err(e) => out::print_error(&format!("Could not determine a config path: {e}")),
        }
        return Ok(());
    }

    let mut cfg = match load_config_from_xml()? {
        LoadResult::Loaded(cfg) => cfg,
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!("A template relink config was written to: {}", path.display()));
            Config::default()
        }
        LoadResult::Missing(path) => {
            out::print_warn(&format!("Config file {} does not exist; using defaults.", path.display()));
            Config::default()
        }
    };

    // CLI wins over the config file.
    if let Some(lvl_str) = args.log_level.as_ref() {
        match LogLevel::parse(lvl_str) {
            Some(parsed) => cfg.log_level = parsed,
            None => out::print_warn(&format!("Ignoring unknown log level '{lvl_str}'")),
        }
    } else if args.debug {
        cfg.log_level = LogLevel::Debug;
    }
    if let Some(t) = args.probe_timeout() {
        cfg.probe_timeout = t;
    }

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {}", e));
        e
    })?;

    // Guard needs to be dropped on SIGINT to flush logs
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        let installed = ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; shutting down gracefully...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        });
        if let Err(e) = installed {
            warn!(error = %e, "Could not install interrupt handler");
        }
    }

    debug!("Starting relink: {:?}", args);

    let result = relink(&args, &cfg);
    if let Err(e) = &result {
        match e.downcast_ref::<RelinkError>() {
            Some(re) => {
                let code = re.code();
                if let RelinkError::MergeConflict { destination } = re {
                    error!(code, kind = "merge_conflict", %destination, "Commit refused")
                } else {
                    error!(code, error = %re, "relink failed")
                }
            }
            None => error!(error = ?e, "relink failed"),
        }
    }

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

fn relink(args: &Args, cfg: &Config) -> Result<()> {
    let replacements = args.replacements()?;
    let mut registry = RelinkingRegistry::new()?;

    let mut candidates = args.tracked_paths();
    for root in &args.scan {
        candidates.extend(scan_dir(root));
    }
    let mut added = 0usize;
    for p in &candidates {
        if registry.add_relinkable(p) {
            added += 1;
        }
    }
    info!(added, "Tracking paths");
    settle(&mut registry, cfg.probe_timeout)?;

    for r in &replacements {
        let n = registry.replace_prefix(&r.prefix, &r.replacement, r.kind);
        if n == 0 {
            out::print_warn(&format!("No tracked {} matches '{}'", r.kind, r.prefix));
        }
    }
    settle(&mut registry, cfg.probe_timeout)?;

    if args.rollback {
        registry.rollback_changes();
    } else if args.commit {
        let merges = registry.merge_destinations();
        if let Some(destination) = merges.first() {
            for dup in &merges {
                out::print_error(&format!("Several paths would be relinked to {dup}"));
            }
            report(&registry);
            return Err(RelinkError::MergeConflict { destination: destination.clone() }.into());
        }
        registry.commit_changes();
    } else if registry.check_for_merges() {
        out::print_warn("Staged relinks collide; --commit would be refused");
    }

    report(&registry);
    Ok(())
}

/// Every entry below `root`, directories tracked as directories.
fn scan_dir(root: &std::path::Path) -> Vec<RelinkablePath> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| {
            let kind = if e.file_type().is_dir() { PathKind::Directory } else { PathKind::File };
            RelinkablePath::new(&path_to_string(e.path()), kind)
        })
        .collect()
}

/// Wait until no staged path is pending, the timeout passes, or the user interrupts.
fn settle(registry: &mut RelinkingRegistry, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    registry.process_responses();
    while registry.has_pending_probes() {
        shutdown::check()?;
        let now = Instant::now();
        if now >= deadline {
            warn!(timeout_ms = timeout.as_millis() as u64, "Gave up waiting for existence probes");
            break;
        }
        let pending = registry
            .entries()
            .iter()
            .filter(|e| e.uncommitted_status() == ProbeStatus::Pending)
            .count();
        registry.wait_for_responses(pending, WAIT_SLICE.min(deadline - now));
    }
    Ok(())
}

fn report(registry: &RelinkingRegistry) {
    for entry in registry.entries() {
        out::print_entry(entry);
    }
    let mut mappings: Vec<(&str, &str)> = registry.relinker().iter().collect();
    mappings.sort_unstable();
    for &(original, committed) in &mappings {
        debug!(original, committed, "relinked");
    }
    let relinked = mappings.len();
    if relinked > 0 {
        out::print_success(&format!("{relinked} path(s) relinked"));
    }
}
