//! User-facing terminal output.
//! Colors are enabled only when stdout is a TTY.

use owo_colors::OwoColorize;

use crate::registry::{PathEntry, ProbeStatus};

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// One report line for an entry: `<status> <kind> <original> -> <destination>`.
///
/// The destination is the committed path, followed by the staged path in
/// brackets when the two differ. Plain text is stable for scripting.
pub fn format_entry(entry: &PathEntry) -> String {
    let mut line = format!(
        "{:<7} {:<4} {} -> {}",
        entry.uncommitted_status().to_string(),
        entry.kind().to_string(),
        entry.original_path(),
        entry.committed_path()
    );
    if entry.is_staged() {
        line.push_str(&format!(" [staged: {}]", entry.uncommitted_path()));
    }
    line
}

pub fn print_entry(entry: &PathEntry) {
    let line = format_entry(entry);
    if !is_tty() {
        println!("{line}");
        return;
    }
    match entry.uncommitted_status() {
        ProbeStatus::Exists => println!("{}", line.green()),
        ProbeStatus::Missing => println!("{}", line.red()),
        ProbeStatus::Pending => println!("{}", line.dimmed()),
    }
}
