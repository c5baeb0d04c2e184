//! Binary smoke tests. Every run points RELINK_CONFIG at a temp config so the
//! user's config and log directories are never touched.

use assert_fs::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn write_config(dir: &Path) -> std::path::PathBuf {
    let cfg = dir.join("config.xml");
    let xml = format!(
        "<config>\n  <log_level>quiet</log_level>\n  <log_file>{}</log_file>\n  <probe_timeout_ms>5000</probe_timeout_ms>\n</config>\n",
        dir.join("relink.log").display()
    );
    fs::write(&cfg, xml).unwrap();
    cfg
}

fn relink(cfg: &Path, args: &[&str]) -> Output {
    let me = assert_cmd::cargo::cargo_bin!("relink");
    Command::new(me)
        .env("RELINK_CONFIG", cfg)
        .args(args)
        .output()
        .expect("spawn binary")
}

fn slash(p: &Path) -> String {
    dunce::canonicalize(p).unwrap().to_string_lossy().replace('\\', "/")
}

#[test]
fn print_config_succeeds() {
    let temp = assert_fs::TempDir::new().unwrap();
    let cfg = write_config(temp.path());
    let out = relink(&cfg, &["--print-config"]);
    assert!(out.status.success());
}

#[test]
fn reports_status_and_commits_relink() {
    let temp = assert_fs::TempDir::new().unwrap();
    let cfg = write_config(temp.path());
    temp.child("old").create_dir_all().unwrap();
    temp.child("new/page.tif").touch().unwrap();
    let root = slash(temp.path());
    let old = format!("{root}/old/page.tif");

    let out = relink(
        &cfg,
        &[&old, "--replace-dir", &format!("{root}/old={root}/new"), "--commit"],
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "stdout: {stdout}\nstderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(
        stdout.contains(&format!("exists  file {old} -> {root}/new/page.tif")),
        "unexpected report: {stdout}"
    );
    assert!(stdout.contains("1 path(s) relinked"));
}

#[test]
fn colliding_commit_is_refused() {
    let temp = assert_fs::TempDir::new().unwrap();
    let cfg = write_config(temp.path());
    let root = slash(temp.path());
    let a = format!("{root}/a.txt");
    let b = format!("{root}/b.txt");
    let c = format!("{root}/c.txt");

    let out = relink(
        &cfg,
        &[
            &a,
            &b,
            "--replace-file",
            &format!("{a}={c}"),
            "--replace-file",
            &format!("{b}={c}"),
            "--commit",
        ],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains(&c), "stderr: {stderr}");
}

#[test]
fn bad_replacement_spec_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let cfg = write_config(temp.path());
    let out = relink(&cfg, &["/x", "--replace-file", "nonsense"]);
    assert!(!out.status.success());
}

#[test]
fn json_logs_are_valid_json() {
    let temp = assert_fs::TempDir::new().unwrap();
    let cfg = write_config(temp.path());
    temp.child("a.txt").touch().unwrap();
    let a = format!("{}/a.txt", slash(temp.path()));

    let out = relink(&cfg, &[&a, "--json", "--log-level", "debug"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let json_lines: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).expect("log line is JSON"))
        .collect();
    assert!(!json_lines.is_empty(), "no JSON log lines in: {stdout}");
    assert!(json_lines.iter().all(|v| v.get("level").is_some()));
}
