//! Registry invariants: uniqueness, staleness, merges, commit/rollback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use relink_probe::{PathKind, ProbeResponse, ProbeStatus, RelinkingRegistry};

fn registry(check: fn(&str) -> bool) -> RelinkingRegistry {
    RelinkingRegistry::with_checker(Arc::new(check)).expect("spawn worker")
}

fn settle(reg: &mut RelinkingRegistry) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while reg.has_pending_probes() {
        assert!(Instant::now() < deadline, "probes did not settle");
        reg.wait_for_responses(1, Duration::from_millis(50));
    }
}

#[test]
fn row_count_equals_distinct_normalized_paths() {
    let mut reg = registry(|_| true);
    let inputs = ["/a", "/a/", "/b", r"\a", "/b/./", "/c/../b", "/c"];
    for p in inputs {
        reg.add_path(p, PathKind::File);
    }
    assert_eq!(reg.len(), 3);
    let originals: Vec<&str> = reg.entries().iter().map(|e| e.original_path()).collect();
    assert_eq!(originals, vec!["/a", "/b", "/c"]);
}

#[test]
fn stale_probe_result_does_not_touch_new_staged_path() {
    let mut reg = registry(|p| p.starts_with("/new"));
    reg.add_path("/old/a", PathKind::File);
    reg.replace_prefix("/old", "/new", PathKind::Directory);
    settle(&mut reg);

    let e = reg.entry(0).unwrap();
    assert_eq!(e.uncommitted_path(), "/new/a");
    assert_eq!(e.uncommitted_status(), ProbeStatus::Exists);

    // A late answer for the old path only concerns the committed side.
    reg.apply_response(ProbeResponse { path: "/old/a".into(), row: 0, status: ProbeStatus::Missing });
    let e = reg.entry(0).unwrap();
    assert_eq!(e.uncommitted_status(), ProbeStatus::Exists);
    assert_eq!(e.committed_status(), ProbeStatus::Missing);
}

#[test]
fn merge_detection_matches_duplicate_destinations() {
    let mut dup = registry(|_| false);
    for p in ["/a/x", "/a/y", "/b/x"] {
        dup.add_path(p, PathKind::File);
    }
    dup.replace_prefix("/b/x", "/a/x", PathKind::File);
    assert!(dup.check_for_merges());

    let mut distinct = registry(|_| false);
    for p in ["/a/x", "/a/y", "/a/z"] {
        distinct.add_path(p, PathKind::File);
    }
    assert!(!distinct.check_for_merges());
}

#[test]
fn rollback_round_trip_creates_no_mapping() {
    let mut reg = registry(|_| true);
    for p in ["/lib/one", "/lib/two", "/etc/three"] {
        reg.add_path(p, PathKind::File);
    }
    reg.commit_changes();

    reg.replace_prefix("/lib", "/usr/lib", PathKind::Directory);
    reg.replace_prefix("/etc/three", "/opt/three", PathKind::File);
    reg.rollback_changes();

    for e in reg.entries() {
        assert_eq!(e.uncommitted_path(), e.committed_path());
        assert_eq!(e.committed_path(), e.original_path());
        assert_eq!(reg.relinker().substitution_for(e.original_path()), e.original_path());
    }
    assert!(reg.relinker().is_empty());
}

#[test]
fn commit_maps_changed_originals_and_leaves_others_identity() {
    let mut reg = registry(|_| true);
    for p in ["/lib/one", "/lib/two", "/etc/three"] {
        reg.add_path(p, PathKind::File);
    }
    reg.replace_prefix("/lib", "/usr/lib", PathKind::Directory);
    reg.commit_changes();

    let r = reg.relinker();
    assert_eq!(r.substitution_for("/lib/one"), "/usr/lib/one");
    assert_eq!(r.substitution_for("/lib/two"), "/usr/lib/two");
    assert_eq!(r.substitution_for("/etc/three"), "/etc/three");
    assert_eq!(reg.entry(0).unwrap().committed_path(), "/usr/lib/one");
    assert!(!reg.has_uncommitted_changes());
}

#[test]
fn process_responses_drains_without_blocking() {
    let mut reg = registry(|_| true);
    reg.add_path("/x", PathKind::File);
    settle(&mut reg);
    assert_eq!(reg.process_responses(), 0);
    assert_eq!(reg.entry(0).unwrap().uncommitted_status(), ProbeStatus::Exists);
}
