//! The relinking registry.
//!
//! Owns the ordered entries, the published Relinker and the probe worker.
//! Edits are staged in each entry's uncommitted path; `commit_changes()`
//! publishes them and `rollback_changes()` discards them. Probe results come
//! back over a channel and are applied by `process_responses()` or
//! `wait_for_responses()` on the owner's thread.
//!
//! Notes:
//! - Rows are never removed, so a row index stays valid for the registry's lifetime.
//! - A probe result is applied per field only if that field still holds the probed path.

mod entry;
mod notify;
mod relinker;

pub use entry::{PathEntry, ProbeStatus};
pub use notify::{Listener, RegistryEvent};
pub use relinker::Relinker;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::errors::RelinkError;
use crate::path::{ensure_ends_with_slash, PathKind, RelinkablePath};
use crate::probe::{ExistenceCheck, FsExistenceCheck, ProbeResponse, StatusProbeWorker};
use notify::{Listeners, SpanCoalescer};

pub struct RelinkingRegistry {
    // Declared first so the worker is stopped and joined before anything else is dropped.
    worker: StatusProbeWorker,
    responses: Receiver<ProbeResponse>,
    entries: Vec<PathEntry>,
    original_paths: HashSet<String>,
    relinker: Relinker,
    have_uncommitted_changes: bool,
    listeners: Listeners,
}

impl std::fmt::Debug for RelinkingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelinkingRegistry")
            .field("entries", &self.entries)
            .field("relinker", &self.relinker)
            .field("have_uncommitted_changes", &self.have_uncommitted_changes)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl RelinkingRegistry {
    /// Registry probing the real filesystem.
    pub fn new() -> Result<Self, RelinkError> {
        Self::with_checker(Arc::new(FsExistenceCheck))
    }

    pub fn with_checker(checker: Arc<dyn ExistenceCheck>) -> Result<Self, RelinkError> {
        let (tx, rx) = mpsc::channel();
        let worker = StatusProbeWorker::spawn(checker, tx)?;
        Ok(Self {
            worker,
            responses: rx,
            entries: Vec::new(),
            original_paths: HashSet::new(),
            relinker: Relinker::new(),
            have_uncommitted_changes: true,
            listeners: Listeners::default(),
        })
    }

    /// Register a callback for change notifications.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(RegistryEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, row: usize) -> Option<&PathEntry> {
        self.entries.get(row)
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn relinker(&self) -> &Relinker {
        &self.relinker
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.have_uncommitted_changes
    }

    /// True while any entry's staged path still awaits a probe result.
    pub fn has_pending_probes(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.uncommitted_status == ProbeStatus::Pending)
    }

    /// Track `path`. Returns false if its normalized form is already tracked.
    pub fn add_path(&mut self, path: &str, kind: PathKind) -> bool {
        self.add_relinkable(&RelinkablePath::new(path, kind))
    }

    pub fn add_relinkable(&mut self, path: &RelinkablePath) -> bool {
        if !self.original_paths.insert(path.normalized_path().to_string()) {
            debug!(path = %path, "path already tracked");
            return false;
        }

        let row = self.entries.len();
        self.entries.push(PathEntry::new(path));
        self.listeners.emit(RegistryEvent::RowsInserted { first: row, last: row });
        self.request_status_update(row);
        true
    }

    /// Stage a substitution of `prefix` by `replacement` in uncommitted paths.
    ///
    /// With `PathKind::File` only file entries equal to `prefix` are touched.
    /// With `PathKind::Directory` every entry at or below `prefix` is touched.
    /// Returns the number of modified entries.
    pub fn replace_prefix(&mut self, prefix: &str, replacement: &str, kind: PathKind) -> usize {
        let mut slash_terminated = prefix.to_string();
        ensure_ends_with_slash(&mut slash_terminated);
        let bare = &slash_terminated[..slash_terminated.len() - 1];

        let mut spans = SpanCoalescer::new();
        let mut modified_count = 0;

        for row in 0..self.entries.len() {
            let entry = &mut self.entries[row];
            let replaced = match kind {
                PathKind::File => (entry.kind == PathKind::File && entry.uncommitted_path == prefix)
                    .then(|| replacement.to_string()),
                PathKind::Directory => {
                    if entry.uncommitted_path.starts_with(&slash_terminated) {
                        // Keep the separator that followed the prefix.
                        let suffix = &entry.uncommitted_path[slash_terminated.len() - 1..];
                        Some(format!("{replacement}{suffix}"))
                    } else if entry.uncommitted_path == bare {
                        Some(replacement.to_string())
                    } else {
                        None
                    }
                }
            };

            let modified = replaced.is_some();
            if let Some(new_path) = replaced {
                entry.uncommitted_path = new_path;
                modified_count += 1;
                self.have_uncommitted_changes = true;
                self.request_status_update(row);
            }
            spans.row(row, modified);
        }

        self.emit_changed(spans.finish(self.entries.len().checked_sub(1)));
        debug!(prefix, replacement, %kind, modified = modified_count, "replaced prefix");
        modified_count
    }

    /// True if committing now would send two or more entries to the same path.
    pub fn check_for_merges(&self) -> bool {
        let paths = self.sorted_uncommitted_paths();
        paths.windows(2).any(|w| w[0] == w[1])
    }

    /// Every staged destination claimed by more than one entry, sorted.
    pub fn merge_destinations(&self) -> Vec<String> {
        let paths = self.sorted_uncommitted_paths();
        let mut out: Vec<String> = paths
            .windows(2)
            .filter(|w| w[0] == w[1])
            .map(|w| w[0].to_string())
            .collect();
        out.dedup();
        out
    }

    fn sorted_uncommitted_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .entries
            .iter()
            .map(|e| e.uncommitted_path.as_str())
            .collect();
        paths.sort_unstable();
        paths
    }

    /// Publish staged paths and rebuild the Relinker from the entries that changed.
    pub fn commit_changes(&mut self) {
        if !self.have_uncommitted_changes {
            return;
        }

        let mut fresh = Relinker::new();
        let mut spans = SpanCoalescer::with_boundary();

        for (row, entry) in self.entries.iter_mut().enumerate() {
            let modified = entry.is_staged();
            if modified {
                entry.committed_path = entry.uncommitted_path.clone();
                entry.committed_status = entry.uncommitted_status;
                fresh.add_mapping(entry.original_path.clone(), entry.committed_path.clone());
            }
            spans.row(row, modified);
        }

        self.emit_changed(spans.finish(self.entries.len().checked_sub(1)));
        self.relinker.swap(&mut fresh);
        self.have_uncommitted_changes = false;
        info!(relinked = self.relinker.len(), "Committed staged paths");
    }

    /// Discard staged paths, restoring each entry's committed path and status.
    pub fn rollback_changes(&mut self) {
        if !self.have_uncommitted_changes {
            return;
        }

        let mut spans = SpanCoalescer::with_boundary();
        let mut restored = 0usize;

        for (row, entry) in self.entries.iter_mut().enumerate() {
            let modified = entry.is_staged();
            if modified {
                entry.uncommitted_path = entry.committed_path.clone();
                entry.uncommitted_status = entry.committed_status;
                restored += 1;
            }
            spans.row(row, modified);
        }

        self.emit_changed(spans.finish(self.entries.len().checked_sub(1)));
        self.have_uncommitted_changes = false;
        info!(restored, "Rolled back staged paths");
    }

    /// Apply one probe result, ignoring whatever no longer matches.
    pub fn apply_response(&mut self, response: ProbeResponse) {
        let Some(entry) = self.entries.get_mut(response.row) else {
            debug!(row = response.row, "probe result for unknown row dropped");
            return;
        };

        if entry.uncommitted_path == response.path {
            entry.uncommitted_status = response.status;
        }
        if entry.committed_path == response.path {
            entry.committed_status = response.status;
        }

        self.listeners.emit(RegistryEvent::RowsChanged {
            first: response.row,
            last: response.row,
        });
    }

    /// Apply every result that has already arrived, without blocking.
    pub fn process_responses(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(response) = self.responses.try_recv() {
            self.apply_response(response);
            applied += 1;
        }
        applied
    }

    /// Block until `count` results have been applied or `timeout` elapses.
    /// Returns how many were applied.
    pub fn wait_for_responses(&mut self, count: usize, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = 0;
        while applied < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.responses.recv_timeout(remaining) {
                Ok(response) => {
                    self.apply_response(response);
                    applied += 1;
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        applied
    }

    fn request_status_update(&mut self, row: usize) {
        let entry = &mut self.entries[row];
        entry.uncommitted_status = ProbeStatus::Pending;
        self.worker
            .request_status_update(&entry.uncommitted_path, row);
    }

    fn emit_changed(&mut self, spans: Vec<(usize, usize)>) {
        for (first, last) in spans {
            self.listeners.emit(RegistryEvent::RowsChanged { first, last });
        }
    }
}
