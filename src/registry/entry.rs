//! One tracked path and its liveness.

use std::fmt;

use crate::path::{PathKind, RelinkablePath};

/// Liveness of one path variant as last reported by the probe worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeStatus {
    /// A probe was requested and has not answered yet.
    #[default]
    Pending,
    Exists,
    Missing,
}

impl ProbeStatus {
    pub fn from_exists(exists: bool) -> Self {
        if exists { ProbeStatus::Exists } else { ProbeStatus::Missing }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProbeStatus::Pending => "pending",
            ProbeStatus::Exists => "exists",
            ProbeStatus::Missing => "missing",
        })
    }
}

/// A row in the registry.
///
/// `original_path` never changes. Edits land in `uncommitted_path` and only
/// reach `committed_path` through a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub(crate) original_path: String,
    pub(crate) committed_path: String,
    pub(crate) uncommitted_path: String,
    pub(crate) kind: PathKind,
    pub(crate) committed_status: ProbeStatus,
    pub(crate) uncommitted_status: ProbeStatus,
}

impl PathEntry {
    pub fn new(path: &RelinkablePath) -> Self {
        let normalized = path.normalized_path().to_string();
        Self {
            original_path: normalized.clone(),
            committed_path: normalized.clone(),
            uncommitted_path: normalized,
            kind: path.kind(),
            committed_status: ProbeStatus::Pending,
            uncommitted_status: ProbeStatus::Pending,
        }
    }

    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    pub fn committed_path(&self) -> &str {
        &self.committed_path
    }

    pub fn uncommitted_path(&self) -> &str {
        &self.uncommitted_path
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn committed_status(&self) -> ProbeStatus {
        self.committed_status
    }

    pub fn uncommitted_status(&self) -> ProbeStatus {
        self.uncommitted_status
    }

    /// True when the staged path differs from the committed one.
    pub fn is_staged(&self) -> bool {
        self.uncommitted_path != self.committed_path
    }
}
