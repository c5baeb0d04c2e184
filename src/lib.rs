//! Core library for `relink_probe`.
//!
//! Tracks paths a user may relink to new locations. Edits are staged, checked
//! for collisions, and committed or rolled back as a whole, while a background
//! thread reports whether every staged path exists on disk.
//!
//! The CLI binary lives in `main.rs`; this library exposes the registry, the
//! probe machinery, configuration and CLI parsing for tests and embedding.

pub mod cli;
pub mod config;
pub mod errors;
pub mod output;
pub mod path;
pub mod probe;
pub mod registry;
pub mod shutdown;

pub use config::{
    create_template_config, default_config_path, default_log_path, load_config_from_xml,
    load_config_from_xml_path, path_has_symlink_ancestor, Config, LoadResult, LogLevel,
};
pub use errors::RelinkError;
pub use path::{PathKind, RelinkablePath};
pub use probe::{
    ExistenceCheck, FsExistenceCheck, OutOfMemoryHandler, ProbeQueue, ProbeResponse, ProbeTask,
    StatusProbeQueue, StatusProbeWorker,
};
pub use registry::{PathEntry, ProbeStatus, RegistryEvent, Relinker, RelinkingRegistry};
