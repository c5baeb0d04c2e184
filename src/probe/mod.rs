//! Asynchronous existence probing: queue, worker thread and their capabilities.

mod check;
mod oom;
mod queue;
mod worker;

pub use check::{ExistenceCheck, FsExistenceCheck};
pub use oom::OutOfMemoryHandler;
pub use queue::{ProbeQueue, ProbeTask, StatusProbeQueue};
pub use worker::{ProbeResponse, StatusProbeWorker};
