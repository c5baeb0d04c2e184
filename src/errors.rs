//! Typed error definitions for relink_probe.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelinkError {
    #[error("Failed to start the status probe thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error("Commit would merge several paths into {destination}")]
    MergeConflict { destination: String },

    #[error("Invalid replacement '{0}': expected OLD=NEW")]
    InvalidReplacement(String),

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl RelinkError {
    /// Stable numeric code for structured logs and exit statuses.
    pub fn code(&self) -> i32 {
        match self {
            RelinkError::WorkerSpawn(_) => 10,
            RelinkError::MergeConflict { .. } => 20,
            RelinkError::InvalidReplacement(_) => 30,
            RelinkError::Interrupted => 130,
        }
    }
}
