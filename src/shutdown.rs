//! Process-wide shutdown coordination.
//! The Ctrl-C handler sets a flag; the CLI polls it while waiting for probe results.
//!
//! Relaxed atomics are sufficient for a one-way "stop" flag.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::RelinkError;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Request a cooperative shutdown (idempotent).
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Err(Interrupted) once a shutdown was requested.
pub fn check() -> Result<(), RelinkError> {
    if is_requested() {
        Err(RelinkError::Interrupted)
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn reset() {
    SHUTDOWN.store(false, Ordering::Relaxed);
}
