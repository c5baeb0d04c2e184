//! Process-wide handler for the probe worker's fatal failures.
//!
//! The worker routes a failure caught at its loop boundary here instead of
//! letting it tear down the process. By default the handler only logs; an
//! application may install its own callback (e.g. to warn the user and save
//! state).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::error;

type Callback = Box<dyn Fn() + Send + Sync>;

pub struct OutOfMemoryHandler {
    callback: Mutex<Option<Callback>>,
    handled: AtomicUsize,
}

static INSTANCE: OnceLock<OutOfMemoryHandler> = OnceLock::new();

impl OutOfMemoryHandler {
    pub fn instance() -> &'static OutOfMemoryHandler {
        INSTANCE.get_or_init(|| OutOfMemoryHandler {
            callback: Mutex::new(None),
            handled: AtomicUsize::new(0),
        })
    }

    /// Replace the callback run by `handle()`.
    pub fn set_callback<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(f));
    }

    /// Record the situation and run the installed callback, if any. Never panics.
    pub fn handle(&self) {
        let n = self.handled.fetch_add(1, Ordering::Relaxed) + 1;
        error!(occurrences = n, "Status probe worker ran out of resources; probing stopped");
        let guard = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cb) = guard.as_ref() {
            cb();
        }
    }

    /// How many times `handle()` has run in this process.
    pub fn times_handled(&self) -> usize {
        self.handled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_counts_occurrences() {
        let h = OutOfMemoryHandler::instance();
        let before = h.times_handled();
        h.handle();
        assert!(h.times_handled() > before);
    }
}
