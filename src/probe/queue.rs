//! Pending existence checks.
//!
//! - `ProbeQueue` is the plain data structure: one task per path, plus a
//!   service order in which a re-requested path moves behind everything else.
//! - `StatusProbeQueue` puts it behind a mutex/condvar pair together with the
//!   path currently being checked and the stop flag.
//!
//! Notes:
//! - The lock is held only while the queue is mutated; the worker releases it
//!   before touching the filesystem.
//! - A request for the path that is in flight is dropped, and the row recorded
//!   for the in-flight check is left as it was.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::trace;

/// One queued existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTask {
    pub path: String,
    pub row: usize,
}

/// Path-keyed tasks with O(1) lookup, update, relocation and pop.
///
/// Backed by an unbounded `LruCache`: the least recently requested path is
/// served first, and touching a path makes it the most recent.
pub struct ProbeQueue {
    tasks: LruCache<String, usize>,
}

impl Default for ProbeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeQueue {
    pub fn new() -> Self {
        Self {
            tasks: LruCache::unbounded(),
        }
    }

    /// Insert a task for `path`, or update its row; either way it moves to the back.
    pub fn push(&mut self, path: &str, row: usize) {
        match self.tasks.get_mut(path) {
            Some(existing) => *existing = row,
            None => {
                self.tasks.put(path.to_owned(), row);
            }
        }
    }

    /// Take the task at the front of the service order.
    pub fn pop(&mut self) -> Option<ProbeTask> {
        self.tasks.pop_lru().map(|(path, row)| ProbeTask { path, row })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Row currently recorded for `path`, without reordering.
    pub fn row_for(&self, path: &str) -> Option<usize> {
        self.tasks.peek(path).copied()
    }

    /// Queued paths, next-to-be-served first.
    pub fn service_order(&self) -> Vec<String> {
        self.tasks.iter().rev().map(|(p, _)| p.clone()).collect()
    }
}

struct State {
    tasks: ProbeQueue,
    in_flight: Option<String>,
    exiting: bool,
}

/// Thread-safe front of `ProbeQueue` shared by the registry and the worker.
pub struct StatusProbeQueue {
    state: Mutex<State>,
    cond: Condvar,
}

impl Default for StatusProbeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusProbeQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                tasks: ProbeQueue::new(),
                in_flight: None,
                exiting: false,
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask for `path` to be checked on behalf of `row`.
    ///
    /// Returns false if the request was dropped: either the queue is stopping
    /// or `path` is being checked right now.
    pub fn request(&self, path: &str, row: usize) -> bool {
        {
            let mut st = self.lock();
            if st.exiting {
                return false;
            }
            if st.in_flight.as_deref() == Some(path) {
                trace!(path, row, "probe already in flight; request dropped");
                return false;
            }
            st.tasks.push(path, row);
        }
        self.cond.notify_one();
        true
    }

    /// Block until a task is available and mark it in flight.
    /// Returns None once `stop()` has been called.
    pub fn next_task(&self) -> Option<ProbeTask> {
        let mut st = self.lock();
        loop {
            if st.exiting {
                return None;
            }
            if let Some(task) = st.tasks.pop() {
                st.in_flight = Some(task.path.clone());
                return Some(task);
            }
            st = self.cond.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Clear the in-flight marker set by `next_task()`.
    pub fn finish_task(&self) {
        self.lock().in_flight = None;
    }

    /// Refuse further requests and wake every waiter.
    pub fn stop(&self) {
        self.lock().exiting = true;
        self.cond.notify_all();
    }

    pub fn is_stopping(&self) -> bool {
        self.lock().exiting
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    pub fn queued_row(&self, path: &str) -> Option<usize> {
        self.lock().tasks.row_for(path)
    }

    pub fn service_order(&self) -> Vec<String> {
        self.lock().tasks.service_order()
    }

    pub fn in_flight(&self) -> Option<String> {
        self.lock().in_flight.clone()
    }
}
