//! Background thread that drains the probe queue.
//!
//! Results are sent over an mpsc channel and never waited on; the owner
//! applies them whenever it drains its receiver.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use super::check::ExistenceCheck;
use super::oom::OutOfMemoryHandler;
use super::queue::StatusProbeQueue;
use crate::errors::RelinkError;
use crate::registry::ProbeStatus;

const THREAD_NAME: &str = "relink-status-probe";

/// Outcome of one existence check, addressed to a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub path: String,
    pub row: usize,
    pub status: ProbeStatus,
}

/// Owns the probe thread. Dropping it stops the thread and waits for it.
pub struct StatusProbeWorker {
    queue: Arc<StatusProbeQueue>,
    handle: Option<JoinHandle<()>>,
}

impl StatusProbeWorker {
    pub fn spawn(
        checker: Arc<dyn ExistenceCheck>,
        responses: Sender<ProbeResponse>,
    ) -> Result<Self, RelinkError> {
        let queue = Arc::new(StatusProbeQueue::new());
        let handle = {
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || run(&queue, checker.as_ref(), &responses))
                .map_err(RelinkError::WorkerSpawn)?
        };
        Ok(Self {
            queue,
            handle: Some(handle),
        })
    }

    /// Queue a check of `path` for `row`. False if the request was dropped.
    pub fn request_status_update(&self, path: &str, row: usize) -> bool {
        self.queue.request(path, row)
    }

    pub fn queue(&self) -> &StatusProbeQueue {
        &self.queue
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread and join it. Idempotent.
    pub fn stop(&mut self) {
        self.queue.stop();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("status probe thread ended with a panic");
        }
    }
}

impl Drop for StatusProbeWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(queue: &StatusProbeQueue, checker: &dyn ExistenceCheck, responses: &Sender<ProbeResponse>) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| drain(queue, checker, responses)));
    if outcome.is_err() {
        queue.stop();
        OutOfMemoryHandler::instance().handle();
    }
}

fn drain(queue: &StatusProbeQueue, checker: &dyn ExistenceCheck, responses: &Sender<ProbeResponse>) {
    debug!("status probe worker started");
    while let Some(task) = queue.next_task() {
        // Queue lock is not held here.
        let status = ProbeStatus::from_exists(checker.exists(&task.path));
        trace!(path = %task.path, row = task.row, %status, "probed");

        let delivered = responses
            .send(ProbeResponse {
                path: task.path,
                row: task.row,
                status,
            })
            .is_ok();
        queue.finish_task();

        if !delivered {
            debug!("probe results receiver is gone");
            queue.stop();
            break;
        }
    }
    debug!("status probe worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::{Condvar, Mutex};
    use std::time::{Duration, Instant};

    /// Blocks every check of `gate_path` until `open()` is called.
    struct GatedCheck {
        gate_path: &'static str,
        opened: Mutex<bool>,
        cond: Condvar,
    }

    impl GatedCheck {
        fn new(gate_path: &'static str) -> Arc<Self> {
            Arc::new(Self {
                gate_path,
                opened: Mutex::new(false),
                cond: Condvar::new(),
            })
        }

        fn open(&self) {
            *self.opened.lock().unwrap() = true;
            self.cond.notify_all();
        }
    }

    impl ExistenceCheck for GatedCheck {
        fn exists(&self, path: &str) -> bool {
            if path == self.gate_path {
                let mut opened = self.opened.lock().unwrap();
                while !*opened {
                    opened = self.cond.wait(opened).unwrap();
                }
            }
            path.ends_with(".txt")
        }
    }

    fn wait_for_in_flight(worker: &StatusProbeWorker, path: &str) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while worker.queue().in_flight().as_deref() != Some(path) {
            assert!(Instant::now() < deadline, "worker never picked up {path}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn reports_exists_and_missing() {
        let (tx, rx) = mpsc::channel();
        let worker = StatusProbeWorker::spawn(Arc::new(|p: &str| p == "/here"), tx).unwrap();
        worker.request_status_update("/here", 0);
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        worker.request_status_update("/gone", 1);
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert_eq!(first, ProbeResponse { path: "/here".into(), row: 0, status: ProbeStatus::Exists });
        assert_eq!(second, ProbeResponse { path: "/gone".into(), row: 1, status: ProbeStatus::Missing });
    }

    #[test]
    fn serves_re_requested_path_last_and_drops_in_flight_duplicates() {
        let check = GatedCheck::new("/gate.txt");
        let (tx, rx) = mpsc::channel();
        let worker = StatusProbeWorker::spawn(check.clone(), tx).unwrap();

        assert!(worker.request_status_update("/gate.txt", 0));
        wait_for_in_flight(&worker, "/gate.txt");
        assert!(!worker.request_status_update("/gate.txt", 9));

        worker.request_status_update("/a.txt", 1);
        worker.request_status_update("/b.txt", 2);
        worker.request_status_update("/a.txt", 3);
        assert_eq!(worker.queue().len(), 2);
        check.open();

        let got: Vec<ProbeResponse> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        let order: Vec<(&str, usize)> = got.iter().map(|r| (r.path.as_str(), r.row)).collect();
        assert_eq!(order, vec![("/gate.txt", 0), ("/b.txt", 2), ("/a.txt", 3)]);
    }

    #[test]
    fn drop_joins_the_thread() {
        let (tx, _rx) = mpsc::channel();
        let mut worker = StatusProbeWorker::spawn(Arc::new(|_: &str| true), tx).unwrap();
        assert!(worker.is_running());
        worker.stop();
        assert!(!worker.is_running());
        assert!(!worker.request_status_update("/x", 0));
    }

    #[test]
    fn panicking_check_is_routed_to_handler() {
        let before = OutOfMemoryHandler::instance().times_handled();
        let (tx, rx) = mpsc::channel();
        let worker = StatusProbeWorker::spawn(
            Arc::new(|p: &str| {
                if p == "/boom" {
                    panic!("simulated exhaustion");
                }
                true
            }),
            tx,
        )
        .unwrap();
        worker.request_status_update("/boom", 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        while worker.is_running() {
            assert!(Instant::now() < deadline, "worker did not stop");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(OutOfMemoryHandler::instance().times_handled() > before);
        assert!(rx.try_recv().is_err());
        assert!(!worker.request_status_update("/after", 1));
    }
}
