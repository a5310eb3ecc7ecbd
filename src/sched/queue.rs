/*!
 * Dispatch Queue
 * Thread-safe FIFO of ready processes with blocking consumption
 */

use crate::process::Process;
use log::trace;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Default)]
struct QueueInner {
    ready: VecDeque<Arc<Process>>,
    /// Workers currently holding a popped process (an in-flight burst or
    /// admission attempt). Guarded here so the idle check is atomic with
    /// queue shape.
    active: usize,
    shutdown: bool,
}

/// FIFO of processes awaiting a core.
///
/// Arrival order holds except for two explicit exceptions: round-robin
/// re-enqueues an unfinished process at the tail after its quantum, and
/// FCFS re-enqueues an admission-denied process at the front so it retries
/// ahead of strictly later arrivals without stalling its worker.
#[derive(Default)]
pub struct DispatchQueue {
    inner: Mutex<QueueInner>,
    available: Condvar,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue at the tail and wake one blocked consumer.
    pub fn push_back(&self, process: Arc<Process>) {
        {
            let mut inner = self.inner.lock();
            trace!("Enqueued {} at tail", process.name());
            inner.ready.push_back(process);
        }
        self.available.notify_one();
    }

    /// Enqueue at the head: the FCFS admission-retry path.
    pub fn push_front(&self, process: Arc<Process>) {
        {
            let mut inner = self.inner.lock();
            trace!("Enqueued {} at head", process.name());
            inner.ready.push_front(process);
        }
        self.available.notify_one();
    }

    /// Block until a process is available or shutdown is observed.
    ///
    /// The shutdown flag is checked before the queue: a worker waking after
    /// `shutdown()` returns `None` even if entries remain, so it exits
    /// without side effects.
    pub fn pop_blocking(&self) -> Option<Arc<Process>> {
        let mut inner = self.inner.lock();
        loop {
            if inner.shutdown {
                return None;
            }
            if let Some(process) = inner.ready.pop_front() {
                inner.active += 1;
                return Some(process);
            }
            self.available.wait(&mut inner);
        }
    }

    /// A worker finished its iteration for a popped process. When the queue
    /// is empty with no other worker mid-iteration, runs `on_idle` while
    /// still holding the queue lock: a concurrent `submit` cannot enqueue
    /// (nor another worker pop) between the idle decision and the idle work.
    /// Returns whether the idle path ran.
    pub fn task_done(&self, on_idle: impl FnOnce()) -> bool {
        let mut inner = self.inner.lock();
        inner.active = inner.active.saturating_sub(1);
        let idle = inner.active == 0 && inner.ready.is_empty();
        if idle {
            on_idle();
        }
        idle
    }

    /// Set the shutdown flag and wake all waiters. Idempotent.
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.lock();
            inner.shutdown = true;
        }
        self.available.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.lock().shutdown
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().ready.is_empty()
    }
}
