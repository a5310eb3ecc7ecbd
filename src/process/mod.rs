/*!
 * Process Management
 * Simulated process records, lifecycle state, and the owning registry
 */

mod registry;
pub mod types;

pub use registry::ProcessRegistry;
pub use types::{ProcessError, ProcessInfo, ProcessResult, ProcessState};

use crate::core::{Pid, Size, Tick};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::SystemTime;

/// A simulated unit of work: an opaque instruction count plus a memory
/// footprint.
///
/// The registry is the sole owner; every other component holds an
/// `Arc<Process>` handle. Mutation is single-writer by protocol: only the
/// worker currently running this process's burst touches `progress`,
/// `core_affinity`, or the running flag, so the atomics exist for cheap
/// cross-thread visibility, not for contended updates.
pub struct Process {
    name: Pid,
    total_ticks: Tick,
    memory_required: Size,
    created_at: SystemTime,

    progress: AtomicU64,
    running: AtomicBool,
    memory_usage: AtomicUsize,
    core_affinity: RwLock<Option<usize>>,
    finished_at: RwLock<Option<SystemTime>>,
}

impl Process {
    pub fn new(name: impl Into<Pid>, total_ticks: Tick, memory_required: Size) -> Self {
        Self {
            name: name.into(),
            total_ticks,
            memory_required,
            created_at: SystemTime::now(),
            progress: AtomicU64::new(0),
            running: AtomicBool::new(false),
            memory_usage: AtomicUsize::new(0),
            core_affinity: RwLock::new(None),
            finished_at: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_ticks(&self) -> Tick {
        self.total_ticks
    }

    pub fn progress(&self) -> Tick {
        self.progress.load(Ordering::Acquire)
    }

    pub fn remaining_ticks(&self) -> Tick {
        self.total_ticks - self.progress()
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= self.total_ticks
    }

    /// Advance progress by one tick. Caller must hold the burst for this
    /// process; progress never exceeds the instruction count.
    pub fn advance(&self) -> Tick {
        debug_assert!(self.progress() < self.total_ticks);
        self.progress.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// Pin the process to a core on first admission; later bursts keep the
    /// original affinity. Returns the effective core id.
    pub fn pin_core(&self, core: usize) -> usize {
        let mut affinity = self.core_affinity.write();
        *affinity.get_or_insert(core)
    }

    pub fn core(&self) -> Option<usize> {
        *self.core_affinity.read()
    }

    pub fn memory_required(&self) -> Size {
        self.memory_required
    }

    /// Frames needed under a paging backend with the given frame size.
    pub fn num_pages(&self, frame_size: Size) -> Size {
        self.memory_required.div_ceil(frame_size)
    }

    pub fn memory_usage(&self) -> Size {
        self.memory_usage.load(Ordering::Acquire)
    }

    pub fn set_memory_usage(&self, usage: Size) {
        self.memory_usage.store(usage, Ordering::Release);
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<SystemTime> {
        *self.finished_at.read()
    }

    /// Stamp completion time and drop the running flag. Idempotent: the
    /// first stamp wins.
    pub fn mark_finished(&self) {
        self.running.store(false, Ordering::Release);
        let mut finished = self.finished_at.write();
        if finished.is_none() {
            *finished = Some(SystemTime::now());
        }
    }

    pub fn state(&self) -> ProcessState {
        if self.is_finished() {
            ProcessState::Finished
        } else if self.is_running() {
            ProcessState::Running
        } else {
            ProcessState::Ready
        }
    }

    /// Read-only snapshot for reporting.
    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.name.clone(),
            state: self.state(),
            progress: self.progress(),
            total_ticks: self.total_ticks,
            core: self.core(),
            memory_required: self.memory_required,
            memory_usage: self.memory_usage(),
        }
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("progress", &self.progress())
            .field("total_ticks", &self.total_ticks)
            .field("state", &self.state())
            .finish()
    }
}
