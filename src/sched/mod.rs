/*!
 * Scheduler
 * Per-core dispatch workers over a shared queue and memory backend
 */

mod queue;
mod stats;
mod worker;

pub use queue::DispatchQueue;
pub use stats::{CpuStats, SchedulerStats};

use crate::config::{SchedulingPolicy, SimConfig};
use crate::memory::MemoryBackend;
use crate::process::{Process, ProcessRegistry};
use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

/// Scheduler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler is stopped")]
    Stopped,
}

/// Scheduler lifecycle state
///
/// `Idle` is entered implicitly when the queue drains with zero in-flight
/// bursts; `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Init,
    Running,
    Idle,
    Stopped,
}

/// State shared by every worker thread.
pub(crate) struct SchedulerCore {
    pub policy: SchedulingPolicy,
    pub quantum: u64,
    pub tick_delay: Duration,
    pub num_cores: usize,
    pub queue: DispatchQueue,
    pub memory: Arc<dyn MemoryBackend>,
    pub registry: ProcessRegistry,
    pub stats: CpuStats,
    pub state: RwLock<SchedulerState>,
}

/// Process dispatcher: one OS thread per configured core.
///
/// Each worker pulls a ready process, obtains memory from the configured
/// backend, runs a bounded burst, then requeues or finishes the process.
pub struct Scheduler {
    core: Arc<SchedulerCore>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        config: &SimConfig,
        registry: ProcessRegistry,
        memory: Arc<dyn MemoryBackend>,
    ) -> Self {
        let tick_delay = config.tick_delay();
        Self::with_tick_delay(config, registry, memory, tick_delay)
    }

    /// Construct with an explicit burst tick duration (tests use
    /// millisecond ticks instead of the configured delay).
    pub fn with_tick_delay(
        config: &SimConfig,
        registry: ProcessRegistry,
        memory: Arc<dyn MemoryBackend>,
        tick_delay: Duration,
    ) -> Self {
        Self {
            core: Arc::new(SchedulerCore {
                policy: config.scheduler,
                quantum: config.quantum_cycles,
                tick_delay,
                num_cores: config.num_cpu,
                queue: DispatchQueue::new(),
                memory,
                registry,
                stats: CpuStats::new(config.num_cpu),
                state: RwLock::new(SchedulerState::Init),
            }),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Spawn one worker per configured core. A second call is a no-op.
    pub fn start(&self) {
        {
            let mut state = self.core.state.write();
            if *state != SchedulerState::Init {
                warn!("start() ignored in state {:?}", *state);
                return;
            }
            *state = SchedulerState::Running;
        }

        info!(
            "Scheduler starting: {} cores, {:?}, quantum {} ticks",
            self.core.num_cores, self.core.policy, self.core.quantum
        );

        let mut workers = self.workers.lock();
        for core_id in 0..self.core.num_cores {
            let core = Arc::clone(&self.core);
            workers.push(std::thread::spawn(move || worker::run(core, core_id)));
        }
    }

    /// Submit a process. The sole injection point for new work; safe to call
    /// concurrently from any thread.
    pub fn submit(&self, process: Arc<Process>) -> Result<(), SchedulerError> {
        {
            let mut state = self.core.state.write();
            match *state {
                SchedulerState::Stopped => return Err(SchedulerError::Stopped),
                SchedulerState::Idle => *state = SchedulerState::Running,
                _ => {}
            }
        }
        self.core.queue.push_back(process);
        Ok(())
    }

    /// Shut down the workers. Terminal and idempotent; latency is bounded
    /// by one burst tick's sleep (an in-flight tick completes first).
    pub fn stop(&self) {
        {
            let mut state = self.core.state.write();
            if *state == SchedulerState::Stopped {
                return;
            }
            *state = SchedulerState::Stopped;
        }

        self.core.queue.shutdown();
        let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                warn!("Worker thread panicked during shutdown");
            }
        }
        info!("Scheduler stopped");
    }

    pub fn state(&self) -> SchedulerState {
        *self.core.state.read()
    }

    pub fn queued(&self) -> usize {
        self.core.queue.len()
    }

    /// Read-only counter snapshot for the reporting collaborator.
    pub fn stats(&self) -> SchedulerStats {
        self.core.stats.snapshot(self.core.policy, self.state())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
