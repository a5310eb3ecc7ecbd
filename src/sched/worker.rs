/*!
 * Dispatch Worker
 * Per-core loop: pop, admit, burst, requeue or finish
 */

use super::{SchedulerCore, SchedulerState};
use crate::config::SchedulingPolicy;
use crate::memory::MemoryError;
use crate::process::Process;
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread;

/// Worker entry point. Runs until shutdown is observed on the queue.
pub(super) fn run(core: Arc<SchedulerCore>, core_id: usize) {
    debug!("Worker {} started", core_id);

    while let Some(process) = core.queue.pop_blocking() {
        if admit(&core, &process) {
            run_burst(&core, core_id, &process);
        }

        core.queue.task_done(|| idle_transition(&core));
    }

    debug!("Worker {} exiting", core_id);
}

/// Obtain memory for the process. Returns whether it may run a burst now.
///
/// A process that kept residency across a round-robin quantum skips
/// allocation entirely; eviction is never performed for an already-resident
/// process.
fn admit(core: &SchedulerCore, process: &Arc<Process>) -> bool {
    if core.memory.is_resident(process.name()) {
        return true;
    }

    match core.memory.allocate(process) {
        Ok(()) => {
            core.memory.unstash(process.name());
            true
        }
        Err(MemoryError::NoCapacity { .. }) => match core.policy {
            // FCFS: retry ahead of later arrivals, but never stall the
            // worker behind memory it cannot yet obtain.
            SchedulingPolicy::Fcfs => {
                debug!(
                    "Admission denied for {}; re-queueing at front",
                    process.name()
                );
                core.queue.push_front(Arc::clone(process));
                // One tick of backoff keeps the retry loop from spinning
                // while every resident burst is still in flight.
                thread::sleep(core.tick_delay);
                false
            }
            // RR: evict the oldest residents until the requester fits.
            SchedulingPolicy::Rr => evict_until_admitted(core, process),
        },
        Err(e) => {
            warn!("Admission failed for {}: {}", process.name(), e);
            core.queue.push_front(Arc::clone(process));
            false
        }
    }
}

/// Round-robin denial path: evict the longest-resident process, complete
/// the eviction (deallocate plus backing-store insertion), then retry.
///
/// The victim is chosen before each retry and is never the requester (a
/// denied requester is by definition not resident).
fn evict_until_admitted(core: &SchedulerCore, process: &Arc<Process>) -> bool {
    loop {
        let victim = match core.memory.oldest_resident() {
            Some(victim) => victim,
            None => {
                // Nothing left to evict: the footprint exceeds total
                // capacity. Keep the process at the front for visibility.
                warn!(
                    "{} cannot be admitted even with memory empty; re-queueing",
                    process.name()
                );
                core.queue.push_front(Arc::clone(process));
                thread::sleep(core.tick_delay);
                return false;
            }
        };
        debug_assert_ne!(victim, process.name());

        let victim_process = match core.registry.resolve(&victim) {
            Ok(p) => p,
            Err(e) => {
                // Stale allocator tracking; keep the requester alive
                warn!("Eviction victim lookup failed: {}", e);
                core.queue.push_front(Arc::clone(process));
                return false;
            }
        };

        match core.memory.deallocate(&victim_process) {
            Ok(()) => {
                core.memory.stash(&victim);
                debug!("Evicted {} to backing store", victim);
            }
            // Another worker evicted the same victim first; retry with a
            // fresh victim.
            Err(MemoryError::NotResident(_)) => {}
            Err(e) => {
                warn!("Eviction of {} failed: {}", victim, e);
                core.queue.push_front(Arc::clone(process));
                return false;
            }
        }

        match core.memory.allocate(process) {
            Ok(()) => {
                core.memory.unstash(process.name());
                return true;
            }
            Err(MemoryError::NoCapacity { .. }) => continue,
            Err(e) => {
                warn!("Admission retry failed for {}: {}", process.name(), e);
                core.queue.push_front(Arc::clone(process));
                return false;
            }
        }
    }
}

/// Run one burst: FCFS runs every remaining tick, RR at most the quantum.
fn run_burst(core: &SchedulerCore, core_id: usize, process: &Arc<Process>) {
    // First admission pins the process; later bursts keep the pin.
    let pinned = process.pin_core(core_id);
    process.set_running(true);
    core.stats.acquire_core();

    let ticks = match core.policy {
        SchedulingPolicy::Fcfs => process.remaining_ticks(),
        SchedulingPolicy::Rr => core.quantum.min(process.remaining_ticks()),
    };

    let mut interrupted = false;
    for _ in 0..ticks {
        thread::sleep(core.tick_delay);
        process.advance();
        core.stats.inc_active_tick();

        let free = core.stats.cores_available();
        if free > 0 {
            core.stats.add_idle_ticks(free as u64);
        }

        // Shutdown is observed at tick granularity; the in-flight tick
        // above has already completed.
        if core.queue.is_shutdown() {
            interrupted = true;
            break;
        }
    }

    process.set_running(false);
    core.stats.release_core();

    if interrupted {
        return;
    }

    if process.is_finished() {
        // Finished processes always release their memory, under either
        // policy and either backend.
        match core.memory.deallocate(process) {
            Ok(()) => {}
            Err(MemoryError::NotResident(_)) => {
                warn!("{} finished while not resident", process.name());
            }
            Err(e) => warn!("Release failed for {}: {}", process.name(), e),
        }
        process.mark_finished();
        info!("Process {} finished on core {}", process.name(), pinned);
    } else {
        // Quantum expired with work left: back to the tail, residency kept
        // so the next dispatch skips re-allocation.
        core.queue.push_back(Arc::clone(process));
    }
}

/// The queue drained with no in-flight bursts: reset core accounting.
/// Runs under the dispatch queue lock via `task_done`.
fn idle_transition(core: &SchedulerCore) {
    let mut state = core.state.write();
    if *state == SchedulerState::Running {
        *state = SchedulerState::Idle;
        core.stats.reset_cores();
        debug!("Scheduler idle: queue drained with no in-flight bursts");
    }
}
