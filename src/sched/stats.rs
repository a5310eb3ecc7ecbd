/*!
 * Scheduler Statistics
 * Lock-free counters shared by every worker
 */

use super::SchedulerState;
use crate::config::SchedulingPolicy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Atomic CPU counters.
///
/// Workers update these concurrently from their burst loops; relaxed
/// ordering is enough since each value is independently meaningful for
/// monitoring.
pub struct CpuStats {
    total_cores: usize,
    cores_used: AtomicUsize,
    cores_available: AtomicUsize,
    active_ticks: AtomicU64,
    idle_ticks: AtomicU64,
}

impl CpuStats {
    pub fn new(total_cores: usize) -> Self {
        Self {
            total_cores,
            cores_used: AtomicUsize::new(0),
            cores_available: AtomicUsize::new(total_cores),
            active_ticks: AtomicU64::new(0),
            idle_ticks: AtomicU64::new(0),
        }
    }

    /// A worker enters a burst: one fewer core available.
    #[inline]
    pub fn acquire_core(&self) {
        self.cores_used.fetch_add(1, Ordering::Relaxed);
        self.cores_available.fetch_sub(1, Ordering::Relaxed);
    }

    /// A worker leaves a burst. Saturating: a release that lands after an
    /// idle reset must not wrap the counters.
    #[inline]
    pub fn release_core(&self) {
        let _ = self
            .cores_used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                Some(used.saturating_sub(1))
            });
        let total = self.total_cores;
        let _ = self
            .cores_available
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |available| {
                Some((available + 1).min(total))
            });
    }

    /// Idle transition: no queued work and no in-flight bursts.
    pub fn reset_cores(&self) {
        self.cores_used.store(0, Ordering::Relaxed);
        self.cores_available.store(self.total_cores, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_active_tick(&self) {
        self.active_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Accrue idle ticks for currently free cores (approximates lost
    /// parallelism during a tick).
    #[inline]
    pub fn add_idle_ticks(&self, free_cores: u64) {
        self.idle_ticks.fetch_add(free_cores, Ordering::Relaxed);
    }

    pub fn cores_used(&self) -> usize {
        self.cores_used.load(Ordering::Relaxed)
    }

    pub fn cores_available(&self) -> usize {
        self.cores_available.load(Ordering::Relaxed)
    }

    pub fn active_ticks(&self) -> u64 {
        self.active_ticks.load(Ordering::Relaxed)
    }

    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, policy: SchedulingPolicy, state: SchedulerState) -> SchedulerStats {
        let used = self.cores_used();
        SchedulerStats {
            policy,
            state,
            total_cores: self.total_cores,
            cores_used: used,
            cores_available: self.cores_available(),
            active_ticks: self.active_ticks(),
            idle_ticks: self.idle_ticks(),
            cpu_utilization: if self.total_cores == 0 {
                0.0
            } else {
                used as f64 / self.total_cores as f64 * 100.0
            },
        }
    }
}

/// Read-only scheduler statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    pub policy: SchedulingPolicy,
    pub state: SchedulerState,
    pub total_cores: usize,
    pub cores_used: usize,
    pub cores_available: usize,
    pub active_ticks: u64,
    pub idle_ticks: u64,
    pub cpu_utilization: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_accounting() {
        let stats = CpuStats::new(4);
        assert_eq!(stats.cores_available(), 4);

        stats.acquire_core();
        stats.acquire_core();
        assert_eq!(stats.cores_used(), 2);
        assert_eq!(stats.cores_available(), 2);

        stats.release_core();
        assert_eq!(stats.cores_used(), 1);

        stats.reset_cores();
        assert_eq!(stats.cores_used(), 0);
        assert_eq!(stats.cores_available(), 4);
    }

    #[test]
    fn test_release_after_reset_stays_bounded() {
        let stats = CpuStats::new(2);
        stats.acquire_core();

        // An idle reset racing an in-flight burst: the burst's release
        // lands after the reset and must not wrap either counter
        stats.reset_cores();
        stats.release_core();
        assert_eq!(stats.cores_used(), 0);
        assert_eq!(stats.cores_available(), 2);
    }

    #[test]
    fn test_tick_counters() {
        let stats = CpuStats::new(2);
        stats.inc_active_tick();
        stats.inc_active_tick();
        stats.add_idle_ticks(1);
        assert_eq!(stats.active_ticks(), 2);
        assert_eq!(stats.idle_ticks(), 1);
    }
}
