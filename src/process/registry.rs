/*!
 * Process Registry
 * Sole owner of process records; everything else resolves by id
 */

use super::types::{ProcessError, ProcessInfo, ProcessResult};
use super::Process;
use crate::core::Pid;
use ahash::RandomState;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;

/// Registry of every process submitted during a run.
///
/// Records are never removed: finished processes stay registered for
/// terminal reporting. The scheduler and both allocators hold ids and
/// resolve back through `lookup`.
#[derive(Clone, Default)]
pub struct ProcessRegistry {
    processes: Arc<DashMap<Pid, Arc<Process>, RandomState>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            processes: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    /// Register a new process under its id. Ids are unique for a run.
    pub fn register(&self, process: Arc<Process>) -> ProcessResult<()> {
        let pid = process.name().to_string();
        match self.processes.entry(pid.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ProcessError::Duplicate(pid)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                debug!("Registered process {}", pid);
                slot.insert(process);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Process>> {
        self.processes.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Resolve an id that invariantly must exist (eviction victims, resident
    /// owners). A miss indicates stale allocator tracking.
    pub fn resolve(&self, name: &str) -> ProcessResult<Arc<Process>> {
        self.lookup(name)
            .ok_or_else(|| ProcessError::NotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Snapshot of every registered process, for status reports.
    pub fn snapshot(&self) -> Vec<ProcessInfo> {
        let mut infos: Vec<ProcessInfo> = self
            .processes
            .iter()
            .map(|entry| entry.value().info())
            .collect();
        infos.sort_by(|a, b| a.pid.cmp(&b.pid));
        infos
    }
}
