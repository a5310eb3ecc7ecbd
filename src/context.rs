/*!
 * Application Context
 * Explicitly constructed subsystems wired together from one config
 */

use crate::config::{MemoryMode, SimConfig};
use crate::core::{Size, Tick};
use crate::memory::{FlatAllocator, MemoryBackend, PagingAllocator};
use crate::process::{Process, ProcessError, ProcessRegistry};
use crate::sched::{Scheduler, SchedulerError};
use std::sync::Arc;
use thiserror::Error;

/// Context-level errors
#[derive(Error, Debug)]
pub enum ContextError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Owns every subsystem for one simulator run. There are no process-wide
/// singletons: the registry, the memory backend, and the scheduler are
/// constructed here and shared by reference.
pub struct SimContext {
    pub config: SimConfig,
    pub registry: ProcessRegistry,
    pub memory: Arc<dyn MemoryBackend>,
    pub scheduler: Scheduler,
}

impl SimContext {
    pub fn new(config: SimConfig) -> Self {
        let registry = ProcessRegistry::new();
        let memory: Arc<dyn MemoryBackend> = match config.memory_mode() {
            MemoryMode::Flat => Arc::new(FlatAllocator::new(config.max_overall_mem)),
            MemoryMode::Paging => Arc::new(PagingAllocator::new(
                config.max_overall_mem,
                config.mem_per_frame,
            )),
        };
        let scheduler = Scheduler::new(&config, registry.clone(), Arc::clone(&memory));
        Self {
            config,
            registry,
            memory,
            scheduler,
        }
    }

    /// Register a new process and place it on the dispatch queue.
    pub fn submit_process(
        &self,
        name: &str,
        total_ticks: Tick,
        memory_required: Size,
    ) -> Result<Arc<Process>, ContextError> {
        let process = Arc::new(Process::new(name, total_ticks, memory_required));
        self.registry.register(Arc::clone(&process))?;
        self.scheduler.submit(Arc::clone(&process))?;
        Ok(process)
    }
}
