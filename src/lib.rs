/*!
 * sched-sim Library
 * Single-machine process dispatcher and memory manager simulator
 */

pub mod config;
pub mod context;
pub mod core;
pub mod memory;
pub mod process;
pub mod sched;

// Re-exports
pub use config::{MemoryMode, SchedulingPolicy, SimConfig};
pub use context::SimContext;
pub use memory::{FlatAllocator, MemoryBackend, MemoryError, MemoryStats, PagingAllocator};
pub use process::{Process, ProcessRegistry, ProcessState};
pub use sched::{DispatchQueue, Scheduler, SchedulerState, SchedulerStats};
