/*!
 * Memory Management
 *
 * Two mutually exclusive allocation strategies behind one trait:
 *
 * - **Flat**: contiguous first-fit byte ranges over a sized address space,
 *   addressed by offset only — no raw pointers cross this boundary.
 * - **Paging**: fixed-size frames from a free pool, with residency-order
 *   eviction and paged-in/out counters.
 *
 * Each backend carries its own backing store of evicted processes. The
 * scheduler never sees which strategy is active; it speaks `MemoryBackend`.
 */

mod backing;
mod flat;
mod paging;
pub mod types;

pub use backing::BackingStore;
pub use flat::FlatAllocator;
pub use paging::PagingAllocator;
pub use types::{MemoryError, MemoryResult, MemoryStats};

use crate::core::Pid;
use crate::process::Process;
use std::sync::Arc;

/// Allocation strategy seam between the scheduler and memory.
pub trait MemoryBackend: Send + Sync {
    /// Admit a process: grant it the memory it needs to run.
    /// `Err(NoCapacity)` leaves the backend unchanged.
    fn allocate(&self, process: &Arc<Process>) -> MemoryResult<()>;

    /// Release everything the process holds.
    /// `Err(NotResident)` on double release; counters are untouched.
    fn deallocate(&self, process: &Arc<Process>) -> MemoryResult<()>;

    /// Whether the process currently holds memory here. Used to skip
    /// re-allocation when a round-robin process kept residency across a
    /// quantum.
    fn is_resident(&self, name: &str) -> bool;

    /// Eviction victim: the longest-resident process. Never the process
    /// currently being admitted (which is, by definition, not resident).
    fn oldest_resident(&self) -> Option<Pid>;

    /// Record an evicted process in the backing store.
    fn stash(&self, name: &str);

    /// Drop a process from the backing store on re-admission.
    fn unstash(&self, name: &str) -> bool;

    /// Read-only counters for reporting.
    fn stats(&self) -> MemoryStats;
}
