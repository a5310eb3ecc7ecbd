/*!
 * Memory Types
 * Unified result/error surface and stats snapshots for both allocators
 */

use crate::core::{Pid, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
///
/// Both allocator strategies signal through this one enum; there is no
/// null/bool/panic split between them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Admission denied. Recoverable: the scheduler answers with eviction
    /// and retry (round-robin) or front-of-queue reinsertion (FCFS).
    #[error("No capacity: requested {requested} bytes, available {available} of {total}")]
    NoCapacity {
        requested: Size,
        available: Size,
        total: Size,
    },

    /// The allocator was asked to release or locate an id it does not
    /// track: a double release or stale tracking. Guarded so usage counters
    /// never go negative.
    #[error("Process not resident: {0}")]
    NotResident(Pid),
}

/// Memory statistics snapshot
///
/// One shape for both backends: the frame and paging counters stay zero
/// under the flat allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemoryStats {
    pub total_bytes: Size,
    pub used_bytes: Size,
    pub available_bytes: Size,
    pub usage_percentage: f64,
    pub resident_processes: usize,
    pub external_fragmentation: Size,
    pub total_frames: Size,
    pub free_frames: Size,
    pub paged_in: u64,
    pub paged_out: u64,
    pub backing_store: usize,
}
