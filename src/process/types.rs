/*!
 * Process Types
 * Lifecycle states, snapshots, and process-level errors
 */

use crate::core::{Pid, Size, Tick};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Process not found: {0}")]
    NotFound(Pid),

    #[error("Duplicate process id: {0}")]
    Duplicate(Pid),
}

/// Process lifecycle state
///
/// `Ready` is both the initial state and the re-entrant state after a
/// round-robin quantum expires without completion. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Ready,
    Running,
    Finished,
}

/// Read-only process snapshot for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub state: ProcessState,
    pub progress: Tick,
    pub total_ticks: Tick,
    pub core: Option<usize>,
    pub memory_required: Size,
    pub memory_usage: Size,
}
