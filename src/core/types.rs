/*!
 * Core Types
 * Common types used across the simulator
 */

/// Process identifier. Process names double as ids; the registry
/// enforces uniqueness.
pub type Pid = String;

/// Size type for memory operations (bytes or frame counts)
pub type Size = usize;

/// One simulated instruction unit
pub type Tick = u64;
