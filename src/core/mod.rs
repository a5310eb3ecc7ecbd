/*!
 * Core Module
 * Shared primitives for the scheduler and memory subsystems
 */

pub mod types;

pub use types::{Pid, Size, Tick};
