/*!
 * Paging Allocator
 * Fixed-size frame allocation with a free pool and residency-order eviction
 */

use super::backing::BackingStore;
use super::types::{MemoryError, MemoryResult, MemoryStats};
use super::MemoryBackend;
use crate::core::{Pid, Size};
use crate::process::Process;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Default)]
struct PagingInner {
    free_frames: Vec<Size>,
    /// Frame index -> owning process, for allocated frames only
    frame_owner: HashMap<Size, Pid>,
    usage: HashMap<Pid, Size>,
    /// Admission order of resident processes; head is the eviction victim
    residency: VecDeque<Pid>,
    backing: BackingStore,
    paged_in: u64,
    paged_out: u64,
}

/// Frame-granular allocator.
///
/// Invariant: `free_frames.len() + frame_owner.len() == total_frames` after
/// every operation, and a failed admission has no side effects at all.
pub struct PagingAllocator {
    frame_size: Size,
    total_frames: Size,
    inner: Mutex<PagingInner>,
}

impl PagingAllocator {
    pub fn new(capacity: Size, frame_size: Size) -> Self {
        let total_frames = capacity / frame_size;
        debug!(
            "Paging allocator initialized: {} frames of {} bytes",
            total_frames, frame_size
        );
        Self {
            frame_size,
            total_frames,
            inner: Mutex::new(PagingInner {
                free_frames: (0..total_frames).collect(),
                ..PagingInner::default()
            }),
        }
    }

    pub fn frame_size(&self) -> Size {
        self.frame_size
    }

    pub fn total_frames(&self) -> Size {
        self.total_frames
    }

    pub fn free_frame_count(&self) -> Size {
        self.inner.lock().free_frames.len()
    }

    /// Frames currently owned by the named process.
    pub fn frames_of(&self, name: &str) -> Vec<Size> {
        let inner = self.inner.lock();
        let mut frames: Vec<Size> = inner
            .frame_owner
            .iter()
            .filter(|(_, owner)| *owner == name)
            .map(|(frame, _)| *frame)
            .collect();
        frames.sort_unstable();
        frames
    }
}

impl MemoryBackend for PagingAllocator {
    fn allocate(&self, process: &Arc<Process>) -> MemoryResult<()> {
        let name = process.name();
        let frames_needed = process.num_pages(self.frame_size);
        let mut inner = self.inner.lock();

        if inner.usage.contains_key(name) {
            // Already resident; nothing to grant
            return Ok(());
        }

        // Denied admissions must leave the frame table untouched
        if frames_needed > inner.free_frames.len() {
            return Err(MemoryError::NoCapacity {
                requested: frames_needed * self.frame_size,
                available: inner.free_frames.len() * self.frame_size,
                total: self.total_frames * self.frame_size,
            });
        }

        for _ in 0..frames_needed {
            // Pool is sized above, pop cannot miss
            if let Some(frame) = inner.free_frames.pop() {
                inner.frame_owner.insert(frame, name.to_string());
            }
        }
        inner.residency.push_back(name.to_string());
        inner.usage.insert(name.to_string(), process.memory_required());
        inner.paged_in += frames_needed as u64;
        process.set_memory_usage(process.memory_required());

        trace!("Paged in {} frames for {}", frames_needed, name);
        Ok(())
    }

    fn deallocate(&self, process: &Arc<Process>) -> MemoryResult<()> {
        let name = process.name();
        let mut inner = self.inner.lock();

        let owned: Vec<Size> = inner
            .frame_owner
            .iter()
            .filter(|(_, owner)| owner.as_str() == name)
            .map(|(frame, _)| *frame)
            .collect();
        if owned.is_empty() && !inner.usage.contains_key(name) {
            return Err(MemoryError::NotResident(name.to_string()));
        }

        for frame in &owned {
            inner.frame_owner.remove(frame);
            inner.free_frames.push(*frame);
        }
        inner.paged_out += owned.len() as u64;
        inner.usage.remove(name);
        inner.residency.retain(|resident| resident != name);
        process.set_memory_usage(0);

        trace!("Paged out {} frames from {}", owned.len(), name);
        Ok(())
    }

    fn is_resident(&self, name: &str) -> bool {
        self.inner.lock().usage.contains_key(name)
    }

    fn oldest_resident(&self) -> Option<Pid> {
        self.inner.lock().residency.front().cloned()
    }

    fn stash(&self, name: &str) {
        self.inner.lock().backing.stash(name);
    }

    fn unstash(&self, name: &str) -> bool {
        self.inner.lock().backing.unstash(name)
    }

    fn stats(&self) -> MemoryStats {
        let inner = self.inner.lock();
        let used_frames = self.total_frames - inner.free_frames.len();
        let total_bytes = self.total_frames * self.frame_size;
        let used_bytes = used_frames * self.frame_size;
        MemoryStats {
            total_bytes,
            used_bytes,
            available_bytes: total_bytes - used_bytes,
            usage_percentage: if total_bytes == 0 {
                0.0
            } else {
                used_bytes as f64 / total_bytes as f64 * 100.0
            },
            resident_processes: inner.residency.len(),
            external_fragmentation: 0,
            total_frames: self.total_frames,
            free_frames: inner.free_frames.len(),
            paged_in: inner.paged_in,
            paged_out: inner.paged_out,
            backing_store: inner.backing.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc_named(name: &str, bytes: Size) -> Arc<Process> {
        Arc::new(Process::new(name, 10, bytes))
    }

    fn assert_frame_conservation(alloc: &PagingAllocator) {
        let inner = alloc.inner.lock();
        assert_eq!(
            inner.free_frames.len() + inner.frame_owner.len(),
            alloc.total_frames
        );
    }

    #[test]
    fn test_allocate_takes_exact_frames() {
        let alloc = PagingAllocator::new(16, 4); // 4 frames
        let p = proc_named("p01", 7); // ceil(7/4) = 2 frames

        alloc.allocate(&p).unwrap();
        assert_eq!(alloc.frames_of("p01").len(), 2);
        assert_eq!(alloc.free_frame_count(), 2);
        assert_frame_conservation(&alloc);
    }

    #[test]
    fn test_denied_allocation_has_no_side_effects() {
        let alloc = PagingAllocator::new(10, 1); // 10 frames of size 1
        let big = proc_named("big", 12);

        let err = alloc.allocate(&big).unwrap_err();
        assert!(matches!(err, MemoryError::NoCapacity { .. }));
        assert_eq!(alloc.free_frame_count(), 10);
        assert!(alloc.frames_of("big").is_empty());
        assert_eq!(alloc.stats().paged_in, 0);
        assert_frame_conservation(&alloc);
    }

    #[test]
    fn test_deallocate_returns_every_frame() {
        let alloc = PagingAllocator::new(32, 4);
        let p = proc_named("p01", 16); // 4 frames

        alloc.allocate(&p).unwrap();
        alloc.deallocate(&p).unwrap();

        assert_eq!(alloc.free_frame_count(), 8);
        assert!(!alloc.is_resident("p01"));
        assert_eq!(p.memory_usage(), 0);
        assert_frame_conservation(&alloc);

        let stats = alloc.stats();
        assert_eq!(stats.paged_in, 4);
        assert_eq!(stats.paged_out, 4);
    }

    #[test]
    fn test_double_deallocate_guarded() {
        let alloc = PagingAllocator::new(8, 2);
        let p = proc_named("p01", 4);

        alloc.allocate(&p).unwrap();
        alloc.deallocate(&p).unwrap();
        let err = alloc.deallocate(&p).unwrap_err();
        assert_eq!(err, MemoryError::NotResident("p01".into()));
        assert_eq!(alloc.stats().paged_out, 2);
    }

    #[test]
    fn test_resident_allocate_is_noop() {
        let alloc = PagingAllocator::new(8, 2);
        let p = proc_named("p01", 4);

        alloc.allocate(&p).unwrap();
        let free_before = alloc.free_frame_count();
        alloc.allocate(&p).unwrap();
        assert_eq!(alloc.free_frame_count(), free_before);
        assert_eq!(alloc.stats().paged_in, 2);
    }

    #[test]
    fn test_oldest_resident_follows_admission_order() {
        let alloc = PagingAllocator::new(12, 2); // 6 frames
        let a = proc_named("a", 4);
        let b = proc_named("b", 4);

        alloc.allocate(&a).unwrap();
        alloc.allocate(&b).unwrap();
        assert_eq!(alloc.oldest_resident(), Some("a".to_string()));

        alloc.deallocate(&a).unwrap();
        assert_eq!(alloc.oldest_resident(), Some("b".to_string()));
    }
}
