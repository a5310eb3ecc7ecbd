/*!
 * Flat Allocator
 * Contiguous first-fit byte-range allocation with oldest-first eviction
 */

use super::backing::BackingStore;
use super::types::{MemoryError, MemoryResult, MemoryStats};
use super::MemoryBackend;
use crate::core::{Pid, Size};
use crate::process::Process;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

/// A resident byte range `[start, start + size)` and its owner.
#[derive(Debug, Clone)]
struct Region {
    size: Size,
    owner: Pid,
}

#[derive(Debug, Default)]
struct FlatInner {
    /// Resident regions keyed by start offset. BTreeMap ordering makes the
    /// lowest-address region (the eviction victim) the first entry.
    regions: BTreeMap<Size, Region>,
    usage: HashMap<Pid, Size>,
    backing: BackingStore,
}

/// Contiguous allocator over a fixed-size address space.
///
/// Addresses are plain offsets into the simulated space; nothing here hands
/// out pointers. Every process occupies exactly one region at a time.
pub struct FlatAllocator {
    capacity: Size,
    inner: Mutex<FlatInner>,
}

impl FlatAllocator {
    pub fn new(capacity: Size) -> Self {
        debug!("Flat allocator initialized with {} bytes", capacity);
        Self {
            capacity,
            inner: Mutex::new(FlatInner::default()),
        }
    }

    pub fn capacity(&self) -> Size {
        self.capacity
    }

    /// First-fit allocation. Returns the base offset of the granted region.
    pub fn allocate_bytes(&self, process: &Arc<Process>) -> MemoryResult<Size> {
        let size = process.memory_required();
        let name = process.name();
        let mut inner = self.inner.lock();

        // Already resident; the existing region stands
        if let Some((start, _)) = inner.regions.iter().find(|(_, r)| r.owner == name) {
            return Ok(*start);
        }

        let start = Self::find_first_fit(&inner.regions, self.capacity, size).ok_or_else(|| {
            let used: Size = inner.regions.values().map(|r| r.size).sum();
            MemoryError::NoCapacity {
                requested: size,
                available: self.capacity - used,
                total: self.capacity,
            }
        })?;

        let owner = name.to_string();
        inner.regions.insert(
            start,
            Region {
                size,
                owner: owner.clone(),
            },
        );
        inner.usage.insert(owner, size);
        process.set_memory_usage(size);

        trace!("Allocated [{}, {}) to {}", start, start + size, name);
        Ok(start)
    }

    /// Scan for the first gap between resident regions that fits `size`.
    fn find_first_fit(regions: &BTreeMap<Size, Region>, capacity: Size, size: Size) -> Option<Size> {
        if size > capacity {
            return None;
        }
        let mut cursor = 0;
        for (start, region) in regions {
            if start - cursor >= size {
                return Some(cursor);
            }
            cursor = start + region.size;
        }
        (capacity - cursor >= size).then_some(cursor)
    }

    /// Re-locate an already-resident process's base offset without touching
    /// the allocation. Used when resuming a process that kept residency.
    pub fn base_of(&self, name: &str) -> Option<Size> {
        let inner = self.inner.lock();
        inner
            .regions
            .iter()
            .find(|(_, region)| region.owner == name)
            .map(|(start, _)| *start)
    }

    /// Bytes of free space (external fragmentation in the original's terms).
    pub fn free_bytes(&self) -> Size {
        let inner = self.inner.lock();
        let used: Size = inner.regions.values().map(|r| r.size).sum();
        self.capacity - used
    }
}

impl MemoryBackend for FlatAllocator {
    fn allocate(&self, process: &Arc<Process>) -> MemoryResult<()> {
        self.allocate_bytes(process).map(|_| ())
    }

    fn deallocate(&self, process: &Arc<Process>) -> MemoryResult<()> {
        let name = process.name();
        let mut inner = self.inner.lock();

        let (start, size) = inner
            .regions
            .iter()
            .find(|(_, region)| region.owner == name)
            .map(|(start, region)| (*start, region.size))
            .ok_or_else(|| MemoryError::NotResident(name.to_string()))?;
        inner.regions.remove(&start);

        if let Some(usage) = inner.usage.get_mut(name) {
            *usage = usage.saturating_sub(size);
            if *usage == 0 {
                inner.usage.remove(name);
            }
        }
        process.set_memory_usage(0);

        trace!("Deallocated [{}, {}) from {}", start, start + size, name);
        Ok(())
    }

    fn is_resident(&self, name: &str) -> bool {
        let inner = self.inner.lock();
        inner.regions.values().any(|region| region.owner == name)
    }

    fn oldest_resident(&self) -> Option<Pid> {
        // Lowest start offset is the admission-order proxy
        let inner = self.inner.lock();
        inner
            .regions
            .first_key_value()
            .map(|(_, region)| region.owner.clone())
    }

    fn stash(&self, name: &str) {
        self.inner.lock().backing.stash(name);
    }

    fn unstash(&self, name: &str) -> bool {
        self.inner.lock().backing.unstash(name)
    }

    fn stats(&self) -> MemoryStats {
        let inner = self.inner.lock();
        let used: Size = inner.regions.values().map(|r| r.size).sum();
        MemoryStats {
            total_bytes: self.capacity,
            used_bytes: used,
            available_bytes: self.capacity - used,
            usage_percentage: if self.capacity == 0 {
                0.0
            } else {
                used as f64 / self.capacity as f64 * 100.0
            },
            resident_processes: inner.regions.len(),
            external_fragmentation: self.capacity - used,
            total_frames: 0,
            free_frames: 0,
            paged_in: 0,
            paged_out: 0,
            backing_store: inner.backing.len(),
        }
    }
}
