/*!
 * Memory Tests
 * Allocator invariants shared by both strategies
 */

use pretty_assertions::assert_eq;
use sched_sim::{FlatAllocator, MemoryBackend, MemoryError, PagingAllocator, Process};
use std::sync::Arc;

fn proc_named(name: &str, bytes: usize) -> Arc<Process> {
    Arc::new(Process::new(name, 10, bytes))
}

#[test]
fn test_flat_regions_never_overlap() {
    let alloc = FlatAllocator::new(4096);
    let procs: Vec<_> = (0..4).map(|i| proc_named(&format!("p{}", i), 1024)).collect();
    for p in &procs {
        alloc.allocate(p).unwrap();
    }

    // Free the middle two, re-admit differently sized work into the holes
    alloc.deallocate(&procs[1]).unwrap();
    alloc.deallocate(&procs[2]).unwrap();
    let small = proc_named("small", 512);
    let medium = proc_named("medium", 1024);
    alloc.allocate(&small).unwrap();
    alloc.allocate(&medium).unwrap();

    let mut regions: Vec<(usize, usize)> = ["p0", "p3", "small", "medium"]
        .iter()
        .map(|name| {
            let base = alloc.base_of(name).unwrap();
            let size = if *name == "small" { 512 } else { 1024 };
            (base, base + size)
        })
        .collect();
    regions.sort();
    for pair in regions.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "regions overlap: {:?}", pair);
    }
}

#[test]
fn test_flat_capacity_bound_holds() {
    let alloc = FlatAllocator::new(2048);
    for i in 0..5 {
        let p = proc_named(&format!("p{}", i), 512);
        // The fifth admission exceeds capacity and must be denied
        let result = alloc.allocate(&p);
        if i < 4 {
            result.unwrap();
        } else {
            assert!(matches!(result, Err(MemoryError::NoCapacity { .. })));
        }
        assert!(alloc.stats().used_bytes <= 2048);
    }
}

#[test]
fn test_flat_round_trip_restores_free_capacity() {
    let alloc = FlatAllocator::new(8192);
    let before = alloc.stats().available_bytes;

    let p = proc_named("p01", 3000);
    alloc.allocate(&p).unwrap();
    alloc.deallocate(&p).unwrap();

    assert_eq!(alloc.stats().available_bytes, before);
    assert_eq!(alloc.stats().resident_processes, 0);
}

#[test]
fn test_paging_scenario_oversized_request() {
    // 10 frames of size 1; a 12-frame request fails with no side effects
    let alloc = PagingAllocator::new(10, 1);
    let p = proc_named("p01", 12);

    let err = alloc.allocate(&p).unwrap_err();
    assert!(matches!(err, MemoryError::NoCapacity { .. }));
    assert_eq!(alloc.free_frame_count(), 10);
    assert!(alloc.frames_of("p01").is_empty());
    assert_eq!(alloc.stats().paged_in, 0);
}

#[test]
fn test_paging_frame_conservation() {
    let alloc = PagingAllocator::new(64, 4); // 16 frames
    let a = proc_named("a", 10); // 3 frames
    let b = proc_named("b", 16); // 4 frames
    let c = proc_named("c", 4); // 1 frame

    alloc.allocate(&a).unwrap();
    alloc.allocate(&b).unwrap();
    alloc.deallocate(&a).unwrap();
    alloc.allocate(&c).unwrap();

    let owned: usize = ["a", "b", "c"]
        .iter()
        .map(|name| alloc.frames_of(name).len())
        .sum();
    assert_eq!(alloc.free_frame_count() + owned, alloc.total_frames());
}

#[test]
fn test_paging_round_trip() {
    let alloc = PagingAllocator::new(100, 10);
    let before = alloc.free_frame_count();

    let p = proc_named("p01", 35); // 4 frames
    alloc.allocate(&p).unwrap();
    assert_eq!(alloc.free_frame_count(), before - 4);
    alloc.deallocate(&p).unwrap();
    assert_eq!(alloc.free_frame_count(), before);
}

#[test]
fn test_eviction_protocol_moves_victim_to_backing_store() {
    let alloc = PagingAllocator::new(8, 1);
    let old = proc_named("old", 6);
    let new = proc_named("new", 6);

    alloc.allocate(&old).unwrap();
    assert!(matches!(
        alloc.allocate(&new),
        Err(MemoryError::NoCapacity { .. })
    ));

    // Victim chosen before the retry, never the admittee
    let victim = alloc.oldest_resident().unwrap();
    assert_eq!(victim, "old");
    alloc.deallocate(&old).unwrap();
    alloc.stash(&victim);

    alloc.allocate(&new).unwrap();
    assert!(alloc.is_resident("new"));
    assert!(!alloc.is_resident("old"));
    assert_eq!(alloc.stats().backing_store, 1);

    // Re-admission removes the process from the backing store
    alloc.deallocate(&new).unwrap();
    alloc.allocate(&old).unwrap();
    assert!(alloc.unstash("old"));
    assert_eq!(alloc.stats().backing_store, 0);
}

#[test]
fn test_backing_store_disjoint_from_residency() {
    let alloc = FlatAllocator::new(1024);
    let p = proc_named("p01", 512);

    alloc.allocate(&p).unwrap();
    alloc.deallocate(&p).unwrap();
    alloc.stash("p01");

    assert!(!alloc.is_resident("p01"));
    assert_eq!(alloc.stats().backing_store, 1);
}
