/*!
 * Backing Store
 * Ordered holding area for evicted, non-resident processes
 */

use crate::core::Pid;
use std::collections::VecDeque;

/// Ids of evicted processes awaiting re-admission, in eviction order.
///
/// Lives inside each allocator's lock; a process present here is never
/// concurrently resident in that allocator.
#[derive(Debug, Default)]
pub struct BackingStore {
    entries: VecDeque<Pid>,
}

impl BackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an evicted process at the tail.
    pub fn stash(&mut self, name: &str) {
        if !self.contains(name) {
            self.entries.push_back(name.to_string());
        }
    }

    /// Remove a process on re-admission. Returns whether it was present.
    pub fn unstash(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != name);
        self.entries.len() < before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Pid> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stash_preserves_order() {
        let mut store = BackingStore::new();
        store.stash("p01");
        store.stash("p02");
        store.stash("p01"); // already present, no duplicate
        assert_eq!(store.snapshot(), vec!["p01".to_string(), "p02".to_string()]);
    }

    #[test]
    fn test_unstash() {
        let mut store = BackingStore::new();
        store.stash("p01");
        assert!(store.unstash("p01"));
        assert!(!store.unstash("p01"));
        assert!(store.is_empty());
    }
}
