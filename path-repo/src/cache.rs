use std::collections::VecDeque;

use crate::tree::Tree;

/// A bounded FIFO of reconstructed trees keyed by revision. Queries
/// consult this before paying for a full `reconstruct`; on a miss past
/// capacity the oldest entry is evicted, not the least-recently-used one —
/// reconstruction is assumed to be dominated by recency of access during a
/// single forward revision walk, where strict LRU buys nothing over FIFO.
#[derive(Debug)]
pub(crate) struct ReconstructionCache {
    capacity: usize,
    entries: VecDeque<(u64, Tree)>,
}

impl ReconstructionCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub(crate) fn get(&self, revision: u64) -> Option<&Tree> {
        self.entries.iter().find(|(r, _)| *r == revision).map(|(_, t)| t)
    }

    pub(crate) fn insert(&mut self, revision: u64, tree: Tree) {
        if self.entries.iter().any(|(r, _)| *r == revision) {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((revision, tree));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_entry_once_full() {
        let mut cache = ReconstructionCache::new(2);
        cache.insert(1, Tree::default());
        cache.insert(2, Tree::default());
        cache.insert(3, Tree::default());

        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }
}
