//! In-memory thread allocator implementation.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::traits::ThreadAllocator;

/// Registry plus counter, updated together under one lock.
struct AllocatorState {
    threads: HashMap<(String, String), i64>,
    next_id: i64,
}

/// An in-memory allocator: an append-only registry keyed by
/// (session, route), with ids issued by a single counter starting at 1.
pub struct InMemoryThreadAllocator {
    state: Mutex<AllocatorState>,
}

impl InMemoryThreadAllocator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AllocatorState {
                threads: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of pairs allocated so far.
    pub fn len(&self) -> usize {
        self.state.lock().threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryThreadAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThreadAllocator for InMemoryThreadAllocator {
    async fn allocate(&self, session_id: &str, route: &str) -> Result<i64> {
        let mut state = self.state.lock();
        let key = (session_id.to_string(), route.to_string());
        if let Some(id) = state.threads.get(&key) {
            return Ok(*id);
        }
        let id = state.next_id;
        state.next_id += 1;
        state.threads.insert(key, id);
        Ok(id)
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_pair_is_idempotent() {
        let alloc = InMemoryThreadAllocator::new();
        let first = alloc.allocate("s1", "payment").await.unwrap();
        let second = alloc.allocate("s1", "payment").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn distinct_pairs_strictly_increase() {
        let alloc = InMemoryThreadAllocator::new();
        let a = alloc.allocate("s1", "payment").await.unwrap();
        let b = alloc.allocate("s1", "order").await.unwrap();
        let c = alloc.allocate("s2", "payment").await.unwrap();
        assert!(b > a);
        assert!(c > b);
    }

    #[tokio::test]
    async fn reference_sequence_holds_exactly() {
        let alloc = InMemoryThreadAllocator::new();
        assert_eq!(alloc.allocate("s1", "payment").await.unwrap(), 1);
        assert_eq!(alloc.allocate("s1", "payment").await.unwrap(), 1);
        assert_eq!(alloc.allocate("s1", "order").await.unwrap(), 2);
        assert_eq!(alloc.allocate("s2", "payment").await.unwrap(), 3);
        assert_eq!(alloc.allocate("s1", "order").await.unwrap(), 2);
        assert_eq!(alloc.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_allocation_of_same_pair_yields_one_id() {
        use std::sync::Arc;

        let alloc = Arc::new(InMemoryThreadAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let alloc = Arc::clone(&alloc);
            handles.push(tokio::spawn(async move {
                alloc.allocate("shared", "payment").await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids, vec![1]);
        assert_eq!(alloc.len(), 1);
    }
}
