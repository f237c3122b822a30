//! Per-vertex cache of the edge batches produced by one full neighbour scan.
//!
//! An entry only becomes replayable once the scan that filled it reached its last batch.
//! Partial entries stay in the map and keep receiving batches on the next scan of the same
//! vertex, but [`NeighbourCache::rearm`] never hands them out.

use std::sync::{Arc, Weak};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    errors::NeighbourError,
    monitor::ResourceMonitor,
    record::{SharedBatch, VertexId},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub complete_entries: usize,
    pub batches: usize,
    pub memory_bytes: usize,
}

enum CacheEntry {
    Filling(Vec<SharedBatch>),
    /// Frozen once the last batch arrives; never appended to again.
    Complete(Arc<[SharedBatch]>),
}

impl CacheEntry {
    fn batch_count(&self) -> usize {
        match self {
            CacheEntry::Filling(batches) => batches.len(),
            CacheEntry::Complete(batches) => batches.len(),
        }
    }
}

#[derive(Default)]
pub struct NeighbourCache {
    entries: AHashMap<VertexId, CacheEntry>,
    current: Option<VertexId>,
    memory_bytes: usize,
    hits: u64,
    misses: u64,
}

impl NeighbourCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `vertex` as the target of subsequent [`update`](Self::update) calls and
    /// returns a replay iterator if its batch sequence is complete.
    ///
    /// A partial entry is kept as is: the following `update` calls append after the
    /// batches it already holds. A scan that was abandoned and is restarted from the
    /// beginning therefore stores its leading batches twice, and the completed entry
    /// replays them twice. Callers must not retry an abandoned scan on the same cache;
    /// [`clear`](Self::clear) it first.
    pub fn rearm(&mut self, vertex: &VertexId) -> Option<BatchReplayIterator> {
        self.current = Some(vertex.clone());
        match self
            .entries
            .entry(vertex.clone())
            .or_insert_with(|| CacheEntry::Filling(Vec::new()))
        {
            CacheEntry::Complete(batches) => {
                self.hits += 1;
                Some(BatchReplayIterator::new(batches))
            }
            CacheEntry::Filling(_) => {
                self.misses += 1;
                None
            }
        }
    }

    /// Appends `batch` to the current vertex and charges its size to `monitor`.
    ///
    /// Fails without appending when no vertex is armed, when the current entry is already
    /// complete, or when the monitor refuses the allocation. Batches are appended after
    /// whatever a previous, unfinished scan of the same vertex left behind.
    pub fn update(
        &mut self,
        batch: SharedBatch,
        monitor: &dyn ResourceMonitor,
        is_last_batch: bool,
    ) -> Result<(), NeighbourError> {
        let vertex = self
            .current
            .as_ref()
            .ok_or_else(|| NeighbourError::contract("cache update without a rearmed vertex"))?;
        let entry = self.entries.get_mut(vertex).ok_or_else(|| {
            NeighbourError::contract(format!("no cache entry for current vertex {vertex}"))
        })?;
        let CacheEntry::Filling(batches) = &mut *entry else {
            return Err(NeighbourError::contract(format!(
                "cache entry for {vertex} is complete and cannot be extended"
            )));
        };

        let bytes = batch.size_bytes();
        monitor.increase_memory_usage(bytes)?;
        batches.push(batch);
        self.memory_bytes += bytes;

        if is_last_batch {
            let frozen: Arc<[SharedBatch]> = std::mem::take(batches).into();
            trace!(vertex = %vertex, batches = frozen.len(), "neighbour_cache.complete");
            *entry = CacheEntry::Complete(frozen);
        }
        Ok(())
    }

    /// Drops every entry and returns the accounted bytes to `monitor`. Outstanding replay
    /// iterators become stale.
    pub fn clear(&mut self, monitor: &dyn ResourceMonitor) {
        trace!(
            entries = self.entries.len(),
            bytes = self.memory_bytes,
            "neighbour_cache.clear"
        );
        monitor.decrease_memory_usage(self.memory_bytes);
        self.entries.clear();
        self.current = None;
        self.memory_bytes = 0;
        self.hits = 0;
        self.misses = 0;
    }

    pub fn is_complete(&self, vertex: &VertexId) -> bool {
        matches!(self.entries.get(vertex), Some(CacheEntry::Complete(_)))
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            complete_entries: self
                .entries
                .values()
                .filter(|entry| matches!(entry, CacheEntry::Complete(_)))
                .count(),
            batches: self.entries.values().map(CacheEntry::batch_count).sum(),
            memory_bytes: self.memory_bytes,
        }
    }
}

/// Replays the frozen batch sequence of one vertex in insertion order.
///
/// Holds only a weak reference: map growth never invalidates it, a full
/// [`NeighbourCache::clear`] does, and that is reported instead of yielding nothing.
#[derive(Clone, Debug)]
pub struct BatchReplayIterator {
    batches: Weak<[SharedBatch]>,
    position: usize,
    len: usize,
}

impl BatchReplayIterator {
    fn new(batches: &Arc<[SharedBatch]>) -> Self {
        Self {
            batches: Arc::downgrade(batches),
            position: 0,
            len: batches.len(),
        }
    }

    pub fn has_more(&self) -> bool {
        self.position < self.len
    }

    pub fn remaining(&self) -> usize {
        self.len - self.position
    }

    /// False once the owning cache has been cleared.
    pub fn is_valid(&self) -> bool {
        self.batches.strong_count() > 0
    }

    /// Yields the next batch, `None` once every batch was yielded.
    pub fn next_batch(&mut self) -> Result<Option<SharedBatch>, NeighbourError> {
        let batches = self.batches.upgrade().ok_or_else(|| {
            NeighbourError::contract("replay iterator used after its cache was cleared")
        })?;
        let batch = batches.get(self.position).cloned();
        if batch.is_some() {
            self.position += 1;
        }
        Ok(batch)
    }
}
