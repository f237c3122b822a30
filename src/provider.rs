//! Neighbour expansion for traversal steps, served from cache or from a live edge cursor.
//!
//! A provider is driven strictly as `rearm → {has_more, next}* → (rearm | clear)` by one
//! traversal worker. Whether it caches is fixed at construction: depth-dependent edge
//! filters make a per-vertex cache unsafe, so such providers never own one, and a caching
//! provider refuses to have depth-dependent filters prepared later.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    cache::{BatchReplayIterator, CacheStats, NeighbourCache},
    config::ProviderConfig,
    cursor::{EdgeCursor, Step, TraversalStep},
    errors::NeighbourError,
    monitor::SharedMonitor,
    record::{EdgeBatch, EdgeRecord, EdgeToken, SharedBatch},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    /// Storage cursor rearms, i.e. steps that had to touch storage.
    pub rearmed: u64,
    pub edges_read: u64,
    /// Steps served entirely from cache.
    pub replays: u64,
}

enum CacheMode {
    Uncached,
    Cached(NeighbourCache),
}

pub struct NeighbourProvider<C: EdgeCursor> {
    cursor: C,
    mode: CacheMode,
    monitor: SharedMonitor,
    batch_size: usize,
    armed: Option<Step>,
    replay: Option<BatchReplayIterator>,
    stats: ProviderStats,
}

impl<C: EdgeCursor> NeighbourProvider<C> {
    pub fn new(
        cursor: C,
        monitor: SharedMonitor,
        config: &ProviderConfig,
    ) -> Result<Self, NeighbourError> {
        config.validate()?;
        let mode = if config.caching_enabled() && !cursor.has_depth_filters() {
            CacheMode::Cached(NeighbourCache::new())
        } else {
            CacheMode::Uncached
        };
        Ok(Self {
            cursor,
            mode,
            monitor,
            batch_size: config.batch_size,
            armed: None,
            replay: None,
            stats: ProviderStats::default(),
        })
    }

    /// Prepares expansion of `step`'s vertex. A complete cache entry turns the step into a
    /// replay; anything else restarts the storage cursor.
    pub fn rearm<S: TraversalStep + ?Sized>(&mut self, step: &S) -> Result<(), NeighbourError> {
        let vertex = step.vertex();
        let depth = step.depth();
        self.armed = Some(Step {
            vertex: vertex.clone(),
            depth,
        });

        if let CacheMode::Cached(cache) = &mut self.mode {
            if let Some(replay) = cache.rearm(vertex) {
                self.replay = Some(replay);
                self.stats.replays += 1;
                return Ok(());
            }
        }

        self.replay = None;
        self.cursor.rearm(vertex, depth)?;
        self.stats.rearmed += 1;
        Ok(())
    }

    /// Returns the next batch of the armed vertex.
    ///
    /// Live batches are appended to the cache before being returned; the batch read when
    /// the cursor runs dry completes the vertex's entry. Storage errors propagate unchanged
    /// and leave the entry incomplete.
    pub fn next(&mut self) -> Result<SharedBatch, NeighbourError> {
        let Some(step) = self.armed.as_ref() else {
            return Err(NeighbourError::contract("next() called before rearm()"));
        };
        let depth = step.depth;

        if let Some(replay) = self.replay.as_mut() {
            return replay.next_batch()?.ok_or_else(|| {
                NeighbourError::contract(format!(
                    "next() called with no cached batches left for {}",
                    step.vertex
                ))
            });
        }
        if !self.cursor.has_more(depth) {
            return Err(NeighbourError::contract(format!(
                "next() called after the scan of {} was exhausted",
                step.vertex
            )));
        }

        let mut batch = EdgeBatch::with_capacity(self.batch_size);
        let mut read = 0u64;
        self.cursor
            .read_next(
                self.batch_size,
                depth,
                &mut |token: EdgeToken, bytes: &[u8], cursor_id: usize| {
                    batch.push(EdgeRecord::new(token, bytes, cursor_id));
                    read += 1;
                },
            )?;
        self.stats.edges_read += read;

        let batch = batch.into_shared();
        if let CacheMode::Cached(cache) = &mut self.mode {
            let is_last_batch = !self.cursor.has_more(depth);
            cache.update(Arc::clone(&batch), self.monitor.as_ref(), is_last_batch)?;
        }
        Ok(batch)
    }

    pub fn has_more(&self, depth: u64) -> bool {
        match &self.replay {
            Some(replay) => replay.has_more(),
            None => self.cursor.has_more(depth),
        }
    }

    /// Drops all cached batches, returns their memory to the monitor and resets counters.
    pub fn clear(&mut self) {
        self.replay = None;
        self.armed = None;
        if let CacheMode::Cached(cache) = &mut self.mode {
            cache.clear(self.monitor.as_ref());
        }
        debug!(
            rearmed = self.stats.rearmed,
            edges_read = self.stats.edges_read,
            replays = self.stats.replays,
            "neighbour_provider.clear"
        );
        self.stats = ProviderStats::default();
    }

    /// Forwards `expressions` to the cursor. A caching provider rejects depth-dependent
    /// expressions and leaves the cursor's current ones in place.
    pub fn prepare_index_expressions(
        &mut self,
        expressions: &C::Expressions,
    ) -> Result<(), NeighbourError> {
        if self.is_caching() && C::is_depth_dependent(expressions) {
            return Err(NeighbourError::contract(
                "depth-dependent edge filters cannot be prepared on a caching provider",
            ));
        }
        self.cursor.prepare_index_expressions(expressions)
    }

    pub fn has_depth_specific_lookup(&self, depth: u64) -> bool {
        self.cursor.has_depth_specific_lookup(depth)
    }

    pub fn is_caching(&self) -> bool {
        matches!(self.mode, CacheMode::Cached(_))
    }

    /// True while the armed step is being served from cache.
    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    pub fn armed_step(&self) -> Option<&Step> {
        self.armed.as_ref()
    }

    pub fn stats(&self) -> ProviderStats {
        self.stats
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        match &self.mode {
            CacheMode::Cached(cache) => Some(cache.stats()),
            CacheMode::Uncached => None,
        }
    }

    pub fn cursor(&self) -> &C {
        &self.cursor
    }
}

impl<C: EdgeCursor> Drop for NeighbourProvider<C> {
    fn drop(&mut self) {
        self.clear();
    }
}
