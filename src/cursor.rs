//! Contracts between the neighbour provider and its collaborators.

use serde::{Deserialize, Serialize};

use crate::{
    errors::NeighbourError,
    record::{EdgeToken, VertexId},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeDirection {
    #[default]
    Outgoing,
    Incoming,
}

impl EdgeDirection {
    /// Document attribute naming the vertex an edge leads to.
    pub fn target_attribute(self) -> &'static str {
        match self {
            EdgeDirection::Outgoing => "_to",
            EdgeDirection::Incoming => "_from",
        }
    }
}

/// The vertex being expanded and how far it is from the search origin.
pub trait TraversalStep {
    fn vertex(&self) -> &VertexId;
    fn depth(&self) -> u64;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Step {
    pub vertex: VertexId,
    pub depth: u64,
}

impl Step {
    pub fn new<V: Into<VertexId>>(vertex: V, depth: u64) -> Self {
        Self {
            vertex: vertex.into(),
            depth,
        }
    }
}

impl TraversalStep for Step {
    fn vertex(&self) -> &VertexId {
        &self.vertex
    }

    fn depth(&self) -> u64 {
        self.depth
    }
}

/// Callback receiving one edge per invocation: token, transient document bytes, and the
/// index of the collection cursor that produced it.
pub type EdgeSink<'a> = dyn FnMut(EdgeToken, &[u8], usize) + 'a;

/// Storage-side edge scan for a single vertex at a time.
pub trait EdgeCursor {
    /// Prepared filter conditions understood by this cursor.
    type Expressions;

    /// Restarts the scan at `vertex`.
    fn rearm(&mut self, vertex: &VertexId, depth: u64) -> Result<(), NeighbourError>;

    fn has_more(&self, depth: u64) -> bool;

    /// Emits up to `batch_size` edges into `sink`. The bytes handed to `sink` are only
    /// valid for the duration of the call.
    fn read_next(
        &mut self,
        batch_size: usize,
        depth: u64,
        sink: &mut EdgeSink<'_>,
    ) -> Result<(), NeighbourError>;

    fn prepare_index_expressions(
        &mut self,
        expressions: &Self::Expressions,
    ) -> Result<(), NeighbourError>;

    fn has_depth_specific_lookup(&self, depth: u64) -> bool;

    /// True when `expressions` would select different edges at different depths.
    fn is_depth_dependent(expressions: &Self::Expressions) -> bool;

    /// True when the currently prepared expressions depend on depth.
    fn has_depth_filters(&self) -> bool;
}
