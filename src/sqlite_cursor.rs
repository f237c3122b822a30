//! [`EdgeCursor`] over one or more edge collections of an [`EdgeStore`].
//!
//! Collections are scanned in declaration order; the index of a collection in that list
//! is the `cursor_id` of every edge it produces. Paging is keyset-based on the row id,
//! so a scan never revisits an edge.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    cursor::{EdgeCursor, EdgeDirection, EdgeSink},
    errors::NeighbourError,
    record::{EdgeToken, VertexId},
    store::EdgeStore,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EdgeFilter {
    AttributeEquals { attribute: String, value: Value },
}

impl EdgeFilter {
    pub fn attribute_equals<A: Into<String>, V: Into<Value>>(attribute: A, value: V) -> Self {
        EdgeFilter::AttributeEquals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, document: &Value) -> bool {
        match self {
            EdgeFilter::AttributeEquals { attribute, value } => {
                document.get(attribute.as_str()) == Some(value)
            }
        }
    }
}

/// Filter conditions prepared for a [`SqliteEdgeCursor`].
///
/// A depth listed in `by_depth` uses its own filters instead of `base`, which makes the
/// neighbour set of a vertex depend on the depth it is expanded at.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeConditions {
    pub base: Vec<EdgeFilter>,
    pub by_depth: BTreeMap<u64, Vec<EdgeFilter>>,
}

impl EdgeConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: EdgeFilter) -> Self {
        self.base.push(filter);
        self
    }

    pub fn with_depth_filter(mut self, depth: u64, filter: EdgeFilter) -> Self {
        self.by_depth.entry(depth).or_default().push(filter);
        self
    }

    pub fn has_depth_filters(&self) -> bool {
        !self.by_depth.is_empty()
    }

    pub fn filters_for(&self, depth: u64) -> &[EdgeFilter] {
        self.by_depth.get(&depth).unwrap_or(&self.base)
    }
}

pub struct SqliteEdgeCursor {
    store: Arc<EdgeStore>,
    collections: Vec<String>,
    direction: EdgeDirection,
    conditions: EdgeConditions,
    vertex: Option<VertexId>,
    position: usize,
    last_row: i64,
    exhausted: bool,
}

impl SqliteEdgeCursor {
    pub fn new<I, S>(
        store: Arc<EdgeStore>,
        collections: I,
        direction: EdgeDirection,
    ) -> Result<Self, NeighbourError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collections: Vec<String> = collections.into_iter().map(Into::into).collect();
        if collections.is_empty() {
            return Err(NeighbourError::invalid_input(
                "edge cursor needs at least one collection",
            ));
        }
        if collections.iter().any(|name| name.trim().is_empty()) {
            return Err(NeighbourError::invalid_input(
                "edge collection names must be non-empty",
            ));
        }
        Ok(Self {
            store,
            collections,
            direction,
            conditions: EdgeConditions::default(),
            vertex: None,
            position: 0,
            last_row: 0,
            exhausted: true,
        })
    }

    pub fn direction(&self) -> EdgeDirection {
        self.direction
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    pub fn conditions(&self) -> &EdgeConditions {
        &self.conditions
    }

    /// Builder form of [`EdgeCursor::prepare_index_expressions`], for cursors whose
    /// conditions are known before a provider is built around them.
    pub fn with_conditions(mut self, conditions: EdgeConditions) -> Self {
        self.conditions = conditions;
        self
    }
}

impl EdgeCursor for SqliteEdgeCursor {
    type Expressions = EdgeConditions;

    fn rearm(&mut self, vertex: &VertexId, _depth: u64) -> Result<(), NeighbourError> {
        self.vertex = Some(vertex.clone());
        self.position = 0;
        self.last_row = 0;
        self.exhausted = false;
        Ok(())
    }

    fn has_more(&self, _depth: u64) -> bool {
        !self.exhausted
    }

    fn read_next(
        &mut self,
        batch_size: usize,
        depth: u64,
        sink: &mut EdgeSink<'_>,
    ) -> Result<(), NeighbourError> {
        let vertex = self
            .vertex
            .clone()
            .ok_or_else(|| NeighbourError::contract("read_next() called before rearm()"))?;
        let filters = self.conditions.filters_for(depth);
        let mut produced = 0usize;

        while produced < batch_size && !self.exhausted {
            let wanted = batch_size - produced;
            let cursor_id = self.position;
            let mut last_row = self.last_row;
            let scanned = self.store.scan_page(
                &self.collections[cursor_id],
                self.direction,
                &vertex,
                self.last_row,
                wanted,
                &mut |row: i64, bytes: &[u8]| -> Result<(), NeighbourError> {
                    last_row = row;
                    if !filters.is_empty() {
                        let document: Value = serde_json::from_slice(bytes)
                            .map_err(|e| NeighbourError::document(format!("edge {row}: {e}")))?;
                        if !filters.iter().all(|filter| filter.matches(&document)) {
                            return Ok(());
                        }
                    }
                    sink(EdgeToken(row), bytes, cursor_id);
                    produced += 1;
                    Ok(())
                },
            )?;
            self.last_row = last_row;

            if scanned < wanted {
                self.position += 1;
                self.last_row = 0;
                if self.position == self.collections.len() {
                    self.exhausted = true;
                }
            }
        }
        Ok(())
    }

    fn prepare_index_expressions(
        &mut self,
        expressions: &EdgeConditions,
    ) -> Result<(), NeighbourError> {
        self.conditions = expressions.clone();
        Ok(())
    }

    fn has_depth_specific_lookup(&self, depth: u64) -> bool {
        self.conditions.by_depth.contains_key(&depth)
    }

    fn is_depth_dependent(expressions: &EdgeConditions) -> bool {
        expressions.has_depth_filters()
    }

    fn has_depth_filters(&self) -> bool {
        self.conditions.has_depth_filters()
    }
}
