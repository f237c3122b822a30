//! Storage-independent edge snapshots and the batches that carry them.
//!
//! A storage cursor hands out edge bytes that live only until its next advance, so every
//! edge is copied into an [`EdgeRecord`] the moment it is read. Records are grouped into
//! [`EdgeBatch`]es in cursor order; once a batch is wrapped in a [`SharedBatch`] it is
//! shared between the neighbour cache and whoever received it from the provider.

use std::{fmt, mem, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::errors::NeighbourError;

/// Opaque vertex identity, conventionally `collection/key`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(Arc<str>);

impl VertexId {
    pub fn new<T: AsRef<str>>(id: T) -> Self {
        VertexId(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VertexId {
    fn from(value: &str) -> Self {
        VertexId::new(value)
    }
}

impl From<String> for VertexId {
    fn from(value: String) -> Self {
        VertexId(Arc::from(value))
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of an edge in storage. Copied by value, never re-validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeToken(pub i64);

impl EdgeToken {
    pub fn row_id(self) -> i64 {
        self.0
    }
}

/// One edge as it was read from storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeRecord {
    token: EdgeToken,
    payload: Box<[u8]>,
    cursor_id: usize,
}

impl EdgeRecord {
    /// Copies `payload` out of the cursor's scratch buffer.
    pub fn new(token: EdgeToken, payload: &[u8], cursor_id: usize) -> Self {
        Self {
            token,
            payload: payload.into(),
            cursor_id,
        }
    }

    pub fn token(&self) -> EdgeToken {
        self.token
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Index of the underlying collection cursor that produced this edge.
    pub fn cursor_id(&self) -> usize {
        self.cursor_id
    }

    pub fn size_bytes(&self) -> usize {
        mem::size_of::<Self>() + self.payload.len()
    }

    /// Parses the payload as a JSON edge document.
    pub fn document(&self) -> Result<serde_json::Value, NeighbourError> {
        serde_json::from_slice(&self.payload).map_err(|e| {
            NeighbourError::document(format!("edge {}: {e}", self.token.row_id()))
        })
    }
}

/// Edges produced by one cursor advance, in cursor order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeBatch {
    records: Vec<EdgeRecord>,
}

/// A batch shared between the cache and in-flight consumers.
pub type SharedBatch = Arc<EdgeBatch>;

impl EdgeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, record: EdgeRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EdgeRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[EdgeRecord] {
        &self.records
    }

    /// Bytes charged to the resource monitor when this batch is cached.
    pub fn size_bytes(&self) -> usize {
        mem::size_of::<Self>() + self.records.iter().map(EdgeRecord::size_bytes).sum::<usize>()
    }

    pub fn into_shared(self) -> SharedBatch {
        Arc::new(self)
    }
}

impl<'a> IntoIterator for &'a EdgeBatch {
    type Item = &'a EdgeRecord;
    type IntoIter = std::slice::Iter<'a, EdgeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
