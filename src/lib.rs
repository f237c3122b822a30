//! Neighbour expansion cache for graph traversals.
//!
//! A traversal revisits the same vertex many times (cycles, diamonds, path enumeration,
//! several start vertices). [`NeighbourProvider`] reads a vertex's edges from an
//! [`EdgeCursor`] in batches the first time and keeps those batches in a
//! [`NeighbourCache`]. Later visits replay the batches from memory, but only once the
//! first scan ran to completion; a partially read vertex is never served from cache.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use neighbourcache::{
//!     EdgeDirection, EdgeStore, MemoryMonitor, NeighbourProvider, ProviderConfig,
//!     SqliteEdgeCursor, VertexId, bfs::bfs_vertices,
//! };
//! use serde_json::json;
//!
//! let store = Arc::new(EdgeStore::open_in_memory()?);
//! store.insert_edge("knows", &"persons/a".into(), &"persons/b".into(), &json!({}))?;
//!
//! let cursor = SqliteEdgeCursor::new(store.clone(), ["knows"], EdgeDirection::Outgoing)?;
//! let monitor = Arc::new(MemoryMonitor::new());
//! let mut provider = NeighbourProvider::new(cursor, monitor, &ProviderConfig::default())?;
//! let start = VertexId::from("persons/a");
//! let reached = bfs_vertices(&mut provider, &start, 3, EdgeDirection::Outgoing)?;
//! assert_eq!(reached.len(), 2);
//! provider.clear();
//! # Ok::<(), neighbourcache::NeighbourError>(())
//! ```
//!
//! # Public API Organization
//!
//! - [`EdgeRecord`], [`EdgeBatch`], [`SharedBatch`] - edge snapshots and their batches
//! - [`NeighbourCache`], [`BatchReplayIterator`] - per-vertex batch cache
//! - [`NeighbourProvider`] - cache-or-cursor expansion of traversal steps
//! - [`EdgeCursor`], [`TraversalStep`], [`ResourceMonitor`] - collaborator contracts
//! - [`EdgeStore`], [`SqliteEdgeCursor`] - SQLite-backed edge storage
//! - [`bfs`], [`multi_hop`] - traversal drivers built on the provider

pub mod bench_utils;
pub mod bfs;
pub mod cache;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod monitor;
pub mod multi_hop;
pub mod provider;
pub mod record;
pub mod schema;
pub mod sqlite_cursor;
pub mod store;

pub use crate::cache::{BatchReplayIterator, CacheStats, NeighbourCache};
pub use crate::config::{DEFAULT_BATCH_SIZE, ProviderConfig, StoreConfig};
pub use crate::cursor::{EdgeCursor, EdgeDirection, EdgeSink, Step, TraversalStep};
pub use crate::errors::NeighbourError;
pub use crate::monitor::{MemoryMonitor, MemorySnapshot, ResourceMonitor, SharedMonitor};
pub use crate::provider::{NeighbourProvider, ProviderStats};
pub use crate::record::{EdgeBatch, EdgeRecord, EdgeToken, SharedBatch, VertexId};
pub use crate::sqlite_cursor::{EdgeConditions, EdgeFilter, SqliteEdgeCursor};
pub use crate::store::EdgeStore;
