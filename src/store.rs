//! SQLite-backed edge collections.
//!
//! Edges are stored as JSON documents carrying `_id`, `_from` and `_to` next to the
//! caller's attributes. The connection sits behind a mutex so one store can back the
//! cursors of several traversal workers.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::debug;

use crate::{
    config::StoreConfig,
    cursor::EdgeDirection,
    errors::NeighbourError,
    record::{EdgeToken, VertexId},
    schema::ensure_schema,
};

const OUTGOING_PAGE_SQL: &str = "SELECT id, document FROM edges \
     WHERE collection=?1 AND from_vertex=?2 AND id>?3 ORDER BY id LIMIT ?4";
const INCOMING_PAGE_SQL: &str = "SELECT id, document FROM edges \
     WHERE collection=?1 AND to_vertex=?2 AND id>?3 ORDER BY id LIMIT ?4";

pub struct EdgeStore {
    conn: Mutex<Connection>,
}

impl EdgeStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, NeighbourError> {
        Self::open_with_config(path, &StoreConfig::default())
    }

    pub fn open_in_memory() -> Result<Self, NeighbourError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        Self::from_connection(conn, &StoreConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        cfg: &StoreConfig,
    ) -> Result<Self, NeighbourError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        debug!(path = %path.as_ref().display(), "edge_store.open");
        Self::from_connection(conn, cfg)
    }

    fn from_connection(conn: Connection, cfg: &StoreConfig) -> Result<Self, NeighbourError> {
        for (key, value) in &cfg.pragma_settings {
            let pragma_sql = format!("PRAGMA {} = {}", key, value);
            match conn.execute(&pragma_sql, []) {
                Ok(_) => {}
                // Some PRAGMAs report their new value as a result row.
                Err(rusqlite::Error::ExecuteReturnedResults) => {}
                Err(e) => {
                    return Err(NeighbourError::storage(format!(
                        "PRAGMA {} = {}: {}",
                        key, value, e
                    )));
                }
            }
        }
        if let Some(capacity) = cfg.cache_size {
            conn.set_prepared_statement_cache_capacity(capacity);
        }
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Inserts an edge from `from` to `to` and returns its token. `data` must be a JSON
    /// object; its `_id`, `_from` and `_to` attributes are overwritten.
    pub fn insert_edge(
        &self,
        collection: &str,
        from: &VertexId,
        to: &VertexId,
        data: &Value,
    ) -> Result<EdgeToken, NeighbourError> {
        validate_edge(collection, from, to)?;
        let Value::Object(attributes) = data else {
            return Err(NeighbourError::invalid_input("edge data must be a JSON object"));
        };

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        tx.execute(
            "INSERT INTO edges(collection, from_vertex, to_vertex, document) \
             VALUES(?1, ?2, ?3, '{}')",
            params![collection, from.as_str(), to.as_str()],
        )
        .map_err(|e| NeighbourError::storage(e.to_string()))?;
        let id = tx.last_insert_rowid();

        let mut document = attributes.clone();
        document.insert("_id".into(), Value::String(format!("{collection}/{id}")));
        document.insert("_from".into(), Value::String(from.to_string()));
        document.insert("_to".into(), Value::String(to.to_string()));
        let text = serde_json::to_string(&Value::Object(document))
            .map_err(|e| NeighbourError::invalid_input(e.to_string()))?;
        tx.execute(
            "UPDATE edges SET document=?1 WHERE id=?2",
            params![text, id],
        )
        .map_err(|e| NeighbourError::storage(e.to_string()))?;
        tx.commit()
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        Ok(EdgeToken(id))
    }

    pub fn remove_edge(&self, token: EdgeToken) -> Result<(), NeighbourError> {
        let affected = self
            .conn
            .lock()
            .execute("DELETE FROM edges WHERE id=?1", params![token.row_id()])
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        if affected == 0 {
            return Err(NeighbourError::not_found(format!("edge {}", token.row_id())));
        }
        Ok(())
    }

    pub fn edge_document(&self, token: EdgeToken) -> Result<Value, NeighbourError> {
        let text: Option<String> = self
            .conn
            .lock()
            .query_row(
                "SELECT document FROM edges WHERE id=?1",
                params![token.row_id()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        let text =
            text.ok_or_else(|| NeighbourError::not_found(format!("edge {}", token.row_id())))?;
        serde_json::from_str(&text).map_err(|e| NeighbourError::document(e.to_string()))
    }

    pub fn edge_count(&self, collection: &str) -> Result<usize, NeighbourError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM edges WHERE collection=?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        Ok(count as usize)
    }

    /// Streams up to `limit` edges of `vertex` in `collection` with row id above
    /// `after_row`, in row id order. `sink` sees the document bytes straight from the
    /// statement's row buffer. Returns the number of rows scanned.
    pub(crate) fn scan_page(
        &self,
        collection: &str,
        direction: EdgeDirection,
        vertex: &VertexId,
        after_row: i64,
        limit: usize,
        sink: &mut dyn FnMut(i64, &[u8]) -> Result<(), NeighbourError>,
    ) -> Result<usize, NeighbourError> {
        let sql = match direction {
            EdgeDirection::Outgoing => OUTGOING_PAGE_SQL,
            EdgeDirection::Incoming => INCOMING_PAGE_SQL,
        };
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        let mut rows = stmt
            .query(params![collection, vertex.as_str(), after_row, limit as i64])
            .map_err(|e| NeighbourError::storage(e.to_string()))?;
        let mut scanned = 0usize;
        while let Some(row) = rows
            .next()
            .map_err(|e| NeighbourError::storage(e.to_string()))?
        {
            let id: i64 = row
                .get(0)
                .map_err(|e| NeighbourError::storage(e.to_string()))?;
            let value = row
                .get_ref(1)
                .map_err(|e| NeighbourError::storage(e.to_string()))?;
            let bytes = value
                .as_bytes()
                .map_err(|e| NeighbourError::storage(e.to_string()))?;
            sink(id, bytes)?;
            scanned += 1;
        }
        Ok(scanned)
    }
}

fn validate_edge(collection: &str, from: &VertexId, to: &VertexId) -> Result<(), NeighbourError> {
    if collection.trim().is_empty() {
        return Err(NeighbourError::invalid_input("edge collection must be set"));
    }
    if from.as_str().is_empty() || to.as_str().is_empty() {
        return Err(NeighbourError::invalid_input(
            "edge endpoints must be non-empty vertex ids",
        ));
    }
    Ok(())
}
