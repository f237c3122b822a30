use rusqlite::Connection;

use crate::errors::NeighbourError;

pub const SCHEMA_VERSION: i64 = 1;

pub fn ensure_schema(conn: &Connection) -> Result<(), NeighbourError> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| NeighbourError::schema(e.to_string()))?;
    if version > SCHEMA_VERSION {
        return Err(NeighbourError::schema(format!(
            "store schema version {version} is newer than supported version {SCHEMA_VERSION}"
        )));
    }
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS edges (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            collection  TEXT NOT NULL,
            from_vertex TEXT NOT NULL,
            to_vertex   TEXT NOT NULL,
            document    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(collection, from_vertex, id);
        CREATE INDEX IF NOT EXISTS idx_edges_to ON edges(collection, to_vertex, id);
        "#,
    )
    .map_err(|e| NeighbourError::schema(e.to_string()))?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(|e| NeighbourError::schema(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(matches!(
            ensure_schema(&conn),
            Err(NeighbourError::SchemaError(_))
        ));
    }
}
