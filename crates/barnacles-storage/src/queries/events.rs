// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Insert and read-back operations for persisted event payloads.

use barnacles_core::{BarnaclesError, StoreId, Target};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, quote_identifier, Database};

/// A stored row as read back from a target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub id: StoreId,
    pub payload: String,
}

/// Run a compiled insert statement with `payload` bound to `?1`.
///
/// Returns the identifier from the statement's result row, if it produced one.
pub async fn insert_payload(
    db: &Database,
    statement: &str,
    payload: &str,
) -> Result<Option<StoreId>, BarnaclesError> {
    let statement = statement.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<i64>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&statement)?;
            stmt.query_row(params![payload], |row| row.get(0)).optional()
        })
        .await
        .map(|id| id.map(StoreId))
        .map_err(map_tr_err)
}

/// Read every row of `target` in insertion order.
pub async fn list_rows(db: &Database, target: &Target) -> Result<Vec<StoredRow>, BarnaclesError> {
    let sql = format!(
        "SELECT rowid, {column} FROM {table} ORDER BY rowid ASC",
        column = quote_identifier(target.column()),
        table = quote_identifier(target.table()),
    );
    db.connection()
        .call(move |conn| -> Result<Vec<StoredRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(StoredRow {
                    id: StoreId(row.get(0)?),
                    payload: row.get(1)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barnacles_config::model::ConnectionConfig;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, Target, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = ConnectionConfig {
            database_path: dir.path().join("test.db").display().to_string(),
            ..ConnectionConfig::default()
        };
        let db = Database::open(&config).await.unwrap();
        let target = Target::new("dynamb", "dynamb").unwrap();
        db.ensure_table(&target).await.unwrap();
        (db, target, dir)
    }

    const INSERT: &str = r#"INSERT INTO "dynamb" ("dynamb") VALUES (?1) RETURNING rowid"#;

    #[tokio::test]
    async fn insert_returns_increasing_ids() {
        let (db, target, _dir) = setup_db().await;

        let first = insert_payload(&db, INSERT, r#"{"temperature":20}"#).await.unwrap();
        let second = insert_payload(&db, INSERT, r#"{"temperature":21}"#).await.unwrap();

        assert_eq!(first, Some(StoreId(1)));
        assert_eq!(second, Some(StoreId(2)));
        let rows = list_rows(&db, &target).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].payload, r#"{"temperature":21}"#);
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn payload_with_quotes_is_stored_verbatim() {
        let (db, target, _dir) = setup_db().await;
        let payload = r#"{"name":"O'Brien'); DROP TABLE dynamb; --","note":"line\nbreak"}"#;

        insert_payload(&db, INSERT, payload).await.unwrap();

        let rows = list_rows(&db, &target).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payload, payload);
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn statement_without_result_row_returns_none() {
        let (db, _target, _dir) = setup_db().await;
        let id = insert_payload(&db, r#"INSERT INTO "dynamb" ("dynamb") VALUES (?1)"#, "{}")
            .await;
        // A plain INSERT yields no row; query_row reports that as no result.
        assert!(matches!(id, Ok(None)));
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn missing_table_is_a_storage_error() {
        let (db, _target, _dir) = setup_db().await;
        let result = insert_payload(&db, r#"INSERT INTO "nope" ("nope") VALUES (?1) RETURNING rowid"#, "{}").await;
        assert!(matches!(result, Err(BarnaclesError::Storage { .. })));
        db.checkpoint().await.unwrap();
    }
}
