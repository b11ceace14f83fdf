//! SQLite repository implementation
//!
//! Every collection lives in the one `documents` table, keyed by
//! `(collection, uuid)`. Node maps and business fields are stored as JSON
//! text; timestamps as RFC 3339 with microseconds.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::SharedConnection;
use crate::errors::{corrupt_row, from_rusqlite, Result};
use nodelink_core::errors::NodeLinkError;
use nodelink_core::model::{Document, FieldMap, NodeMap};
use nodelink_core::store::Repository;

const SELECT_COLUMNS: &str = "uuid, version, is_deleted, parent_nodes, child_nodes, fields, created_at, updated_at";

/// `Repository` for one collection over a shared SQLite connection
pub struct SqliteRepository {
    collection: String,
    conn: SharedConnection,
}

impl std::fmt::Debug for SqliteRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepository")
            .field("collection", &self.collection)
            .finish()
    }
}

/// Raw column values of one row, decoded outside the rusqlite callback
struct StoredRow {
    uuid: String,
    version: i64,
    is_deleted: bool,
    parent_nodes: String,
    child_nodes: String,
    fields: String,
    created_at: String,
    updated_at: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get(0)?,
            version: row.get(1)?,
            is_deleted: row.get(2)?,
            parent_nodes: row.get(3)?,
            child_nodes: row.get(4)?,
            fields: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_document(self, collection: &str) -> Result<Document> {
        let corrupt = |reason: String| corrupt_row(collection, &self.uuid, reason);

        let parent_nodes: NodeMap =
            serde_json::from_str(&self.parent_nodes).map_err(|e| corrupt(e.to_string()))?;
        let child_nodes: NodeMap =
            serde_json::from_str(&self.child_nodes).map_err(|e| corrupt(e.to_string()))?;
        let fields: FieldMap =
            serde_json::from_str(&self.fields).map_err(|e| corrupt(e.to_string()))?;
        let version = u64::try_from(self.version).map_err(|e| corrupt(e.to_string()))?;
        let created_at = parse_timestamp(&self.created_at).map_err(corrupt)?;
        let updated_at = parse_timestamp(&self.updated_at).map_err(corrupt)?;

        Ok(Document {
            uuid: self.uuid,
            collection: collection.to_string(),
            parent_nodes,
            child_nodes,
            fields,
            is_deleted: self.is_deleted,
            version,
            created_at,
            updated_at,
        })
    }
}

impl SqliteRepository {
    pub fn new(collection: impl Into<String>, conn: SharedConnection) -> Self {
        Self {
            collection: collection.into(),
            conn,
        }
    }

    fn not_found(&self, uuid: &str) -> NodeLinkError {
        NodeLinkError::not_found(self.collection.clone(), uuid)
    }

    fn stored_version(&self, conn: &rusqlite::Connection, uuid: &str) -> Result<Option<u64>> {
        let version: Option<i64> = conn
            .query_row(
                "SELECT version FROM documents WHERE collection = ?1 AND uuid = ?2",
                params![self.collection, uuid],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;
        Ok(version.map(|v| v.max(0) as u64))
    }
}

impl Repository for SqliteRepository {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn find_by_uuid(&self, uuid: &str) -> Result<Document> {
        let row = self
            .conn
            .lock()
            .query_row(
                &format!(
                    "SELECT {} FROM documents
                     WHERE collection = ?1 AND uuid = ?2 AND is_deleted = 0",
                    SELECT_COLUMNS
                ),
                params![self.collection, uuid],
                StoredRow::from_row,
            )
            .optional()
            .map_err(from_rusqlite)?;

        match row {
            Some(row) => row.into_document(&self.collection),
            None => Err(self.not_found(uuid)),
        }
    }

    fn save(&self, mut document: Document) -> Result<Document> {
        document.collection = self.collection.clone();
        document.version = 1;

        let inserted = self
            .conn
            .lock()
            .execute(
                "INSERT INTO documents
                    (collection, uuid, version, is_deleted, parent_nodes, child_nodes, fields, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(collection, uuid) DO NOTHING",
                params![
                    self.collection,
                    document.uuid,
                    1i64,
                    document.is_deleted,
                    serde_json::to_string(&document.parent_nodes)?,
                    serde_json::to_string(&document.child_nodes)?,
                    serde_json::to_string(&document.fields)?,
                    format_timestamp(&document.created_at),
                    format_timestamp(&document.updated_at),
                ],
            )
            .map_err(from_rusqlite)?;

        if inserted == 0 {
            return Err(NodeLinkError::AlreadyExists {
                collection: self.collection.clone(),
                uuid: document.uuid,
            });
        }
        tracing::debug!(collection = %self.collection, uuid = %document.uuid, "document saved");
        Ok(document)
    }

    fn update(&self, mut document: Document) -> Result<Document> {
        let expected = document.version;
        document.collection = self.collection.clone();
        document.version = expected + 1;
        document.updated_at = Utc::now();

        let conn = self.conn.lock();
        let updated = conn
            .execute(
                "UPDATE documents SET
                    version = ?3, is_deleted = ?4, parent_nodes = ?5, child_nodes = ?6,
                    fields = ?7, updated_at = ?8
                 WHERE collection = ?1 AND uuid = ?2 AND version = ?9",
                params![
                    self.collection,
                    document.uuid,
                    document.version as i64,
                    document.is_deleted,
                    serde_json::to_string(&document.parent_nodes)?,
                    serde_json::to_string(&document.child_nodes)?,
                    serde_json::to_string(&document.fields)?,
                    format_timestamp(&document.updated_at),
                    expected as i64,
                ],
            )
            .map_err(from_rusqlite)?;

        if updated == 0 {
            return match self.stored_version(&conn, &document.uuid)? {
                None => Err(self.not_found(&document.uuid)),
                Some(found) => Err(NodeLinkError::VersionConflict {
                    collection: self.collection.clone(),
                    uuid: document.uuid,
                    expected,
                    found,
                }),
            };
        }
        tracing::debug!(
            collection = %self.collection,
            uuid = %document.uuid,
            version = document.version,
            "document updated"
        );
        Ok(document)
    }

    fn delete_by_uuid(&self, uuid: &str) -> Result<()> {
        let deleted = self
            .conn
            .lock()
            .execute(
                "DELETE FROM documents WHERE collection = ?1 AND uuid = ?2",
                params![self.collection, uuid],
            )
            .map_err(from_rusqlite)?;

        if deleted == 0 {
            return Err(self.not_found(uuid));
        }
        tracing::debug!(collection = %self.collection, uuid, "document deleted");
        Ok(())
    }

    fn list(&self) -> Result<Vec<Document>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM documents
                     WHERE collection = ?1 AND is_deleted = 0
                     ORDER BY uuid",
                    SELECT_COLUMNS
                ))
                .map_err(from_rusqlite)?;
            let rows = stmt
                .query_map(params![self.collection], StoredRow::from_row)
                .map_err(from_rusqlite)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(from_rusqlite)?;
            rows
        };

        rows.into_iter()
            .map(|row| row.into_document(&self.collection))
            .collect()
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{}': {}", text, e))
}
