//! Document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Load and save whole layout/menu documents by kind and id.
//! - Keep SQL and body encoding details inside the repository boundary.
//!
//! # Invariants
//! - The unit of durability is the whole document; saves replace the body.
//! - Concurrent saves are not coordinated: the last writer wins.
//! - Read paths reject bodies that decode to a different document kind.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::document::{Document, DocumentKind};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from document store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Document body cannot be encoded or decoded.
    Codec(serde_json::Error),
    /// Document id is blank.
    InvalidDocumentId(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid document.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "document body codec error: {err}"),
            Self::InvalidDocumentId(id) => write!(f, "invalid document id: `{id}`"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "document store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid document data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// Whole-document persistence contract.
pub trait DocumentStore {
    /// Loads one document; `None` when no document is stored under `id`.
    fn load(&self, kind: DocumentKind, id: &str) -> StoreResult<Option<Document>>;
    /// Writes one document, replacing any stored body.
    fn save(&self, kind: DocumentKind, id: &str, document: &Document) -> StoreResult<()>;
    /// Returns whether a document is stored under `id`.
    fn exists(&self, kind: DocumentKind, id: &str) -> StoreResult<bool>;
    /// Lists stored ids of `kind` starting with `prefix`, sorted ascending.
    fn list_ids(&self, kind: DocumentKind, prefix: &str) -> StoreResult<Vec<String>>;
}

/// SQLite-backed document store.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Creates store from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_document_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn load(&self, kind: DocumentKind, id: &str) -> StoreResult<Option<Document>> {
        let id = normalize_id(id)?;
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body
                 FROM documents
                 WHERE kind = ?1
                   AND doc_id = ?2;",
                params![kind.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(body) = body else {
            debug!(
                "event=document_load module=repo status=missing kind={} doc_id={}",
                kind, id
            );
            return Ok(None);
        };

        let document: Document = serde_json::from_str(&body).map_err(|err| {
            error!(
                "event=document_load module=repo status=error kind={} doc_id={} error_code=body_decode_failed",
                kind, id
            );
            StoreError::Codec(err)
        })?;
        if document.kind() != kind {
            return Err(StoreError::InvalidData(format!(
                "document `{id}` stored as {kind} decodes to {}",
                document.kind()
            )));
        }
        debug!(
            "event=document_load module=repo status=ok kind={} doc_id={} nodes={}",
            kind,
            id,
            document.tree.len()
        );
        Ok(Some(document))
    }

    fn save(&self, kind: DocumentKind, id: &str, document: &Document) -> StoreResult<()> {
        let id = normalize_id(id)?;
        if document.kind() != kind {
            return Err(StoreError::InvalidData(format!(
                "cannot save a {} as {kind} `{id}`",
                document.kind()
            )));
        }

        let body = serde_json::to_string(document)?;
        self.conn.execute(
            "INSERT INTO documents (kind, doc_id, title, body)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(kind, doc_id) DO UPDATE SET
                 title = excluded.title,
                 body = excluded.body,
                 updated_at = (strftime('%s', 'now') * 1000);",
            params![kind.as_str(), id, document.title.as_deref(), body],
        )?;
        debug!(
            "event=document_save module=repo status=ok kind={} doc_id={} bytes={}",
            kind,
            id,
            body.len()
        );
        Ok(())
    }

    fn exists(&self, kind: DocumentKind, id: &str) -> StoreResult<bool> {
        let id = normalize_id(id)?;
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM documents
                WHERE kind = ?1
                  AND doc_id = ?2
            );",
            params![kind.as_str(), id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_ids(&self, kind: DocumentKind, prefix: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id
             FROM documents
             WHERE kind = ?1
             ORDER BY doc_id ASC;",
        )?;
        let mut rows = stmt.query([kind.as_str()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            if id.starts_with(prefix) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

fn normalize_id(id: &str) -> StoreResult<&str> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidDocumentId(id.to_string()));
    }
    Ok(trimmed)
}

fn ensure_document_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "documents")? {
        return Err(StoreError::MissingRequiredTable("documents"));
    }

    for column in ["kind", "doc_id", "title", "body", "created_at", "updated_at"] {
        if !table_has_column(conn, "documents", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "documents",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
