//! Schema history of the document database.
//!
//! Each step is a named SQL script; `user_version` records the last one that
//! ran. Upgrades run in a single transaction so a half-migrated file is never
//! left behind.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "documents",
        sql: include_str!("0001_documents.sql"),
    },
    Migration {
        version: 2,
        name: "document_kind_index",
        sql: include_str!("0002_document_kind_index.sql"),
    },
];

/// Schema version written by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Upgrades the database to [`latest_version`] and checks that the
/// `documents` table is present afterwards.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::NewerSchema { found, supported });
    }

    if found < supported {
        let tx = conn.transaction()?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
            tx.execute_batch(migration.sql)
                .and_then(|()| {
                    tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
                })
                .map_err(|source| DbError::MigrationFailed {
                    version: migration.version,
                    name: migration.name,
                    source,
                })?;
            info!(
                "event=db_migrate_step module=db status=ok version={} name={}",
                migration.version, migration.name
            );
        }
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok from_version={} to_version={}",
            found, supported
        );
    }

    if !documents_table_exists(conn)? {
        return Err(DbError::DocumentsTableMissing { version: supported });
    }
    Ok(())
}

fn documents_table_exists(conn: &Connection) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'documents');",
        [],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
