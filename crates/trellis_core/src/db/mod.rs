//! Document database bootstrap.
//!
//! # Responsibility
//! - Open SQLite connections that hold layout and menu documents.
//! - Bring the `documents` schema up to the version this binary writes.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - A returned connection always has a `documents` table; a database that
//!   claims a current version without one is refused, not repaired.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// File was written by a newer trellis with a schema this one can't read.
    NewerSchema { found: u32, supported: u32 },
    /// One migration script failed; the whole upgrade was rolled back.
    MigrationFailed {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// Schema version says migrated, but there is nowhere to put documents.
    DocumentsTableMissing { version: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NewerSchema { found, supported } => write!(
                f,
                "document database schema {found} is newer than supported {supported}"
            ),
            Self::MigrationFailed {
                version,
                name,
                source,
            } => write!(f, "migration {version} ({name}) failed: {source}"),
            Self::DocumentsTableMissing { version } => write!(
                f,
                "database at schema {version} has no documents table"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => Some(err),
            Self::NewerSchema { .. } | Self::DocumentsTableMissing { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
