//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the whole-document store contract used by services.
//! - Isolate SQLite details from tree and reconciliation logic.
//!
//! # Invariants
//! - Repository APIs report "not stored" as `Ok(None)`, not as an error.

pub mod document_repo;
