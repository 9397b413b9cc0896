//! Domain model for layout and menu documents.
//!
//! # Responsibility
//! - Define paths, nodes, attribute maps and whole documents.
//! - Keep one node shape for both layout and menu flavors.
//!
//! # Invariants
//! - Paths are the only node address; there is no separate node id.
//! - Attribute precedence is submitted > existing > default.

pub mod attributes;
pub mod document;
pub mod node;
pub mod path;
