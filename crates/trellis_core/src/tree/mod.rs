//! Path-addressable tree engine.
//!
//! # Responsibility
//! - Address nodes of arbitrary depth through slash-delimited paths.
//! - Keep column grouping visible to callers without making columns path
//!   segments.

pub mod path_tree;
