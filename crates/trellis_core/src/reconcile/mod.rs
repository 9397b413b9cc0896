//! Ordering reconciliation: flat submission -> nested document.
//!
//! # Responsibility
//! - Decode and validate client-submitted orderings and item payloads.
//! - Rebuild a document tree that carries every surviving item forward by
//!   its provenance path.
//!
//! # Invariants
//! - Reconciliation is all-or-nothing; a failure produces no tree.
//! - No item is duplicated, and no item is invented beyond the submission.

pub mod reconciler;
pub mod submission;

use crate::model::document::DocumentKind;
use crate::model::node::PatchError;
use crate::model::path::{NodePath, PathError};
use crate::registry::RegistryError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use reconciler::OrderingReconciler;
pub use submission::{OrderedItem, Ordering, Submission};

/// Invalid-submission errors raised while decoding or reconciling.
#[derive(Debug)]
pub enum ReconcileError {
    /// Ordering, items or settings do not have the expected JSON shape.
    Malformed(String),
    /// A parent path, provenance path, item key or child name is invalid.
    InvalidPath(PathError),
    /// Column key is not a non-negative integer.
    InvalidColumn { parent: NodePath, column: String },
    /// Same parent submitted twice under different spellings.
    DuplicateParent(NodePath),
    /// Submission has no ordering for the root path.
    MissingRootOrdering,
    /// One child name appears more than once under a parent.
    DuplicateName { parent: NodePath, name: String },
    /// One provenance path is claimed by more than one placed item.
    DuplicateProvenance(NodePath),
    /// Submitted parent path is never placed under the root.
    OrphanParent(NodePath),
    /// Item payload targets a path the ordering does not place.
    UnplacedPayload(NodePath),
    /// Item payload object cannot be decoded.
    InvalidPayload { path: NodePath, source: PatchError },
    /// Registry refused to build the node at `path`.
    Node { path: NodePath, source: RegistryError },
    /// Registry flavor does not match the document flavor.
    FlavorMismatch {
        expected: DocumentKind,
        actual: DocumentKind,
    },
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed submission: {message}"),
            Self::InvalidPath(err) => write!(f, "{err}"),
            Self::InvalidColumn { parent, column } => {
                write!(f, "invalid column `{column}` under `{parent}`")
            }
            Self::DuplicateParent(path) => write!(f, "parent `{path}` submitted more than once"),
            Self::MissingRootOrdering => write!(f, "submission has no root ordering"),
            Self::DuplicateName { parent, name } => {
                write!(f, "child `{name}` appears more than once under `{parent}`")
            }
            Self::DuplicateProvenance(path) => {
                write!(f, "provenance `{path}` is claimed by more than one item")
            }
            Self::OrphanParent(path) => write!(f, "parent `{path}` is not placed in the tree"),
            Self::UnplacedPayload(path) => {
                write!(f, "item payload for `{path}` has no place in the ordering")
            }
            Self::InvalidPayload { path, source } => write!(f, "item `{path}`: {source}"),
            Self::Node { path, source } => write!(f, "item `{path}`: {source}"),
            Self::FlavorMismatch { expected, actual } => {
                write!(f, "cannot reconcile a {actual} with a {expected} registry")
            }
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPath(err) => Some(err),
            Self::InvalidPayload { source, .. } => Some(source),
            Self::Node { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PathError> for ReconcileError {
    fn from(value: PathError) -> Self {
        Self::InvalidPath(value)
    }
}
