//! Use-case services for layout and menu editing.
//!
//! # Responsibility
//! - Orchestrate load -> mutate -> persist for one document per call.
//! - Map store, registry and reconciliation failures to one typed outcome.
//!
//! # Invariants
//! - Nothing is written when a call fails before its final save.
//! - Store failures are passed through tagged with the triggering operation.

pub mod layout_service;
pub mod menu_service;

use crate::model::document::DocumentKind;
use crate::model::path::NodePath;
use crate::reconcile::ReconcileError;
use crate::registry::RegistryError;
use crate::repo::document_repo::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from layout/menu service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// No document is stored under this kind and id.
    DocumentNotFound { kind: DocumentKind, id: String },
    /// Document exists but the path does not resolve.
    ItemNotFound { id: String, path: NodePath },
    /// Named layout preset does not exist.
    PresetNotFound(String),
    /// Ordering/item submission is malformed or inconsistent.
    InvalidSubmission(ReconcileError),
    /// Node payload is not valid for this document flavor.
    InvalidNode { path: NodePath, source: RegistryError },
    /// Caller input other than a submission is unusable.
    InvalidInput(String),
    /// Write would overwrite a different existing document.
    ConflictOnCreate { kind: DocumentKind, id: String },
    /// Store failure, tagged with the operation that triggered it.
    Store {
        operation: &'static str,
        source: StoreError,
    },
}

impl ServiceError {
    /// Whether this is one of the "not found" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DocumentNotFound { .. } | Self::ItemNotFound { .. } | Self::PresetNotFound(_)
        )
    }

    /// Stable short code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DocumentNotFound { .. } => "document_not_found",
            Self::ItemNotFound { .. } => "item_not_found",
            Self::PresetNotFound(_) => "preset_not_found",
            Self::InvalidSubmission(_) => "invalid_submission",
            Self::InvalidNode { .. } => "invalid_node",
            Self::InvalidInput(_) => "invalid_input",
            Self::ConflictOnCreate { .. } => "conflict_on_create",
            Self::Store { .. } => "store_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DocumentNotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::ItemNotFound { id, path } => write!(f, "item `{path}` not found in `{id}`"),
            Self::PresetNotFound(id) => write!(f, "preset not found: {id}"),
            Self::InvalidSubmission(err) => write!(f, "invalid submission: {err}"),
            Self::InvalidNode { path, source } => write!(f, "invalid node `{path}`: {source}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::ConflictOnCreate { kind, id } => write!(f, "{kind} `{id}` already exists"),
            Self::Store { operation, source } => write!(f, "{operation} failed: {source}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSubmission(err) => Some(err),
            Self::InvalidNode { source, .. } => Some(source),
            Self::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ReconcileError> for ServiceError {
    fn from(value: ReconcileError) -> Self {
        Self::InvalidSubmission(value)
    }
}

/// Tags store results with the service operation that issued them.
pub(crate) trait StoreResultExt<T> {
    fn during(self, operation: &'static str) -> Result<T, ServiceError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn during(self, operation: &'static str) -> Result<T, ServiceError> {
        self.map_err(|source| ServiceError::Store { operation, source })
    }
}
