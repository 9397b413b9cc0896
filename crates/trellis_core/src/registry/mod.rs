//! Typed node registries for layout and menu documents.
//!
//! # Responsibility
//! - Decide which node kinds a document flavor accepts.
//! - Resolve attribute defaults per `(kind, subtype)`.
//! - Materialize node payloads with submitted > existing > default precedence.
//!
//! # Invariants
//! - Registries never touch children; structure belongs to the tree engine.
//! - Defaults are obtained through an injected [`DefaultsProvider`].

pub mod defaults;
pub mod layout;
pub mod menu;

use crate::model::attributes::{merge_attributes, Attributes};
use crate::model::document::DocumentKind;
use crate::model::node::{Children, Node, NodeKind, NodePatch};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use defaults::{DefaultsProvider, NoDefaults};

/// Errors from typing or building a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Kind is not valid in this document flavor.
    UnsupportedKind { flavor: DocumentKind, kind: NodeKind },
    /// New node has no kind and the flavor has no default kind.
    MissingKind,
    /// Type name is blank or otherwise unusable.
    InvalidTypeName(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedKind { flavor, kind } => {
                write!(f, "node type `{kind}` is not allowed in a {flavor}")
            }
            Self::MissingKind => write!(f, "new node requires a type"),
            Self::InvalidTypeName(name) => write!(f, "invalid node type name: `{name}`"),
        }
    }
}

impl Error for RegistryError {}

/// Flavor-specific node typing contract.
pub trait NodeRegistry {
    /// Document flavor governed by this registry.
    fn flavor(&self) -> DocumentKind;

    /// Whether `kind` may be placed in this flavor's trees.
    fn accepts(&self, kind: NodeKind) -> bool;

    /// Kind assigned to new nodes submitted without a `type`.
    fn default_kind(&self) -> Option<NodeKind>;

    /// Configured attribute defaults; empty when none apply.
    fn defaults(&self, kind: NodeKind, subtype: Option<&str>) -> Attributes;

    /// Title assigned to new nodes submitted without one.
    fn default_title(&self, kind: NodeKind, subtype: Option<&str>) -> String;

    /// Builds one childless node payload.
    ///
    /// `existing` is the carried-forward node (if any); `patch` is the
    /// submitted sparse payload. Scalar fields take the patch value, then the
    /// existing value, then the registry default. Attributes are merged per
    /// key with submitted > existing > default precedence. A submitted block
    /// replaces the existing one whole.
    fn materialize(&self, existing: Option<&Node>, patch: &NodePatch) -> Result<Node, RegistryError> {
        let kind = match (patch.kind, existing) {
            (Some(kind), _) => kind,
            (None, Some(node)) => node.kind,
            (None, None) => self.default_kind().ok_or(RegistryError::MissingKind)?,
        };
        if !self.accepts(kind) {
            return Err(RegistryError::UnsupportedKind {
                flavor: self.flavor(),
                kind,
            });
        }

        let subtype = match &patch.subtype {
            Some(value) => value.clone(),
            None => existing.and_then(|node| node.subtype.clone()),
        };
        let title = patch
            .title
            .clone()
            .or_else(|| existing.map(|node| node.title.clone()))
            .unwrap_or_else(|| self.default_title(kind, subtype.as_deref()));

        let empty = Attributes::new();
        let existing_attributes = existing.map_or(&empty, |node| &node.attributes);
        let defaults = self.defaults(kind, subtype.as_deref());
        let attributes = merge_attributes(&patch.attributes, existing_attributes, &defaults);

        Ok(Node {
            kind,
            subtype,
            title,
            attributes,
            block: patch
                .block
                .clone()
                .or_else(|| existing.and_then(|node| node.block.clone())),
            children: Children::new(),
        })
    }
}

/// Upper-cases the first character, as used for default titles.
pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
