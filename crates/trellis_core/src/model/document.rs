//! Whole-document model: one layout or one menu.
//!
//! # Invariants
//! - A document is loaded and persisted as one unit; there is no partial write.
//! - `settings` is free-form and never interpreted by the tree engine.

use crate::model::attributes::Attributes;
use crate::model::node::NodeKind;
use crate::tree::path_tree::PathTree;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Document flavor; also the storage namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Layout,
    Menu,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Menu => "menu",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "layout" => Some(Self::Layout),
            "menu" => Some(Self::Menu),
            _ => None,
        }
    }

    /// Kind used for intermediate nodes created by path insertion.
    pub fn container_kind(self) -> NodeKind {
        match self {
            Self::Layout => NodeKind::Section,
            Self::Menu => NodeKind::Item,
        }
    }
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rooted tree plus top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub settings: Attributes,
    pub tree: PathTree,
}

impl Document {
    /// Creates an empty document of the given flavor.
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            title: None,
            settings: Attributes::new(),
            tree: PathTree::new(kind),
        }
    }

    pub fn from_tree(tree: PathTree) -> Self {
        Self {
            title: None,
            settings: Attributes::new(),
            tree,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.tree.kind()
    }

    /// Whether the tree holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.tree.root().child_count() == 0
    }
}
