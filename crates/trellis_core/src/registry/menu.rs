//! Menu item registry.
//!
//! # Responsibility
//! - Type menu entries (single `item` kind).
//! - Apply sparse in-place updates to one existing item.
//!
//! # Invariants
//! - Partial update touches only the fields present in the patch.
//! - Children are never modified by an item update.

use crate::model::attributes::{overlay_attributes, Attributes};
use crate::model::document::DocumentKind;
use crate::model::node::{Node, NodeKind, NodePatch};
use crate::registry::defaults::DefaultsProvider;
use crate::registry::{NodeRegistry, RegistryError};

/// Title given to new menu items submitted without one.
pub const UNTITLED_ITEM: &str = "Untitled";

/// Registry for menu documents.
#[derive(Debug, Clone)]
pub struct MenuItemRegistry<D: DefaultsProvider> {
    defaults: D,
}

impl<D: DefaultsProvider> MenuItemRegistry<D> {
    pub fn new(defaults: D) -> Self {
        Self { defaults }
    }

    /// Applies `patch` to `item` in place.
    ///
    /// Unlike reconciliation this performs no default merge: absent fields are
    /// left exactly as stored.
    pub fn apply_partial(&self, item: &mut Node, patch: &NodePatch) -> Result<(), RegistryError> {
        if let Some(kind) = patch.kind {
            if !self.accepts(kind) {
                return Err(RegistryError::UnsupportedKind {
                    flavor: self.flavor(),
                    kind,
                });
            }
            item.kind = kind;
        }
        if let Some(subtype) = &patch.subtype {
            item.subtype = subtype.clone();
        }
        if let Some(title) = &patch.title {
            item.title = title.clone();
        }
        overlay_attributes(&mut item.attributes, &patch.attributes);
        if let Some(block) = &patch.block {
            item.block = Some(block.clone());
        }
        Ok(())
    }
}

impl<D: DefaultsProvider> NodeRegistry for MenuItemRegistry<D> {
    fn flavor(&self) -> DocumentKind {
        DocumentKind::Menu
    }

    fn accepts(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Item
    }

    fn default_kind(&self) -> Option<NodeKind> {
        Some(NodeKind::Item)
    }

    fn defaults(&self, kind: NodeKind, subtype: Option<&str>) -> Attributes {
        self.defaults.get_defaults(kind, subtype).unwrap_or_default()
    }

    fn default_title(&self, _kind: NodeKind, _subtype: Option<&str>) -> String {
        UNTITLED_ITEM.to_string()
    }
}
