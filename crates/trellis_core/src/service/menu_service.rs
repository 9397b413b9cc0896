//! Menu editing use-case service.
//!
//! # Responsibility
//! - Locate menu items with their column group and editor level.
//! - Apply partial single-item updates outside of a reorder.
//! - Preview or persist reordered menus through the reconciler.
//!
//! # Invariants
//! - Item updates never touch sibling order or children.
//! - Saving a menu that does not exist yet starts from an empty tree.

use crate::model::attributes::{overlay_attributes, Attributes};
use crate::model::document::{Document, DocumentKind};
use crate::model::node::{Node, NodePatch};
use crate::model::path::NodePath;
use crate::reconcile::{OrderingReconciler, Submission};
use crate::registry::defaults::DefaultsProvider;
use crate::registry::menu::MenuItemRegistry;
use crate::repo::document_repo::DocumentStore;
use crate::service::{ServiceError, StoreResultExt};
use log::info;

/// Editor granularity derived from path depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLevel {
    /// Whole menu.
    Base,
    /// One top-level item and its columns.
    Columns,
    /// One list inside a column.
    List,
}

impl MenuLevel {
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => Self::Base,
            1 => Self::Columns,
            _ => Self::List,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Columns => "columns",
            Self::List => "list",
        }
    }
}

/// One located menu item plus its rendering context.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemView {
    pub path: NodePath,
    pub item: Node,
    pub level: MenuLevel,
    /// Explicit group when requested, else the column holding the item.
    pub group: Option<usize>,
    /// Top-level item owning the columns `path` lives in.
    pub group_owner: Option<Node>,
}

/// Menu use-case facade.
pub struct MenuService<S: DocumentStore, D: DefaultsProvider> {
    store: S,
    registry: MenuItemRegistry<D>,
}

impl<S: DocumentStore, D: DefaultsProvider> MenuService<S, D> {
    /// Creates service from store and defaults provider.
    pub fn new(store: S, defaults: D) -> Self {
        Self {
            store,
            registry: MenuItemRegistry::new(defaults),
        }
    }

    /// Loads one menu document.
    pub fn load(&self, id: &str) -> Result<Document, ServiceError> {
        self.store
            .load(DocumentKind::Menu, id)
            .during("menu_load")?
            .ok_or_else(|| ServiceError::DocumentNotFound {
                kind: DocumentKind::Menu,
                id: id.to_string(),
            })
    }

    /// Locates one item; `group` selects the column context explicitly.
    ///
    /// The root path yields the whole menu at [`MenuLevel::Base`].
    pub fn locate_item(
        &self,
        id: &str,
        path: &NodePath,
        group: Option<usize>,
    ) -> Result<MenuItemView, ServiceError> {
        let document = self.load(id)?;
        view_item(&document, id, path, group)
    }

    /// Applies a sparse update to one item and persists the menu.
    pub fn update_item(&self, id: &str, path: &NodePath, patch: &NodePatch) -> Result<Node, ServiceError> {
        let mut document = self.load(id)?;
        let not_found = || ServiceError::ItemNotFound {
            id: id.to_string(),
            path: path.clone(),
        };
        if path.is_root() {
            return Err(not_found());
        }

        let item = document.tree.resolve_mut(path).ok_or_else(not_found)?;
        self.registry
            .apply_partial(item, patch)
            .map_err(|source| ServiceError::InvalidNode {
                path: path.clone(),
                source,
            })?;
        let updated = item.clone();

        self.store
            .save(DocumentKind::Menu, id, &document)
            .during("menu_item_update")?;
        info!(
            "event=menu_item_update module=menu status=ok menu_id={} depth={} fields={}",
            id,
            path.depth(),
            patch.attributes.len()
                + usize::from(patch.title.is_some())
                + usize::from(patch.subtype.is_some())
                + usize::from(patch.kind.is_some())
        );
        Ok(updated)
    }

    /// Returns the menu with `settings` merged over the stored settings.
    ///
    /// Nothing is persisted.
    pub fn preview_settings(&self, id: &str, settings: &Attributes) -> Result<Document, ServiceError> {
        let mut document = self.load(id)?;
        overlay_attributes(&mut document.settings, settings);
        Ok(document)
    }

    /// Reconciles a submission against the stored menu without persisting.
    pub fn preview(&self, id: &str, submission: &Submission) -> Result<Document, ServiceError> {
        let previous = self.load(id)?;
        Ok(OrderingReconciler::new(&self.registry).reconcile(&previous, submission)?)
    }

    /// Locates an item inside the reconciled preview of a submission.
    pub fn preview_item(
        &self,
        id: &str,
        submission: &Submission,
        path: &NodePath,
        group: Option<usize>,
    ) -> Result<MenuItemView, ServiceError> {
        let document = self.preview(id, submission)?;
        view_item(&document, id, path, group)
    }

    /// Reconciles a submission and persists the whole menu.
    pub fn save(&self, id: &str, submission: &Submission) -> Result<Document, ServiceError> {
        let previous = match self.store.load(DocumentKind::Menu, id).during("menu_save")? {
            Some(document) => document,
            None => Document::new(DocumentKind::Menu),
        };
        let document = OrderingReconciler::new(&self.registry).reconcile(&previous, submission)?;
        self.store
            .save(DocumentKind::Menu, id, &document)
            .during("menu_save")?;
        info!(
            "event=menu_save module=menu status=ok menu_id={} items={}",
            id,
            document.tree.len()
        );
        Ok(document)
    }
}

fn view_item(
    document: &Document,
    id: &str,
    path: &NodePath,
    group: Option<usize>,
) -> Result<MenuItemView, ServiceError> {
    let item = document
        .tree
        .resolve(path)
        .cloned()
        .ok_or_else(|| ServiceError::ItemNotFound {
            id: id.to_string(),
            path: path.clone(),
        })?;

    let group_owner = if path.depth() > 0 {
        document.tree.resolve(&path.prefix(1)).cloned()
    } else {
        None
    };

    Ok(MenuItemView {
        path: path.clone(),
        item,
        level: MenuLevel::from_depth(path.depth() + usize::from(group.is_some())),
        group: group.or_else(|| document.tree.column_of(path)),
        group_owner,
    })
}

#[cfg(test)]
mod tests {
    use super::MenuLevel;

    #[test]
    fn level_follows_depth() {
        assert_eq!(MenuLevel::from_depth(0), MenuLevel::Base);
        assert_eq!(MenuLevel::from_depth(1), MenuLevel::Columns);
        assert_eq!(MenuLevel::from_depth(5).as_str(), "list");
    }
}
