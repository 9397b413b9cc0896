//! Layout editing use-case service.
//!
//! # Responsibility
//! - Load layouts, presets and single nodes by path.
//! - Prepare particle edit forms with merged attributes and blueprint routing.
//! - Save layouts under a title-derived slug without clobbering others.
//! - Reconcile and persist reordered layouts.
//!
//! # Invariants
//! - Presets live in the layout namespace under `presets/<id>`.
//! - A save never overwrites a different existing layout.

use crate::model::attributes::{merge_attributes, Attributes};
use crate::model::document::{Document, DocumentKind};
use crate::model::node::{Node, NodeKind, NodePatch};
use crate::model::path::NodePath;
use crate::reconcile::{OrderingReconciler, Submission};
use crate::registry::defaults::DefaultsProvider;
use crate::registry::layout::{BlueprintRef, LayoutRegistry};
use crate::registry::{capitalize, NodeRegistry, RegistryError};
use crate::repo::document_repo::DocumentStore;
use crate::service::{ServiceError, StoreResultExt};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

/// Id prefix of stored layout presets.
pub const PRESET_PREFIX: &str = "presets/";
/// Title given to a particle form submitted without one.
pub const UNTITLED_PARTICLE: &str = "Untitled";

static SLUG_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]").expect("valid slug regex"));

/// Edit form data for one layout node.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleForm {
    pub path: NodePath,
    /// Type name (subtype, else kind) used for defaults and blueprints.
    pub name: String,
    /// Node payload with submitted values applied; subtree untouched.
    pub item: Node,
    /// Configured defaults for `name`.
    pub defaults: Attributes,
    pub blueprint: BlueprintRef,
}

/// Layout use-case facade.
pub struct LayoutService<S: DocumentStore, D: DefaultsProvider> {
    store: S,
    registry: LayoutRegistry<D>,
}

impl<S: DocumentStore, D: DefaultsProvider> LayoutService<S, D> {
    /// Creates service from store and defaults provider.
    pub fn new(store: S, defaults: D) -> Self {
        Self {
            store,
            registry: LayoutRegistry::new(defaults),
        }
    }

    /// Loads one layout document.
    pub fn load(&self, id: &str) -> Result<Document, ServiceError> {
        self.store
            .load(DocumentKind::Layout, id)
            .during("layout_load")?
            .ok_or_else(|| ServiceError::DocumentNotFound {
                kind: DocumentKind::Layout,
                id: id.to_string(),
            })
    }

    /// Loads one node of a layout by path.
    pub fn node(&self, id: &str, path: &NodePath) -> Result<Node, ServiceError> {
        let document = self.load(id)?;
        document
            .tree
            .resolve(path)
            .cloned()
            .ok_or_else(|| ServiceError::ItemNotFound {
                id: id.to_string(),
                path: path.clone(),
            })
    }

    /// Prepares the edit form for the node at `path`.
    ///
    /// `route_kind` is used when the submission has no `type`. `subtype` is
    /// taken from the submission only (cleared otherwise) and a missing title
    /// becomes `Untitled`. Attributes merge submitted > stored > defaults. A
    /// submitted block replaces the stored one as-is. Nothing is persisted.
    pub fn particle_form(
        &self,
        page: &str,
        route_kind: NodeKind,
        path: &NodePath,
        submitted: &NodePatch,
    ) -> Result<ParticleForm, ServiceError> {
        let stored = self.node(page, path)?;

        let kind = submitted.kind.unwrap_or(route_kind);
        if !self.registry.accepts(kind) {
            return Err(ServiceError::InvalidNode {
                path: path.clone(),
                source: RegistryError::UnsupportedKind {
                    flavor: DocumentKind::Layout,
                    kind,
                },
            });
        }
        let subtype = submitted.subtype.clone().flatten();
        let defaults = self.registry.defaults(kind, subtype.as_deref());
        let attributes = merge_attributes(&submitted.attributes, &stored.attributes, &defaults);

        let item = Node {
            kind,
            subtype,
            title: submitted
                .title
                .clone()
                .unwrap_or_else(|| UNTITLED_PARTICLE.to_string()),
            attributes,
            block: submitted.block.clone().or(stored.block),
            children: stored.children,
        };
        let name = item.type_name().to_string();
        let blueprint = self.registry.blueprint(item.kind, item.subtype.as_deref());

        Ok(ParticleForm {
            path: path.clone(),
            name,
            item,
            defaults,
            blueprint,
        })
    }

    /// Builds a normalized particle payload from a submitted form.
    pub fn normalize_particle(&self, name: &str, submitted: &NodePatch) -> Result<Node, ServiceError> {
        self.registry
            .normalize_particle(name, submitted)
            .map_err(|source| ServiceError::InvalidNode {
                path: NodePath::root(),
                source,
            })
    }

    /// Saves `document` under the slug of `title` and returns that slug.
    ///
    /// The title defaults to the capitalized `page` id. Saving under a slug
    /// different from `page` that already exists is rejected before writing.
    pub fn save(
        &self,
        page: &str,
        title: Option<&str>,
        mut document: Document,
    ) -> Result<String, ServiceError> {
        if document.kind() != DocumentKind::Layout {
            return Err(ServiceError::InvalidInput(format!(
                "cannot save a {} as a layout",
                document.kind()
            )));
        }

        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| capitalize(page));
        let slug = slugify(&title);
        if slug.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "layout title `{title}` has no usable characters"
            )));
        }

        if slug != page && self.store.exists(DocumentKind::Layout, &slug).during("layout_save")? {
            warn!(
                "event=layout_save module=layout status=error error_code=conflict_on_create page={} slug={}",
                page, slug
            );
            return Err(ServiceError::ConflictOnCreate {
                kind: DocumentKind::Layout,
                id: slug,
            });
        }

        document.title = Some(title);
        self.store
            .save(DocumentKind::Layout, &slug, &document)
            .during("layout_save")?;
        info!(
            "event=layout_save module=layout status=ok page={} slug={} nodes={}",
            page,
            slug,
            document.tree.len()
        );
        Ok(slug)
    }

    /// Reconciles a reorder submission and persists the result.
    pub fn reorder(&self, id: &str, submission: &Submission) -> Result<Document, ServiceError> {
        let previous = self.load(id)?;
        let document = OrderingReconciler::new(&self.registry).reconcile(&previous, submission)?;
        self.store
            .save(DocumentKind::Layout, id, &document)
            .during("layout_reorder")?;
        info!(
            "event=layout_reorder module=layout status=ok layout_id={} nodes={}",
            id,
            document.tree.len()
        );
        Ok(document)
    }

    /// Loads one preset layout.
    pub fn preset(&self, id: &str) -> Result<Document, ServiceError> {
        self.store
            .load(DocumentKind::Layout, &format!("{PRESET_PREFIX}{id}"))
            .during("preset_load")?
            .ok_or_else(|| ServiceError::PresetNotFound(id.to_string()))
    }

    /// Copies a preset into a new layout stored under `page`.
    pub fn create_from_preset(&self, preset: &str, page: &str) -> Result<Document, ServiceError> {
        let document = self.preset(preset)?;
        if self
            .store
            .exists(DocumentKind::Layout, page)
            .during("preset_create")?
        {
            return Err(ServiceError::ConflictOnCreate {
                kind: DocumentKind::Layout,
                id: page.to_string(),
            });
        }

        self.store
            .save(DocumentKind::Layout, page, &document)
            .during("preset_create")?;
        info!(
            "event=preset_create module=layout status=ok preset={} page={} nodes={}",
            preset,
            page,
            document.tree.len()
        );
        Ok(document)
    }

    /// Lists preset ids (without the `presets/` prefix).
    pub fn list_presets(&self) -> Result<Vec<String>, ServiceError> {
        let ids = self
            .store
            .list_ids(DocumentKind::Layout, PRESET_PREFIX)
            .during("preset_list")?;
        Ok(ids
            .into_iter()
            .filter_map(|id| id.strip_prefix(PRESET_PREFIX).map(str::to_string))
            .collect())
    }

    /// Loads a layout to switch the editor to; an empty layout counts as missing.
    pub fn switch_to(&self, id: &str) -> Result<Document, ServiceError> {
        let document = self.load(id)?;
        if document.is_empty() {
            return Err(ServiceError::DocumentNotFound {
                kind: DocumentKind::Layout,
                id: id.to_string(),
            });
        }
        Ok(document)
    }
}

/// Lower-cases `title` and strips everything outside `[a-z0-9_-]`.
pub fn slugify(title: &str) -> String {
    SLUG_STRIP_RE
        .replace_all(&title.to_lowercase(), "")
        .into_owned()
}
