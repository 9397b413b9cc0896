//! Ordering reconciler.
//!
//! # Responsibility
//! - Rebuild a nested tree from a flat, column-grouped ordering.
//! - Join every placed item to its stored payload through its provenance path.
//! - Merge submitted payloads and type defaults through the injected registry.
//!
//! # Invariants
//! - Parents are processed deepest first (explicit depth, then path text), so
//!   a subtree is complete before its owner is placed.
//! - Old parents absent from the submission are dropped with their subtrees.
//! - Settings are replaced, never merged.
//! - The previous document is only read; failure yields no tree.

use crate::model::document::Document;
use crate::model::node::{Child, Children, Node, NodePatch};
use crate::model::path::NodePath;
use crate::reconcile::submission::Submission;
use crate::reconcile::ReconcileError;
use crate::registry::NodeRegistry;
use crate::tree::path_tree::PathTree;
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Converts a flat submission into a new document.
pub struct OrderingReconciler<'r, R: NodeRegistry> {
    registry: &'r R,
}

impl<'r, R: NodeRegistry> OrderingReconciler<'r, R> {
    pub fn new(registry: &'r R) -> Self {
        Self { registry }
    }

    /// Reconciles `submission` against `previous`.
    ///
    /// # Errors
    /// - Any [`ReconcileError`] when the submission is inconsistent (missing
    ///   root ordering, duplicated names or provenance, orphan parents,
    ///   payloads for unplaced paths) or a node cannot be typed.
    pub fn reconcile(
        &self,
        previous: &Document,
        submission: &Submission,
    ) -> Result<Document, ReconcileError> {
        let started_at = Instant::now();
        match self.build(previous, submission) {
            Ok((document, stats)) => {
                info!(
                    "event=reconcile module=reconcile status=ok flavor={} parents={} carried={} created={} dangling_provenance={} dropped={} duration_ms={}",
                    previous.kind(),
                    submission.ordering.len(),
                    stats.carried,
                    stats.created,
                    stats.dangling_provenance,
                    stats.dropped,
                    started_at.elapsed().as_millis()
                );
                Ok(document)
            }
            Err(err) => {
                warn!(
                    "event=reconcile module=reconcile status=error flavor={} parents={} duration_ms={} error={}",
                    previous.kind(),
                    submission.ordering.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn build(
        &self,
        previous: &Document,
        submission: &Submission,
    ) -> Result<(Document, ReconcileStats), ReconcileError> {
        if self.registry.flavor() != previous.kind() {
            return Err(ReconcileError::FlavorMismatch {
                expected: self.registry.flavor(),
                actual: previous.kind(),
            });
        }
        validate_submission(submission)?;

        let old_by_path: HashMap<NodePath, &Node> = previous.tree.flatten().into_iter().collect();
        let mut stats = ReconcileStats::default();
        let no_patch = NodePatch::default();

        let mut parents: Vec<&NodePath> = submission.ordering.keys().collect();
        parents.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.cmp(b)));

        let mut built: HashMap<NodePath, Children> = HashMap::new();
        let mut placed: HashSet<NodePath> = HashSet::new();

        for parent in parents {
            let mut children = Children::new();
            for (column, items) in &submission.ordering[parent] {
                let slot = children.entry(*column).or_default();
                for item in items {
                    let path = parent.child(item.name.as_str())?;
                    let existing = item
                        .provenance
                        .as_ref()
                        .and_then(|provenance| old_by_path.get(provenance).copied());
                    match (&item.provenance, existing) {
                        (_, Some(_)) => stats.carried += 1,
                        (Some(provenance), None) => {
                            stats.dangling_provenance += 1;
                            stats.created += 1;
                            warn!(
                                "event=reconcile_provenance module=reconcile status=missing path={} provenance={}",
                                path, provenance
                            );
                        }
                        (None, None) => stats.created += 1,
                    }

                    let patch = submission.items.get(&path).unwrap_or(&no_patch);
                    let mut node = self
                        .registry
                        .materialize(existing, patch)
                        .map_err(|source| ReconcileError::Node {
                            path: path.clone(),
                            source,
                        })?;
                    node.children = built.remove(&path).unwrap_or_default();

                    slot.push(Child {
                        name: item.name.clone(),
                        node,
                    });
                    placed.insert(path);
                }
            }
            built.insert(parent.clone(), children);
        }

        let root_children = built
            .remove(&NodePath::root())
            .ok_or(ReconcileError::MissingRootOrdering)?;
        if let Some(orphan) = built.keys().min() {
            return Err(ReconcileError::OrphanParent(orphan.clone()));
        }
        if let Some(unplaced) = submission.items.keys().find(|path| !placed.contains(*path)) {
            return Err(ReconcileError::UnplacedPayload(unplaced.clone()));
        }

        // Old paths nobody claims; relocated items are carried, not dropped.
        let referenced: HashSet<&NodePath> = submission
            .ordering
            .values()
            .flat_map(|columns| columns.values().flatten())
            .filter_map(|item| item.provenance.as_ref())
            .collect();
        stats.dropped = old_by_path
            .keys()
            .filter(|path| !referenced.contains(path))
            .count();

        let mut root = previous.tree.root().payload();
        root.children = root_children;

        let document = Document {
            title: previous.title.clone(),
            settings: submission.settings.clone(),
            tree: PathTree::with_root(previous.kind(), root),
        };
        Ok((document, stats))
    }
}

#[derive(Debug, Default)]
struct ReconcileStats {
    carried: usize,
    created: usize,
    dangling_provenance: usize,
    dropped: usize,
}

fn validate_submission(submission: &Submission) -> Result<(), ReconcileError> {
    if !submission.ordering.contains_key(&NodePath::root()) {
        return Err(ReconcileError::MissingRootOrdering);
    }

    let mut provenances = HashSet::new();
    for (parent, columns) in &submission.ordering {
        let mut names = HashSet::new();
        for item in columns.values().flatten() {
            if !names.insert(item.name.as_str()) {
                return Err(ReconcileError::DuplicateName {
                    parent: parent.clone(),
                    name: item.name.clone(),
                });
            }
            if let Some(provenance) = &item.provenance {
                if !provenances.insert(provenance) {
                    return Err(ReconcileError::DuplicateProvenance(provenance.clone()));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::OrderingReconciler;
    use crate::model::document::{Document, DocumentKind};
    use crate::model::node::{Node, NodeKind};
    use crate::model::path::NodePath;
    use crate::reconcile::submission::{OrderedItem, Submission};
    use crate::reconcile::ReconcileError;
    use crate::registry::menu::MenuItemRegistry;
    use crate::registry::NoDefaults;
    use crate::tree::path_tree::PathTree;

    fn path(value: &str) -> NodePath {
        NodePath::parse(value).unwrap()
    }

    fn moved(name: &str, from: &str) -> OrderedItem {
        OrderedItem::new(name, Some(path(from)))
    }

    fn menu() -> Document {
        let root = Node::new(NodeKind::Root, "Main")
            .with_child(
                0,
                "home",
                Node::new(NodeKind::Item, "Home").with_child(0, "a", Node::new(NodeKind::Item, "A")),
            )
            .with_child(0, "blog", Node::new(NodeKind::Item, "Blog"));
        Document::from_tree(PathTree::with_root(DocumentKind::Menu, root))
    }

    #[test]
    fn relocated_child_keeps_payload_under_moved_parent() {
        let registry = MenuItemRegistry::new(NoDefaults);
        let submission = Submission::new()
            .with_column(NodePath::root(), 0, vec![moved("blog", "blog")])
            .with_column(path("blog"), 0, vec![moved("home", "home")])
            .with_column(path("blog/home"), 0, vec![moved("a", "home/a")]);

        let document = OrderingReconciler::new(&registry)
            .reconcile(&menu(), &submission)
            .unwrap();

        assert_eq!(document.tree.resolve(&path("blog/home/a")).unwrap().title, "A");
        assert!(document.tree.resolve(&path("home")).is_none());
        assert_eq!(document.tree.root().title, "Main");
    }

    #[test]
    fn relocated_items_are_not_counted_as_dropped() {
        let registry = MenuItemRegistry::new(NoDefaults);
        let submission = Submission::new()
            .with_column(NodePath::root(), 0, vec![moved("blog", "blog")])
            .with_column(path("blog"), 0, vec![moved("home", "home")]);

        let (document, stats) = OrderingReconciler::new(&registry)
            .build(&menu(), &submission)
            .unwrap();

        assert!(document.tree.contains(&path("blog/home")));
        assert_eq!(stats.carried, 2);
        // Only `home/a` lost its place.
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn orphan_parent_is_rejected() {
        let registry = MenuItemRegistry::new(NoDefaults);
        let submission = Submission::new()
            .with_column(NodePath::root(), 0, vec![moved("home", "home")])
            .with_column(path("ghost"), 0, vec![moved("a", "home/a")]);

        let err = OrderingReconciler::new(&registry)
            .reconcile(&menu(), &submission)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::OrphanParent(parent) if parent == path("ghost")));
    }

    #[test]
    fn duplicate_provenance_is_rejected() {
        let registry = MenuItemRegistry::new(NoDefaults);
        let submission = Submission::new().with_column(
            NodePath::root(),
            0,
            vec![moved("home", "home"), moved("copy", "home")],
        );

        let err = OrderingReconciler::new(&registry)
            .reconcile(&menu(), &submission)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::DuplicateProvenance(_)));
    }

    #[test]
    fn duplicate_name_across_columns_is_rejected() {
        let registry = MenuItemRegistry::new(NoDefaults);
        let submission = Submission::new()
            .with_column(NodePath::root(), 0, vec![moved("home", "home")])
            .with_column(NodePath::root(), 1, vec![OrderedItem::new("home", None)]);

        let err = OrderingReconciler::new(&registry)
            .reconcile(&menu(), &submission)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::DuplicateName { .. }));
    }

    #[test]
    fn missing_root_ordering_is_rejected() {
        let registry = MenuItemRegistry::new(NoDefaults);
        let submission = Submission::new().with_column(path("home"), 0, vec![]);
        let err = OrderingReconciler::new(&registry)
            .reconcile(&menu(), &submission)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::MissingRootOrdering));
    }

    #[test]
    fn flavor_mismatch_is_rejected() {
        let registry = MenuItemRegistry::new(NoDefaults);
        let layout = Document::new(DocumentKind::Layout);
        let submission = Submission::new().with_column(NodePath::root(), 0, vec![]);
        let err = OrderingReconciler::new(&registry)
            .reconcile(&layout, &submission)
            .unwrap_err();
        assert!(matches!(err, ReconcileError::FlavorMismatch { .. }));
    }
}
