//! Submission value object for ordering reconciliation.
//!
//! # Responsibility
//! - Decode the flat ordering, item payloads and settings sent by the
//!   request layer.
//! - Reject structurally malformed input before any tree work starts.
//! - Derive a submission that reproduces an existing document's shape.
//!
//! # Invariants
//! - Column keys are non-negative integers.
//! - Each ordered item names one child segment and an optional provenance.

use crate::model::attributes::{attributes_from_value, Attributes};
use crate::model::document::Document;
use crate::model::node::{Node, NodePatch};
use crate::model::path::{validate_segment, NodePath};
use crate::reconcile::ReconcileError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parent path -> column index -> ordered children.
pub type Ordering = BTreeMap<NodePath, BTreeMap<usize, Vec<OrderedItem>>>;

/// One child placement inside a submitted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedItem {
    /// Child segment name under the submitted parent.
    pub name: String,
    /// Full path the item occupied before this edit; `None` marks a new item.
    pub provenance: Option<NodePath>,
}

impl OrderedItem {
    pub fn new(name: impl Into<String>, provenance: Option<NodePath>) -> Self {
        Self {
            name: name.into(),
            provenance,
        }
    }
}

/// Validated reorder submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub ordering: Ordering,
    /// New full path -> sparse payload.
    pub items: BTreeMap<NodePath, NodePatch>,
    /// Replaces document settings wholesale.
    pub settings: Attributes,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) one column of one parent.
    pub fn with_column(mut self, parent: NodePath, column: usize, items: Vec<OrderedItem>) -> Self {
        self.ordering.entry(parent).or_default().insert(column, items);
        self
    }

    pub fn with_item(mut self, path: NodePath, patch: NodePatch) -> Self {
        self.items.insert(path, patch);
        self
    }

    pub fn with_settings(mut self, settings: Attributes) -> Self {
        self.settings = settings;
        self
    }

    /// Decodes the three JSON-encoded request fields.
    ///
    /// `settings` may be absent, meaning empty settings.
    pub fn from_json(ordering: &str, items: &str, settings: Option<&str>) -> Result<Self, ReconcileError> {
        let ordering = parse_json(ordering, "ordering")?;
        let items = parse_json(items, "items")?;
        let settings = settings
            .map(|text| parse_json(text, "settings"))
            .transpose()?;
        Self::from_values(ordering, items, settings)
    }

    /// Decodes already-parsed JSON values.
    ///
    /// Expected shapes:
    /// - `ordering`: `{ "<parent>": { "<column>": [ { "name": "...",
    ///   "provenancePath": "..." | null } ] } }`
    /// - `items`: `{ "<new full path>": { field: value } }`
    /// - `settings`: any object.
    pub fn from_values(ordering: Value, items: Value, settings: Option<Value>) -> Result<Self, ReconcileError> {
        let mut submission = Self {
            ordering: decode_ordering(ordering)?,
            items: decode_items(items)?,
            settings: Attributes::new(),
        };
        if let Some(settings) = settings {
            submission.settings = attributes_from_value(settings)
                .ok_or_else(|| ReconcileError::Malformed("settings must be an object".to_string()))?;
        }
        Ok(submission)
    }

    /// Describes `document` as it is now, every provenance equal to the
    /// item's current path. Reconciling this submission is a no-op.
    pub fn snapshot(document: &Document) -> Self {
        let mut ordering = Ordering::new();
        collect_ordering(document.tree.root(), &NodePath::root(), true, &mut ordering);
        Self {
            ordering,
            items: BTreeMap::new(),
            settings: document.settings.clone(),
        }
    }

    /// Number of placed items across every parent and column.
    pub fn placed_count(&self) -> usize {
        self.ordering
            .values()
            .flat_map(|columns| columns.values())
            .map(Vec::len)
            .sum()
    }
}

fn collect_ordering(node: &Node, path: &NodePath, is_root: bool, ordering: &mut Ordering) {
    if !is_root && node.children.is_empty() {
        return;
    }

    let columns = ordering.entry(path.clone()).or_default();
    for (column, children) in &node.children {
        columns.insert(
            *column,
            children
                .iter()
                .map(|child| OrderedItem::new(child.name.clone(), Some(path.joined(&child.name))))
                .collect(),
        );
    }

    for children in node.children.values() {
        for child in children {
            collect_ordering(&child.node, &path.joined(&child.name), false, ordering);
        }
    }
}

fn parse_json(text: &str, field: &str) -> Result<Value, ReconcileError> {
    serde_json::from_str(text)
        .map_err(|err| ReconcileError::Malformed(format!("{field} is not valid JSON: {err}")))
}

fn decode_ordering(value: Value) -> Result<Ordering, ReconcileError> {
    let Value::Object(parents) = value else {
        return Err(ReconcileError::Malformed("ordering must be an object".to_string()));
    };

    let mut ordering = Ordering::new();
    for (parent_text, columns_value) in parents {
        let parent = NodePath::parse(&parent_text)?;
        let Value::Object(columns) = columns_value else {
            return Err(ReconcileError::Malformed(format!(
                "ordering for `{parent}` must be an object of columns"
            )));
        };

        let mut decoded = BTreeMap::new();
        for (column_text, items_value) in columns {
            let column = column_text
                .trim()
                .parse::<usize>()
                .map_err(|_| ReconcileError::InvalidColumn {
                    parent: parent.clone(),
                    column: column_text.clone(),
                })?;
            let Value::Array(items) = items_value else {
                return Err(ReconcileError::Malformed(format!(
                    "column `{column_text}` under `{parent}` must be an array"
                )));
            };
            let items = items
                .into_iter()
                .map(|item| decode_ordered_item(&parent, item))
                .collect::<Result<Vec<_>, _>>()?;
            if decoded.insert(column, items).is_some() {
                return Err(ReconcileError::InvalidColumn {
                    parent: parent.clone(),
                    column: column_text,
                });
            }
        }

        if ordering.insert(parent.clone(), decoded).is_some() {
            return Err(ReconcileError::DuplicateParent(parent));
        }
    }
    Ok(ordering)
}

fn decode_ordered_item(parent: &NodePath, value: Value) -> Result<OrderedItem, ReconcileError> {
    let Value::Object(mut fields) = value else {
        return Err(ReconcileError::Malformed(format!(
            "ordered items under `{parent}` must be objects"
        )));
    };

    let name = match fields.remove("name") {
        Some(Value::String(name)) => name,
        _ => {
            return Err(ReconcileError::Malformed(format!(
                "ordered item under `{parent}` needs a string `name`"
            )))
        }
    };
    validate_segment(&name)?;

    let provenance = match fields.remove("provenancePath") {
        None | Some(Value::Null) => None,
        Some(Value::String(path)) => Some(NodePath::parse(&path)?),
        Some(_) => {
            return Err(ReconcileError::Malformed(format!(
                "provenancePath of `{name}` under `{parent}` must be a string or null"
            )))
        }
    };

    Ok(OrderedItem { name, provenance })
}

fn decode_items(value: Value) -> Result<BTreeMap<NodePath, NodePatch>, ReconcileError> {
    let Value::Object(entries) = value else {
        return Err(ReconcileError::Malformed("items must be an object".to_string()));
    };

    let mut items = BTreeMap::new();
    for (path_text, payload) in entries {
        let path = NodePath::parse(&path_text)?;
        let patch = NodePatch::from_value(payload).map_err(|source| ReconcileError::InvalidPayload {
            path: path.clone(),
            source,
        })?;
        if items.insert(path.clone(), patch).is_some() {
            return Err(ReconcileError::Malformed(format!(
                "item payload for `{path}` submitted more than once"
            )));
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::{OrderedItem, Submission};
    use crate::model::document::{Document, DocumentKind};
    use crate::model::node::{Node, NodeKind};
    use crate::model::path::NodePath;
    use crate::reconcile::ReconcileError;
    use crate::tree::path_tree::PathTree;
    use serde_json::json;

    fn path(value: &str) -> NodePath {
        NodePath::parse(value).unwrap()
    }

    #[test]
    fn decodes_well_formed_submission() {
        let submission = Submission::from_json(
            r#"{"": {"0": [{"name": "home", "provenancePath": "home"}], "1": [{"name": "new", "provenancePath": null}]},
                "home": {"0": [{"name": "a", "provenancePath": "blog/a"}]}}"#,
            r#"{"new": {"title": "New"}}"#,
            Some(r#"{"theme": "dark"}"#),
        )
        .unwrap();

        assert_eq!(submission.placed_count(), 3);
        assert_eq!(
            submission.ordering[&NodePath::root()][&1],
            vec![OrderedItem::new("new", None)]
        );
        assert_eq!(
            submission.ordering[&path("home")][&0][0].provenance,
            Some(path("blog/a"))
        );
        assert_eq!(submission.items[&path("new")].title.as_deref(), Some("New"));
        assert_eq!(submission.settings.get("theme"), Some(&json!("dark")));
    }

    #[test]
    fn rejects_non_integer_column() {
        let err = Submission::from_json(r#"{"": {"left": []}}"#, "{}", None).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidColumn { column, .. } if column == "left"));
    }

    #[test]
    fn rejects_non_string_names_and_bad_shapes() {
        assert!(matches!(
            Submission::from_json(r#"{"": {"0": [{"name": 5}]}}"#, "{}", None).unwrap_err(),
            ReconcileError::Malformed(_)
        ));
        assert!(matches!(
            Submission::from_json(r#"{"": {"0": "home"}}"#, "{}", None).unwrap_err(),
            ReconcileError::Malformed(_)
        ));
        assert!(matches!(
            Submission::from_json(r#"[]"#, "{}", None).unwrap_err(),
            ReconcileError::Malformed(_)
        ));
        assert!(matches!(
            Submission::from_json(r#"{"": {}}"#, r#"{"x": 1}"#, None).unwrap_err(),
            ReconcileError::InvalidPayload { .. }
        ));
        assert!(matches!(
            Submission::from_json(r#"{"": {}}"#, "{}", Some("[1]")).unwrap_err(),
            ReconcileError::Malformed(_)
        ));
        assert!(matches!(
            Submission::from_json("{not json", "{}", None).unwrap_err(),
            ReconcileError::Malformed(_)
        ));
    }

    #[test]
    fn rejects_parent_spelled_twice() {
        let err = Submission::from_json(r#"{"a": {}, "/a": {}}"#, "{}", None).unwrap_err();
        assert!(matches!(err, ReconcileError::DuplicateParent(parent) if parent == path("a")));
    }

    #[test]
    fn rejects_name_with_delimiter() {
        let err = Submission::from_json(r#"{"": {"0": [{"name": "a/b"}]}}"#, "{}", None).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidPath(_)));
    }

    #[test]
    fn snapshot_lists_root_and_every_parent_with_columns() {
        let root = Node::new(NodeKind::Root, "")
            .with_child(
                0,
                "home",
                Node::new(NodeKind::Item, "Home")
                    .with_child(0, "a", Node::new(NodeKind::Item, "A"))
                    .with_child(1, "c", Node::new(NodeKind::Item, "C")),
            )
            .with_child(0, "blog", Node::new(NodeKind::Item, "Blog"));
        let document = Document::from_tree(PathTree::with_root(DocumentKind::Menu, root));

        let submission = Submission::snapshot(&document);
        assert_eq!(submission.ordering.len(), 2);
        assert_eq!(
            submission.ordering[&path("home")][&1],
            vec![OrderedItem::new("c", Some(path("home/c")))]
        );
        assert!(!submission.ordering.contains_key(&path("blog")));
    }
}
