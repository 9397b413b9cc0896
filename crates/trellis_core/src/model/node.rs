//! Tree node model shared by layouts and menus.
//!
//! # Responsibility
//! - Define the node payload (kind, subtype, title, attributes, block).
//! - Define column-grouped child storage.
//! - Define sparse node patches submitted by callers.
//!
//! # Invariants
//! - Children are keyed by column index; an ungrouped node uses column `0` only.
//! - Child order inside a column is the persisted display order.

use crate::model::attributes::{attributes_from_value, overlay_attributes, Attributes};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Column index -> ordered children.
pub type Children = BTreeMap<usize, Vec<Child>>;

/// Node type across both document flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Document root; never submitted as an item.
    Root,
    /// Layout row container.
    Section,
    /// Layout column container.
    Grid,
    /// Layout module position.
    Position,
    /// Layout empty spacer.
    Spacer,
    /// Layout main page content slot.
    Pagecontent,
    /// Layout content particle.
    Particle,
    /// Layout non-visual atom.
    Atom,
    /// Menu entry.
    Item,
}

impl NodeKind {
    /// Every kind that may appear inside a layout tree.
    pub const LAYOUT: [NodeKind; 7] = [
        NodeKind::Section,
        NodeKind::Grid,
        NodeKind::Position,
        NodeKind::Spacer,
        NodeKind::Pagecontent,
        NodeKind::Particle,
        NodeKind::Atom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Section => "section",
            Self::Grid => "grid",
            Self::Position => "position",
            Self::Spacer => "spacer",
            Self::Pagecontent => "pagecontent",
            Self::Particle => "particle",
            Self::Atom => "atom",
            Self::Item => "item",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "root" => Some(Self::Root),
            "section" => Some(Self::Section),
            "grid" => Some(Self::Grid),
            "position" => Some(Self::Position),
            "spacer" => Some(Self::Spacer),
            "pagecontent" => Some(Self::Pagecontent),
            "particle" => Some(Self::Particle),
            "atom" => Some(Self::Atom),
            "item" => Some(Self::Item),
            _ => None,
        }
    }

    /// Structural layout containers carry no type-specific defaults.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Root | Self::Section | Self::Grid)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named child inside a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub name: String,
    pub node: Node,
}

/// One entry in a document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Serialized as `type` to match the admin payload naming.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    /// Block placement options (`size`, `class`, ...) of a layout leaf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Attributes>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: Children,
}

impl Node {
    /// Creates a childless node without attributes.
    pub fn new(kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            subtype: None,
            title: title.into(),
            attributes: Attributes::new(),
            block: None,
            children: Children::new(),
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_block(mut self, block: Attributes) -> Self {
        self.block = Some(block);
        self
    }

    /// Appends one child to `column`.
    pub fn with_child(mut self, column: usize, name: impl Into<String>, node: Node) -> Self {
        self.children.entry(column).or_default().push(Child {
            name: name.into(),
            node,
        });
        self
    }

    /// Name used to look up defaults and blueprints: subtype, else kind.
    pub fn type_name(&self) -> &str {
        self.subtype.as_deref().unwrap_or(self.kind.as_str())
    }

    /// Returns whether children are split across parallel columns.
    pub fn is_grouped(&self) -> bool {
        self.children.len() > 1 || self.children.keys().any(|column| *column != 0)
    }

    /// Finds a child by name, scanning columns in ascending order.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children
            .values()
            .flat_map(|column| column.iter())
            .find(|child| child.name == name)
            .map(|child| &child.node)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children
            .values_mut()
            .flat_map(|column| column.iter_mut())
            .find(|child| child.name == name)
            .map(|child| &mut child.node)
    }

    /// Finds a child by name inside one column only.
    pub fn child_in_column(&self, column: usize, name: &str) -> Option<&Node> {
        self.children
            .get(&column)?
            .iter()
            .find(|child| child.name == name)
            .map(|child| &child.node)
    }

    /// Returns the column holding the child named `name`.
    pub fn column_of_child(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .find(|(_, column)| column.iter().any(|child| child.name == name))
            .map(|(index, _)| *index)
    }

    /// Number of direct children across all columns.
    pub fn child_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// Clone of this node without its subtree.
    pub fn payload(&self) -> Node {
        Self {
            kind: self.kind,
            subtype: self.subtype.clone(),
            title: self.title.clone(),
            attributes: self.attributes.clone(),
            block: self.block.clone(),
            children: Children::new(),
        }
    }
}

/// Errors from decoding a sparse node patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// Patch payload is not a JSON object.
    NotAnObject,
    /// Known field has the wrong JSON shape or value.
    InvalidField { field: &'static str, reason: String },
}

impl Display for PatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "item payload must be an object"),
            Self::InvalidField { field, reason } => {
                write!(f, "invalid item field `{field}`: {reason}")
            }
        }
    }
}

impl Error for PatchError {}

/// Sparse field -> value update for one node.
///
/// `subtype` distinguishes "not given" (`None`) from "cleared" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub kind: Option<NodeKind>,
    pub subtype: Option<Option<String>>,
    pub title: Option<String>,
    pub attributes: Attributes,
    /// Replaces the node's block options when present.
    pub block: Option<Attributes>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn subtype(mut self, subtype: Option<&str>) -> Self {
        self.subtype = Some(subtype.map(str::to_string));
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn block(mut self, block: Attributes) -> Self {
        self.block = Some(block);
        self
    }

    /// Decodes a patch from a JSON object.
    ///
    /// `type`, `subtype`, `title`, `attributes` and `block` map to node
    /// fields; any other key is treated as a top-level attribute (menu items
    /// submit fields such as `link` or `target` flat).
    pub fn from_value(value: Value) -> Result<Self, PatchError> {
        let Value::Object(map) = value else {
            return Err(PatchError::NotAnObject);
        };

        let mut patch = Self::new();
        for (key, value) in map {
            match key.as_str() {
                "type" => {
                    let text = value.as_str().ok_or_else(|| PatchError::InvalidField {
                        field: "type",
                        reason: "expected string".to_string(),
                    })?;
                    let kind = NodeKind::parse(text).ok_or_else(|| PatchError::InvalidField {
                        field: "type",
                        reason: format!("unknown node type `{text}`"),
                    })?;
                    patch.kind = Some(kind);
                }
                "subtype" => match value {
                    Value::Null => patch.subtype = Some(None),
                    Value::String(text) if text.trim().is_empty() => patch.subtype = Some(None),
                    Value::String(text) => patch.subtype = Some(Some(text)),
                    _ => {
                        return Err(PatchError::InvalidField {
                            field: "subtype",
                            reason: "expected string or null".to_string(),
                        })
                    }
                },
                "title" => match value {
                    Value::String(text) => patch.title = Some(text),
                    _ => {
                        return Err(PatchError::InvalidField {
                            field: "title",
                            reason: "expected string".to_string(),
                        })
                    }
                },
                "attributes" => {
                    let attributes =
                        attributes_from_value(value).ok_or_else(|| PatchError::InvalidField {
                            field: "attributes",
                            reason: "expected object".to_string(),
                        })?;
                    overlay_attributes(&mut patch.attributes, &attributes);
                }
                "block" => {
                    let block =
                        attributes_from_value(value).ok_or_else(|| PatchError::InvalidField {
                            field: "block",
                            reason: "expected object".to_string(),
                        })?;
                    patch.block = Some(block);
                }
                _ => {
                    patch.attributes.insert(key, value);
                }
            }
        }
        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, NodeKind, NodePatch, PatchError};
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_text() {
        for kind in NodeKind::LAYOUT {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::parse("widget"), None);
    }

    #[test]
    fn child_lookup_scans_columns_in_order() {
        let node = Node::new(NodeKind::Item, "Main")
            .with_child(0, "a", Node::new(NodeKind::Item, "A"))
            .with_child(1, "c", Node::new(NodeKind::Item, "C"));

        assert!(node.is_grouped());
        assert_eq!(node.child("c").unwrap().title, "C");
        assert_eq!(node.column_of_child("c"), Some(1));
        assert!(node.child_in_column(0, "c").is_none());
        assert_eq!(node.child_count(), 2);
    }

    #[test]
    fn single_column_zero_is_not_grouped() {
        let node = Node::new(NodeKind::Section, "Top")
            .with_child(0, "a", Node::new(NodeKind::Particle, "A"));
        assert!(!node.is_grouped());
    }

    #[test]
    fn patch_decodes_known_and_flat_fields() {
        let patch = NodePatch::from_value(json!({
            "type": "particle",
            "subtype": null,
            "title": "Logo",
            "attributes": {"size": 3},
            "link": "/home"
        }))
        .unwrap();

        assert_eq!(patch.kind, Some(NodeKind::Particle));
        assert_eq!(patch.subtype, Some(None));
        assert_eq!(patch.title.as_deref(), Some("Logo"));
        assert_eq!(patch.attributes.get("size"), Some(&json!(3)));
        assert_eq!(patch.attributes.get("link"), Some(&json!("/home")));
    }

    #[test]
    fn patch_keeps_block_out_of_attributes() {
        let patch = NodePatch::from_value(json!({
            "title": "Hero",
            "block": {"size": "25", "class": ""}
        }))
        .unwrap();

        assert!(patch.attributes.is_empty());
        let block = patch.block.unwrap();
        assert_eq!(block.get("size"), Some(&json!("25")));
        assert_eq!(block.get("class"), Some(&json!("")));

        let err = NodePatch::from_value(json!({"block": 25})).unwrap_err();
        assert!(matches!(err, PatchError::InvalidField { field: "block", .. }));
    }

    #[test]
    fn patch_rejects_unknown_type_and_non_object() {
        let err = NodePatch::from_value(json!({"type": "widget"})).unwrap_err();
        assert!(matches!(err, PatchError::InvalidField { field: "type", .. }));
        assert_eq!(
            NodePatch::from_value(json!("x")).unwrap_err(),
            PatchError::NotAnObject
        );
    }

    #[test]
    fn node_serializes_kind_as_type() {
        let node = Node::new(NodeKind::Particle, "Hero").with_subtype("banner");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], json!("particle"));
        assert_eq!(value["subtype"], json!("banner"));
        assert!(value.get("children").is_none());
    }
}
