//! Path-addressable document tree.
//!
//! # Responsibility
//! - Resolve nodes by slash-delimited path across column-grouped children.
//! - Insert or structurally replace nodes at any path.
//! - Flatten the tree in display order for persistence and indexing.
//!
//! # Invariants
//! - The root is addressed by the empty path and is never a child.
//! - Columns are not path segments; a child name resolves in the first
//!   (lowest) column that holds it.
//! - Flatten order is depth-first: column order, then item order.

use crate::model::document::DocumentKind;
use crate::model::node::{Child, Node, NodeKind};
use crate::model::path::NodePath;
use serde::{Deserialize, Serialize};

/// Rooted, path-addressable tree of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathTree {
    kind: DocumentKind,
    root: Node,
}

impl PathTree {
    /// Creates a tree holding only an empty root.
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            root: Node::new(NodeKind::Root, ""),
        }
    }

    /// Creates a tree around an existing root node.
    pub fn with_root(kind: DocumentKind, root: Node) -> Self {
        Self { kind, root }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Resolves `path` to a node; the empty path yields the root.
    pub fn resolve(&self, path: &NodePath) -> Option<&Node> {
        let mut cursor = &self.root;
        for segment in path.segments() {
            cursor = cursor.child(segment)?;
        }
        Some(cursor)
    }

    pub fn resolve_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut cursor = &mut self.root;
        for segment in path.segments() {
            cursor = cursor.child_mut(segment)?;
        }
        Some(cursor)
    }

    /// Resolves `path` requiring its last segment to sit in `column` of its
    /// parent. An absent column is reported as `None`.
    pub fn resolve_in_column(&self, path: &NodePath, column: usize) -> Option<&Node> {
        let name = path.name()?;
        let parent = self.resolve(&path.parent()?)?;
        parent.child_in_column(column, name)
    }

    /// Returns whether `path` resolves.
    pub fn contains(&self, path: &NodePath) -> bool {
        self.resolve(path).is_some()
    }

    /// Writes `node` at `path`, appending new nodes to column `0`.
    ///
    /// See [`PathTree::insert_in_column`].
    pub fn insert(&mut self, path: &NodePath, node: Node) -> Option<Node> {
        self.insert_in_column(path, 0, node)
    }

    /// Writes `node` at `path`.
    ///
    /// An existing node is replaced in place (same column and index, subtree
    /// included) and returned. A new node is appended to `column` of its
    /// parent. Missing intermediate nodes are created as empty containers of
    /// the tree's container kind. Inserting at the root path replaces the root.
    pub fn insert_in_column(&mut self, path: &NodePath, column: usize, node: Node) -> Option<Node> {
        let Some(name) = path.name() else {
            return Some(std::mem::replace(&mut self.root, node));
        };

        let container_kind = self.kind.container_kind();
        let mut cursor = &mut self.root;
        for segment in &path.segments()[..path.depth() - 1] {
            cursor = ensure_child(cursor, segment, container_kind);
        }

        match locate_child(cursor, name) {
            Some((found_column, index)) => {
                let slot = &mut cursor.children.entry(found_column).or_default()[index];
                Some(std::mem::replace(&mut slot.node, node))
            }
            None => {
                cursor.children.entry(column).or_default().push(Child {
                    name: name.to_string(),
                    node,
                });
                None
            }
        }
    }

    /// Flattens the tree into `(path, node)` pairs, root excluded.
    pub fn flatten(&self) -> Vec<(NodePath, &Node)> {
        let mut out = Vec::new();
        flatten_into(&self.root, &NodePath::root(), &mut out);
        out
    }

    /// Number of nodes below the root.
    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.child_count() == 0
    }

    /// Returns the column of the group that contains `path`.
    ///
    /// For paths of two or more segments this is the column of the second
    /// segment inside the first segment's node (the top-level group). A
    /// one-segment path reports its column inside the root. `None` when the
    /// path does not resolve or the owning node is not column-grouped.
    pub fn column_of(&self, path: &NodePath) -> Option<usize> {
        if !self.contains(path) {
            return None;
        }
        let (owner, name) = match path.depth() {
            0 => return None,
            1 => (&self.root, path.segments()[0].as_str()),
            _ => (
                self.root.child(&path.segments()[0])?,
                path.segments()[1].as_str(),
            ),
        };
        if !owner.is_grouped() {
            return None;
        }
        owner.column_of_child(name)
    }
}

fn locate_child(parent: &Node, name: &str) -> Option<(usize, usize)> {
    parent.children.iter().find_map(|(column, children)| {
        children
            .iter()
            .position(|child| child.name == name)
            .map(|index| (*column, index))
    })
}

fn ensure_child<'a>(parent: &'a mut Node, name: &str, kind: NodeKind) -> &'a mut Node {
    let (column, index) = match locate_child(parent, name) {
        Some(found) => found,
        None => {
            let children = parent.children.entry(0).or_default();
            children.push(Child {
                name: name.to_string(),
                node: Node::new(kind, name),
            });
            (0, children.len() - 1)
        }
    };
    &mut parent.children.entry(column).or_default()[index].node
}

fn flatten_into<'a>(node: &'a Node, path: &NodePath, out: &mut Vec<(NodePath, &'a Node)>) {
    for children in node.children.values() {
        for child in children {
            let child_path = path.joined(&child.name);
            out.push((child_path.clone(), &child.node));
            flatten_into(&child.node, &child_path, out);
        }
    }
}
