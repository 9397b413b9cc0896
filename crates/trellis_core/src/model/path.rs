//! Slash-delimited node paths.
//!
//! # Responsibility
//! - Parse and format the path addressing scheme shared by layouts and menus.
//! - Provide parent/child navigation helpers used by tree and reconciler.
//!
//! # Invariants
//! - The empty path addresses the document root.
//! - Segments are never empty, never contain `/` and carry no surrounding
//!   whitespace, so a name and the path text built from it always agree.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Segment delimiter used by every node path.
pub const PATH_DELIMITER: char = '/';

/// Errors from parsing or extending a node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path contains an empty segment (`a//b`).
    EmptySegment(String),
    /// Segment name is blank, padded with whitespace or contains the delimiter.
    InvalidSegment(String),
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySegment(path) => write!(f, "path contains an empty segment: `{path}`"),
            Self::InvalidSegment(segment) => write!(f, "invalid path segment: `{segment}`"),
        }
    }
}

impl Error for PathError {}

/// Address of one node inside a document tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// Returns the root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a slash-delimited path.
    ///
    /// Leading and trailing delimiters are ignored, so `"/a/b/"` equals `"a/b"`.
    /// Blank text is the root. Whitespace around a segment is an error, not
    /// trimmed: `" hero"` never silently becomes `hero`.
    pub fn parse(value: &str) -> Result<Self, PathError> {
        let trimmed = value.trim_matches(PATH_DELIMITER);
        if trimmed.trim().is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split(PATH_DELIMITER) {
            if segment.trim().is_empty() {
                return Err(PathError::EmptySegment(value.to_string()));
            }
            validate_segment(segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Returns a new path with one more segment.
    pub fn child(&self, name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        validate_segment(&name)?;
        let mut segments = self.segments.clone();
        segments.push(name);
        Ok(Self { segments })
    }

    /// Appends a segment already stored in a tree, skipping validation.
    pub(crate) fn joined(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns the last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the first `len` segments as a path.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments.iter().take(len).cloned().collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments; the root has depth `0`.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns whether `self` is `other` or lies below it.
    pub fn starts_with(&self, other: &NodePath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

/// Validates one path segment name.
pub fn validate_segment(name: &str) -> Result<(), PathError> {
    if name.trim().is_empty() || name.trim() != name || name.contains(PATH_DELIMITER) {
        return Err(PathError::InvalidSegment(name.to_string()));
    }
    Ok(())
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl TryFrom<String> for NodePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for NodePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<NodePath> for String {
    fn from(value: NodePath) -> Self {
        value.to_string()
    }
}
