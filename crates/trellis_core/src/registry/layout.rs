//! Layout node registry.
//!
//! # Responsibility
//! - Type layout nodes (`section|grid|position|spacer|pagecontent|particle|atom`).
//! - Merge configured defaults for leaf kinds only.
//! - Route each node to the blueprint that governs its attributes.
//! - Normalize submitted particle forms and group the particle catalog.
//!
//! # Invariants
//! - `section` and `grid` never receive type defaults.
//! - Leaf defaults are keyed by `subtype`, falling back to the kind name.
//! - A normalized block has no empty-string entries and an integer `size`.

use crate::config::AdminConfig;
use crate::model::attributes::{merge_attributes, Attributes};
use crate::model::document::DocumentKind;
use crate::model::node::{Children, Node, NodeKind, NodePatch};
use crate::model::path::validate_segment;
use crate::registry::defaults::DefaultsProvider;
use crate::registry::{capitalize, NodeRegistry, RegistryError};
use serde_json::Value;

/// Blueprint shared by every leaf particle form.
pub const BLOCK_BLUEPRINT: &str = "layout/block";

/// Names of the external blueprints governing one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueprintRef {
    /// Primary attribute blueprint.
    pub form: String,
    /// Extra block blueprint; present for leaf kinds only.
    pub extra: Option<String>,
}

/// Registry for layout documents.
#[derive(Debug, Clone)]
pub struct LayoutRegistry<D: DefaultsProvider> {
    defaults: D,
}

impl<D: DefaultsProvider> LayoutRegistry<D> {
    pub fn new(defaults: D) -> Self {
        Self { defaults }
    }

    /// Returns the blueprints governing a node of `(kind, subtype)`.
    pub fn blueprint(&self, kind: NodeKind, subtype: Option<&str>) -> BlueprintRef {
        if kind.is_container() {
            return BlueprintRef {
                form: format!("layout/{}", kind.as_str()),
                extra: None,
            };
        }
        BlueprintRef {
            form: subtype.unwrap_or(kind.as_str()).to_string(),
            extra: Some(BLOCK_BLUEPRINT.to_string()),
        }
    }

    /// Builds a normalized particle payload from a submitted form.
    ///
    /// `name` is a particle name or one of the fixed kinds. The result kind is
    /// `section|grid|position|spacer|pagecontent` when `name` is one of those,
    /// `particle` otherwise, with `subtype = name` when it differs from the
    /// kind. `attributes.enabled` is always coerced to `0` or `1`, and a
    /// submitted block goes through [`normalize_block`].
    pub fn normalize_particle(&self, name: &str, submitted: &NodePatch) -> Result<Node, RegistryError> {
        validate_segment(name).map_err(|_| RegistryError::InvalidTypeName(name.to_string()))?;

        let kind = match NodeKind::parse(name) {
            Some(
                kind @ (NodeKind::Section
                | NodeKind::Grid
                | NodeKind::Position
                | NodeKind::Spacer
                | NodeKind::Pagecontent),
            ) => kind,
            _ => NodeKind::Particle,
        };

        if kind.is_container() {
            return Ok(Node {
                kind,
                subtype: None,
                title: submitted
                    .title
                    .clone()
                    .unwrap_or_else(|| self.default_title(kind, None)),
                attributes: with_enabled_flag(submitted.attributes.clone()),
                block: submitted.block.as_ref().map(normalize_block),
                children: Children::new(),
            });
        }

        let subtype = (kind.as_str() != name).then(|| name.to_string());
        let defaults = self.defaults(kind, subtype.as_deref());
        let attributes = merge_attributes(&submitted.attributes, &Attributes::new(), &defaults);

        Ok(Node {
            kind,
            title: submitted.title.clone().unwrap_or_else(|| capitalize(name)),
            subtype,
            attributes: with_enabled_flag(attributes),
            block: submitted.block.as_ref().map(normalize_block),
            children: Children::new(),
        })
    }
}

impl<D: DefaultsProvider> NodeRegistry for LayoutRegistry<D> {
    fn flavor(&self) -> DocumentKind {
        DocumentKind::Layout
    }

    fn accepts(&self, kind: NodeKind) -> bool {
        NodeKind::LAYOUT.contains(&kind)
    }

    fn default_kind(&self) -> Option<NodeKind> {
        None
    }

    fn defaults(&self, kind: NodeKind, subtype: Option<&str>) -> Attributes {
        if kind.is_container() {
            return Attributes::new();
        }
        self.defaults.get_defaults(kind, subtype).unwrap_or_default()
    }

    fn default_title(&self, kind: NodeKind, subtype: Option<&str>) -> String {
        capitalize(subtype.unwrap_or(kind.as_str()))
    }
}

fn with_enabled_flag(mut attributes: Attributes) -> Attributes {
    let enabled = attributes.get("enabled").map_or(false, is_truthy);
    attributes.insert("enabled".to_string(), Value::from(i64::from(enabled)));
    attributes
}

/// Drops empty-string entries and coerces `size` to an integer.
pub fn normalize_block(block: &Attributes) -> Attributes {
    block
        .iter()
        .filter(|(_, value)| value.as_str() != Some(""))
        .map(|(key, value)| {
            let value = if key == "size" {
                Value::from(integer_value(value))
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}

// Leading-integer reading of form input: "25" -> 25, "33.3" -> 33, "wide" -> 0.
fn integer_value(value: &Value) -> i64 {
    match value {
        Value::Bool(flag) => i64::from(*flag),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|n| n.trunc() as i64))
            .unwrap_or(0),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .map(|n| n.trunc() as i64)
                })
                .unwrap_or(0)
        }
        Value::Null | Value::Array(_) | Value::Object(_) => 0,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0),
        Value::String(text) => {
            let text = text.trim();
            !text.is_empty() && text != "0"
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// One installed particle shown in the layout editor palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub display_name: String,
}

/// Palette section: label plus entries per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogGroup {
    pub label: &'static str,
    pub kinds: Vec<(NodeKind, Vec<CatalogEntry>)>,
}

/// Groups configured particles into `Positions`, `Particles` and `Atoms`.
///
/// Entries inside each kind are sorted by display name.
pub fn particle_catalog(config: &AdminConfig) -> Vec<CatalogGroup> {
    let layout: [(&'static str, &[NodeKind]); 3] = [
        (
            "Positions",
            &[NodeKind::Position, NodeKind::Spacer, NodeKind::Pagecontent],
        ),
        ("Particles", &[NodeKind::Particle]),
        ("Atoms", &[NodeKind::Atom]),
    ];

    layout
        .into_iter()
        .map(|(label, kinds)| CatalogGroup {
            label,
            kinds: kinds
                .iter()
                .map(|kind| {
                    let mut entries: Vec<CatalogEntry> = config
                        .particles
                        .iter()
                        .filter(|(_, particle)| particle.kind == *kind)
                        .map(|(name, particle)| CatalogEntry {
                            name: name.clone(),
                            display_name: particle.name.clone(),
                        })
                        .collect();
                    entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
                    (*kind, entries)
                })
                .collect(),
        })
        .collect()
}
