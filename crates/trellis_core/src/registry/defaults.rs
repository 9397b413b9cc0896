//! Defaults provider contract.

use crate::model::attributes::Attributes;
use crate::model::node::NodeKind;

/// Source of configured attribute defaults per node type.
///
/// Implementations look up `subtype` first and fall back to the kind name.
/// `None` means no defaults are configured for that type.
pub trait DefaultsProvider {
    fn get_defaults(&self, kind: NodeKind, subtype: Option<&str>) -> Option<Attributes>;
}

impl<T: DefaultsProvider + ?Sized> DefaultsProvider for &T {
    fn get_defaults(&self, kind: NodeKind, subtype: Option<&str>) -> Option<Attributes> {
        (**self).get_defaults(kind, subtype)
    }
}

/// Provider with no configured defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefaults;

impl DefaultsProvider for NoDefaults {
    fn get_defaults(&self, _kind: NodeKind, _subtype: Option<&str>) -> Option<Attributes> {
        None
    }
}
