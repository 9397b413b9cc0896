//! Admin configuration: attribute defaults and the particle catalog.
//!
//! # Responsibility
//! - Load node-type defaults keyed by particle name (or kind name).
//! - Describe which particles exist and which layout kind each one has.
//!
//! # Invariants
//! - Catalog entries must use a layout leaf kind.
//! - Lookup key is `subtype`, falling back to the kind name.

use crate::model::attributes::Attributes;
use crate::model::node::NodeKind;
use crate::registry::defaults::DefaultsProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Errors from loading admin configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file cannot be read.
    Io(std::io::Error),
    /// Config text is not valid JSON of the expected shape.
    Parse(serde_json::Error),
    /// Catalog entry uses a kind that cannot be placed as a particle.
    InvalidParticleKind { name: String, kind: NodeKind },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read admin config: {err}"),
            Self::Parse(err) => write!(f, "invalid admin config: {err}"),
            Self::InvalidParticleKind { name, kind } => {
                write!(f, "particle `{name}` cannot use kind `{kind}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidParticleKind { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// One installed particle definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleDefinition {
    #[serde(rename = "type", default = "default_particle_kind")]
    pub kind: NodeKind,
    /// Human-readable particle name.
    pub name: String,
}

fn default_particle_kind() -> NodeKind {
    NodeKind::Particle
}

/// Admin-side configuration consumed by the registries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Type name -> attribute defaults.
    #[serde(default)]
    pub defaults: BTreeMap<String, Attributes>,
    /// Particle name -> catalog entry.
    #[serde(default)]
    pub particles: BTreeMap<String, ParticleDefinition>,
}

impl AdminConfig {
    /// Parses config from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Registers defaults for one type name.
    pub fn with_defaults(mut self, name: impl Into<String>, defaults: Attributes) -> Self {
        self.defaults.insert(name.into(), defaults);
        self
    }

    /// Registers one particle catalog entry.
    pub fn with_particle(
        mut self,
        name: impl Into<String>,
        kind: NodeKind,
        display_name: impl Into<String>,
    ) -> Self {
        self.particles.insert(
            name.into(),
            ParticleDefinition {
                kind,
                name: display_name.into(),
            },
        );
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, particle) in &self.particles {
            if particle.kind.is_container() || particle.kind == NodeKind::Item {
                return Err(ConfigError::InvalidParticleKind {
                    name: name.clone(),
                    kind: particle.kind,
                });
            }
        }
        Ok(())
    }
}

impl DefaultsProvider for AdminConfig {
    fn get_defaults(&self, kind: NodeKind, subtype: Option<&str>) -> Option<Attributes> {
        let key = subtype.unwrap_or(kind.as_str());
        self.defaults.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{AdminConfig, ConfigError};
    use crate::model::node::NodeKind;
    use crate::registry::defaults::DefaultsProvider;
    use serde_json::json;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "defaults": {
            "banner": {"enabled": 1, "height": 200},
            "spacer": {"enabled": 1}
        },
        "particles": {
            "banner": {"name": "Banner"},
            "analytics": {"type": "atom", "name": "Analytics"}
        }
    }"#;

    #[test]
    fn parses_defaults_and_catalog() {
        let config = AdminConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.particles["banner"].kind, NodeKind::Particle);
        assert_eq!(config.particles["analytics"].kind, NodeKind::Atom);

        let defaults = config
            .get_defaults(NodeKind::Particle, Some("banner"))
            .unwrap();
        assert_eq!(defaults.get("height"), Some(&json!(200)));
    }

    #[test]
    fn lookup_falls_back_to_kind_name() {
        let config = AdminConfig::from_json_str(SAMPLE).unwrap();
        assert!(config.get_defaults(NodeKind::Spacer, None).is_some());
        assert!(config.get_defaults(NodeKind::Particle, None).is_none());
    }

    #[test]
    fn rejects_container_particle_kind() {
        let err = AdminConfig::from_json_str(r#"{"particles": {"x": {"type": "section", "name": "X"}}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParticleKind { .. }));
    }

    #[test]
    fn reads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = AdminConfig::from_file(file.path()).unwrap();
        assert_eq!(config.defaults.len(), 2);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = AdminConfig::from_file("/nonexistent/trellis/admin.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
