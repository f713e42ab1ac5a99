//! Content - Every static definition the engine consumes, loaded together

use super::{load_toml, parse_toml, validate, ConfigError};
use crate::attribute::{AttributeCatalog, AttributeDefinition, AttributeSetDefinition};
use crate::attribute_set::AttributeSet;
use crate::buff::{BuffCatalog, BuffDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// On-disk layout of a content file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentFile {
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub attribute_sets: Vec<AttributeSetDefinition>,
    #[serde(default)]
    pub buffs: Vec<BuffDefinition>,
}

/// Validated, indexed content
#[derive(Debug, Clone, Default)]
pub struct Content {
    pub attributes: AttributeCatalog,
    pub attribute_sets: HashMap<String, AttributeSetDefinition>,
    pub buffs: BuffCatalog,
}

impl Content {
    /// Load and validate a content file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file: ContentFile = load_toml(path)?;
        Self::from_file(file)
    }

    /// Parse and validate content from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ContentFile = parse_toml(content)?;
        Self::from_file(file)
    }

    pub fn from_file(file: ContentFile) -> Result<Self, ConfigError> {
        validate::validate(&file)?;

        let content = Content {
            attributes: file.attributes.into_iter().collect(),
            attribute_sets: file
                .attribute_sets
                .into_iter()
                .map(|set| (set.id.clone(), set))
                .collect(),
            buffs: file.buffs.into_iter().collect(),
        };
        debug!(
            attributes = content.attributes.len(),
            attribute_sets = content.attribute_sets.len(),
            buffs = content.buffs.len(),
            "content loaded"
        );
        Ok(content)
    }

    /// Bundled default content
    pub fn with_defaults() -> Self {
        let toml = include_str!("../../config/defaults.toml");
        Self::parse(toml).unwrap_or_else(|e| {
            warn!(error = %e, "bundled content failed to load");
            Self::default()
        })
    }

    pub fn attribute_set(&self, id: &str) -> Option<&AttributeSetDefinition> {
        self.attribute_sets.get(id)
    }

    pub fn buff(&self, id: &str) -> Option<&Arc<BuffDefinition>> {
        self.buffs.get(id)
    }

    /// Build a fresh attribute set from the definition `id`
    pub fn build_attribute_set(&self, id: &str) -> Option<AttributeSet> {
        let Some(definition) = self.attribute_set(id) else {
            warn!(set = id, "unknown attribute set");
            return None;
        };
        Some(AttributeSet::from_definition(definition, &self.attributes))
    }
}
