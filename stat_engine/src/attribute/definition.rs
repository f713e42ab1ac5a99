//! Static attribute and attribute-set definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static description of one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Stable key (e.g. "health", "armour", "move_speed")
    pub id: String,
    #[serde(default)]
    pub default_value: f64,
    /// Lower clamp for the derived value
    #[serde(default)]
    pub min: f64,
    /// Upper clamp for the derived value; `None` is unbounded
    #[serde(default)]
    pub max: Option<f64>,
    /// Whether the attribute appears in sync snapshots
    #[serde(default)]
    pub network_sync: bool,
}

impl AttributeDefinition {
    pub fn new(id: impl Into<String>, default_value: f64) -> Self {
        AttributeDefinition {
            id: id.into(),
            default_value,
            min: 0.0,
            max: None,
            network_sync: false,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn synced(mut self) -> Self {
        self.network_sync = true;
        self
    }
}

/// One entry of an attribute-set definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSetEntry {
    /// Id of an [`AttributeDefinition`]
    pub attribute: String,
    /// Build a resource attribute (current/max) instead of a plain one
    #[serde(default)]
    pub resource: bool,
    /// Overrides the definition's default value for this set
    #[serde(default)]
    pub default_value: Option<f64>,
}

/// Ordered list of attributes an entity type carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSetDefinition {
    pub id: String,
    #[serde(default)]
    pub entries: Vec<AttributeSetEntry>,
}

impl AttributeSetDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        AttributeSetDefinition {
            id: id.into(),
            entries: Vec::new(),
        }
    }

    /// Add a plain attribute entry
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.entries.push(AttributeSetEntry {
            attribute: attribute.into(),
            resource: false,
            default_value: None,
        });
        self
    }

    /// Add a resource attribute entry
    pub fn with_resource(mut self, attribute: impl Into<String>) -> Self {
        self.entries.push(AttributeSetEntry {
            attribute: attribute.into(),
            resource: true,
            default_value: None,
        });
        self
    }

    /// Override the default value of the most recently added entry
    pub fn with_default(mut self, value: f64) -> Self {
        if let Some(entry) = self.entries.last_mut() {
            entry.default_value = Some(value);
        }
        self
    }
}

/// Attribute definition registry
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalog {
    definitions: HashMap<String, AttributeDefinition>,
}

impl AttributeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same id
    pub fn register(&mut self, definition: AttributeDefinition) -> Option<AttributeDefinition> {
        self.definitions.insert(definition.id.clone(), definition)
    }

    pub fn get(&self, id: &str) -> Option<&AttributeDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.definitions.values()
    }
}

impl FromIterator<AttributeDefinition> for AttributeCatalog {
    fn from_iter<I: IntoIterator<Item = AttributeDefinition>>(iter: I) -> Self {
        let mut catalog = AttributeCatalog::new();
        for definition in iter {
            catalog.register(definition);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_builder_overrides_last_entry() {
        let set = AttributeSetDefinition::new("goblin")
            .with_resource("health")
            .with_default(40.0)
            .with_attribute("armour");

        assert_eq!(set.entries.len(), 2);
        assert!(set.entries[0].resource);
        assert_eq!(set.entries[0].default_value, Some(40.0));
        assert_eq!(set.entries[1].default_value, None);
    }

    #[test]
    fn test_catalog_register_replaces() {
        let mut catalog = AttributeCatalog::new();
        assert!(catalog.register(AttributeDefinition::new("health", 100.0)).is_none());
        let previous = catalog.register(AttributeDefinition::new("health", 150.0));

        assert_eq!(previous.map(|d| d.default_value), Some(100.0));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("health").map(|d| d.default_value), Some(150.0));
    }
}
