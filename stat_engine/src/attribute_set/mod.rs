//! AttributeSet - All attributes of one entity, keyed by attribute id
//!
//! Every accessor is forgiving: an unknown key yields 0 / false / no-op so
//! that content referencing a stat the entity does not have cannot break the
//! simulation. Mutations through an unknown key are logged at `warn`.

mod sync;

pub use sync::{SyncEntry, SyncSnapshot};

use crate::attribute::{Attribute, AttributeCatalog, AttributeSetDefinition};
use crate::events::{EventQueue, StatEvent};
use crate::modifier::Modifier;
use crate::types::ModifierSource;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Name-keyed attributes for one entity, in definition order
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    definition_id: String,
    attributes: Vec<Attribute>,
    index: HashMap<String, usize>,
    events: EventQueue,
}

impl AttributeSet {
    /// Create an empty, uninitialized set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a definition
    pub fn from_definition(definition: &AttributeSetDefinition, catalog: &AttributeCatalog) -> Self {
        let mut set = AttributeSet::new();
        set.initialize(definition, catalog);
        set
    }

    /// Build a set directly from attributes (first occurrence of a key wins)
    pub fn from_attributes(definition_id: impl Into<String>, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        let mut set = AttributeSet {
            definition_id: definition_id.into(),
            ..Self::default()
        };
        for attribute in attributes {
            set.insert(attribute);
        }
        set
    }

    /// (Re)build every attribute from `definition`
    ///
    /// Always discards the previous contents, including modifiers and
    /// current resource values. Entries that reference an unknown attribute
    /// or repeat a key are skipped with a warning.
    pub fn initialize(&mut self, definition: &AttributeSetDefinition, catalog: &AttributeCatalog) {
        self.reset();
        self.definition_id = definition.id.clone();

        for entry in &definition.entries {
            let Some(attribute_definition) = catalog.get(&entry.attribute) else {
                warn!(set = %definition.id, attribute = %entry.attribute, "attribute set references unknown attribute");
                continue;
            };
            let attribute = Attribute::from_definition(attribute_definition, entry.resource, entry.default_value);
            self.insert(attribute);
        }

        debug!(set = %self.definition_id, attributes = self.attributes.len(), "attribute set initialized");
    }

    /// Drop all attributes and pending events
    pub fn reset(&mut self) {
        self.definition_id.clear();
        self.attributes.clear();
        self.index.clear();
        self.events.clear();
    }

    fn insert(&mut self, attribute: Attribute) {
        if self.index.contains_key(attribute.id()) {
            warn!(set = %self.definition_id, attribute = attribute.id(), "duplicate attribute skipped");
            return;
        }
        self.index.insert(attribute.id().to_string(), self.attributes.len());
        self.attributes.push(attribute);
    }

    /// Run `f` on one attribute and collect whatever it raised
    fn with_attribute<R>(&mut self, key: &str, operation: &'static str, f: impl FnOnce(&mut Attribute) -> R) -> Option<R> {
        let Some(&index) = self.index.get(key) else {
            warn!(attribute = key, operation, "unknown attribute key");
            return None;
        };
        let attribute = &mut self.attributes[index];
        let result = f(attribute);
        self.events.append(attribute.events_mut());
        Some(result)
    }

    /// Like `with_attribute`, but only for resource attributes
    fn with_resource<R>(&mut self, key: &str, operation: &'static str, f: impl FnOnce(&mut Attribute) -> R) -> Option<R> {
        let is_plain = self.attribute(key).is_some_and(|a| !a.is_resource());
        if is_plain {
            warn!(attribute = key, operation, "attribute is not a resource");
            return None;
        }
        self.with_attribute(key, operation, f)
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Attribute ids in definition order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.id())
    }

    /// Attributes in definition order
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.index.get(key).map(|&i| &self.attributes[i])
    }

    // === Values ===

    /// Derived value, or 0 for an unknown key
    pub fn value(&self, key: &str) -> f64 {
        match self.attribute(key) {
            Some(attribute) => attribute.value(),
            None => {
                trace!(attribute = key, "value read for unknown attribute");
                0.0
            }
        }
    }

    pub fn base_value(&self, key: &str) -> f64 {
        self.attribute(key).map(|a| a.base_value()).unwrap_or(0.0)
    }

    pub fn set_base_value(&mut self, key: &str, value: f64) -> bool {
        self.with_attribute(key, "set_base_value", |a| a.set_base_value(value))
            .unwrap_or(false)
    }

    // === Modifiers ===

    /// Add a modifier; returns false if the key is unknown
    pub fn add_modifier(&mut self, key: &str, modifier: Modifier) -> bool {
        self.with_attribute(key, "add_modifier", |a| a.add_modifier(modifier))
            .is_some()
    }

    /// Remove a modifier; returns false if the key or modifier is unknown
    pub fn remove_modifier(&mut self, key: &str, modifier: &Modifier) -> bool {
        self.with_attribute(key, "remove_modifier", |a| a.remove_modifier(modifier))
            .unwrap_or(false)
    }

    /// Swap a registered modifier for another in a single rescale. Returns
    /// false if the key is unknown or `old` was not registered, in which
    /// case `new` is still added to a known key
    pub fn swap_modifier(&mut self, key: &str, old: &Modifier, new: Modifier) -> bool {
        self.with_attribute(key, "swap_modifier", |a| a.swap_modifier(old, new))
            .unwrap_or(false)
    }

    /// Remove every modifier from `source` across all attributes
    pub fn remove_modifiers_from_source(&mut self, source: ModifierSource) -> usize {
        let mut removed = 0;
        for attribute in &mut self.attributes {
            removed += attribute.remove_modifiers_by_source(source);
            self.events.append(attribute.events_mut());
        }
        removed
    }

    // === Resources ===

    pub fn reduce_resource(&mut self, key: &str, amount: f64) -> f64 {
        self.with_resource(key, "reduce_resource", |a| a.reduce(amount))
            .unwrap_or(0.0)
    }

    pub fn restore_resource(&mut self, key: &str, amount: f64) -> f64 {
        self.with_resource(key, "restore_resource", |a| a.restore(amount))
            .unwrap_or(0.0)
    }

    pub fn fill_resource(&mut self, key: &str) {
        self.with_resource(key, "fill_resource", |a| a.fill());
    }

    pub fn deplete_resource(&mut self, key: &str) {
        self.with_resource(key, "deplete_resource", |a| a.deplete());
    }

    pub fn set_resource_current(&mut self, key: &str, value: f64) -> bool {
        self.with_resource(key, "set_resource_current", |a| a.set_current_direct(value))
            .unwrap_or(false)
    }

    /// Refill every resource attribute
    pub fn fill_all_resources(&mut self) {
        for attribute in &mut self.attributes {
            attribute.fill();
            self.events.append(attribute.events_mut());
        }
    }

    pub fn current(&self, key: &str) -> f64 {
        self.attribute(key).map(|a| a.current()).unwrap_or(0.0)
    }

    pub fn max(&self, key: &str) -> f64 {
        self.attribute(key).map(|a| a.max()).unwrap_or(0.0)
    }

    pub fn percent(&self, key: &str) -> f64 {
        self.attribute(key).map(|a| a.percent()).unwrap_or(0.0)
    }

    pub fn is_depleted(&self, key: &str) -> bool {
        self.attribute(key).map(|a| a.is_depleted()).unwrap_or(false)
    }

    // === Events ===

    /// Take all notifications raised since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<StatEvent> {
        self.events.drain()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeDefinition;
    use crate::types::EntityId;

    fn catalog() -> AttributeCatalog {
        [
            AttributeDefinition::new("health", 100.0).synced(),
            AttributeDefinition::new("mana", 50.0).synced(),
            AttributeDefinition::new("strength", 10.0),
            AttributeDefinition::new("armour", 0.0),
        ]
        .into_iter()
        .collect()
    }

    fn warrior() -> AttributeSetDefinition {
        AttributeSetDefinition::new("warrior")
            .with_resource("health")
            .with_default(200.0)
            .with_resource("mana")
            .with_attribute("strength")
            .with_attribute("armour")
    }

    #[test]
    fn test_initialize_from_definition() {
        let set = AttributeSet::from_definition(&warrior(), &catalog());

        assert_eq!(set.definition_id(), "warrior");
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["health", "mana", "strength", "armour"]);
        assert!((set.max("health") - 200.0).abs() < f64::EPSILON);
        assert!((set.current("health") - 200.0).abs() < f64::EPSILON);
        assert!((set.value("strength") - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reinitialize_always_rebuilds() {
        let catalog = catalog();
        let mut set = AttributeSet::from_definition(&warrior(), &catalog);
        set.add_modifier("strength", Modifier::flat(5.0));
        set.reduce_resource("health", 150.0);

        set.initialize(&warrior(), &catalog);
        assert!((set.value("strength") - 10.0).abs() < f64::EPSILON);
        assert!((set.current("health") - 200.0).abs() < f64::EPSILON);

        let mage = AttributeSetDefinition::new("mage").with_resource("mana");
        set.initialize(&mage, &catalog);
        assert_eq!(set.len(), 1);
        assert!(!set.contains("health"));
    }

    #[test]
    fn test_unknown_entries_are_skipped() {
        let definition = AttributeSetDefinition::new("odd")
            .with_attribute("strength")
            .with_attribute("luck")
            .with_attribute("strength");
        let set = AttributeSet::from_definition(&definition, &catalog());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unknown_key_is_neutral() {
        let mut set = AttributeSet::from_definition(&warrior(), &catalog());

        assert_eq!(set.value("luck"), 0.0);
        assert_eq!(set.base_value("luck"), 0.0);
        assert!(!set.set_base_value("luck", 3.0));
        assert!(!set.add_modifier("luck", Modifier::flat(1.0)));
        assert!(!set.remove_modifier("luck", &Modifier::flat(1.0)));
        assert_eq!(set.reduce_resource("luck", 5.0), 0.0);
        assert_eq!(set.percent("luck"), 0.0);
        assert_eq!(set.pending_events(), 0);
    }

    #[test]
    fn test_resource_calls_on_plain_attribute() {
        let mut set = AttributeSet::from_definition(&warrior(), &catalog());
        assert_eq!(set.reduce_resource("strength", 5.0), 0.0);
        assert!((set.value("strength") - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_modifiers_from_source() {
        let a = ModifierSource::Entity(EntityId(1));
        let b = ModifierSource::Entity(EntityId(2));
        let mut set = AttributeSet::from_definition(&warrior(), &catalog());

        set.add_modifier("strength", Modifier::flat(1.0).with_source(a));
        set.add_modifier("armour", Modifier::flat(2.0).with_source(a));
        set.add_modifier("health", Modifier::percent_add(0.1).with_source(a));
        set.add_modifier("strength", Modifier::flat(3.0).with_source(b));
        set.add_modifier("mana", Modifier::flat(4.0).with_source(b));

        assert_eq!(set.remove_modifiers_from_source(a), 3);
        assert!((set.value("strength") - 13.0).abs() < f64::EPSILON);
        assert!((set.value("armour") - 0.0).abs() < f64::EPSILON);
        assert!((set.max("mana") - 54.0).abs() < f64::EPSILON);
        assert_eq!(set.remove_modifiers_from_source(a), 0);
    }

    #[test]
    fn test_events_are_collected_in_order() {
        let mut set = AttributeSet::from_definition(&warrior(), &catalog());
        set.add_modifier("strength", Modifier::flat(1.0));
        set.reduce_resource("health", 200.0);

        let events = set.drain_events();
        assert_eq!(
            events,
            vec![
                StatEvent::ValueChanged {
                    attribute: "strength".to_string()
                },
                StatEvent::ResourceChanged {
                    attribute: "health".to_string(),
                    old: 200.0,
                    new: 0.0
                },
                StatEvent::ResourceDepleted {
                    attribute: "health".to_string()
                },
            ]
        );
        assert_eq!(set.pending_events(), 0);
    }
}
