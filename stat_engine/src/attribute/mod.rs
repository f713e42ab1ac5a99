//! Attribute - A named quantity derived from a base value plus modifiers

mod calculation;
mod definition;
mod resource;

pub use calculation::{clamp_to_bounds, ValueBreakdown};
pub use definition::{AttributeCatalog, AttributeDefinition, AttributeSetDefinition, AttributeSetEntry};

use crate::events::{EventQueue, StatEvent};
use crate::modifier::Modifier;
use crate::types::ModifierSource;
use std::cell::Cell;

/// Whether an attribute also tracks a bounded current value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeShape {
    /// Plain stat: only the derived value exists
    Plain,
    /// Resource (health, mana, ...): the derived value is the maximum and
    /// `current` lives in `[0, max]`
    Resource { current: f64 },
}

/// One attribute with a memoized derived value
///
/// The derived value is recalculated lazily on the first read after any
/// change to the base value or the modifier collection.
#[derive(Debug, Clone)]
pub struct Attribute {
    id: String,
    base_value: f64,
    min_value: f64,
    max_value: Option<f64>,
    network_sync: bool,
    modifiers: Vec<Modifier>,
    shape: AttributeShape,

    cached_value: Cell<f64>,
    dirty: Cell<bool>,
    recalculations: Cell<u64>,

    events: EventQueue,
}

impl Attribute {
    /// Plain attribute with a lower bound of 0 and no upper bound
    pub fn new(id: impl Into<String>, base_value: f64) -> Self {
        Attribute {
            id: id.into(),
            base_value,
            min_value: 0.0,
            max_value: None,
            network_sync: false,
            modifiers: Vec::new(),
            shape: AttributeShape::Plain,
            cached_value: Cell::new(0.0),
            dirty: Cell::new(true),
            recalculations: Cell::new(0),
            events: EventQueue::new(),
        }
    }

    /// Resource attribute, starting full
    pub fn resource(id: impl Into<String>, base_value: f64) -> Self {
        Self::new(id, base_value).into_resource()
    }

    /// Build from a static definition, optionally overriding the default value
    pub fn from_definition(definition: &AttributeDefinition, resource: bool, default_override: Option<f64>) -> Self {
        let base = default_override.unwrap_or(definition.default_value);
        let attribute = Attribute::new(definition.id.clone(), base)
            .with_bounds(definition.min, definition.max)
            .with_network_sync(definition.network_sync);
        if resource {
            attribute.into_resource()
        } else {
            attribute
        }
    }

    pub fn with_bounds(mut self, min: f64, max: Option<f64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self.dirty.set(true);
        if let AttributeShape::Resource { .. } = self.shape {
            let max = self.value().max(0.0);
            self.shape = AttributeShape::Resource { current: max };
        }
        self
    }

    pub fn with_network_sync(mut self, network_sync: bool) -> Self {
        self.network_sync = network_sync;
        self
    }

    /// Turn into a resource attribute, starting full
    pub fn into_resource(mut self) -> Self {
        let max = self.value().max(0.0);
        self.shape = AttributeShape::Resource { current: max };
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn shape(&self) -> AttributeShape {
        self.shape
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.shape, AttributeShape::Resource { .. })
    }

    pub fn network_sync(&self) -> bool {
        self.network_sync
    }

    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    /// Active modifiers in insertion order
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Whether the next [`value`](Self::value) read will recalculate
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Number of times the derived value has been recalculated
    pub fn recalculations(&self) -> u64 {
        self.recalculations.get()
    }

    /// Derived value, recalculated only when something changed
    pub fn value(&self) -> f64 {
        if self.dirty.get() {
            let value = clamp_to_bounds(self.breakdown().compute(), self.min_value, self.max_value);
            self.cached_value.set(value);
            self.dirty.set(false);
            self.recalculations.set(self.recalculations.get() + 1);
        }
        self.cached_value.get()
    }

    /// Modifier buckets behind the current value (unclamped)
    pub fn breakdown(&self) -> ValueBreakdown {
        ValueBreakdown::from_modifiers(self.base_value, &self.modifiers)
    }

    /// Set the base value; returns false (and notifies nobody) if unchanged
    ///
    /// A resource keeps its current value unless it now exceeds the new
    /// maximum, in which case it is clamped down.
    pub fn set_base_value(&mut self, value: f64) -> bool {
        if value == self.base_value {
            return false;
        }
        self.base_value = value;
        self.invalidate();
        self.clamp_current_to_max();
        true
    }

    pub fn add_modifier(&mut self, modifier: Modifier) {
        let old_max = self.resource_max();
        self.modifiers.push(modifier);
        self.modifiers_changed(old_max);
    }

    /// Remove the first modifier equal to `modifier`
    pub fn remove_modifier(&mut self, modifier: &Modifier) -> bool {
        let Some(index) = self.modifiers.iter().position(|m| m == modifier) else {
            return false;
        };
        let old_max = self.resource_max();
        self.modifiers.remove(index);
        self.modifiers_changed(old_max);
        true
    }

    /// Replace `old` with `new` as one change: the resource current is
    /// rescaled once, from the max before the swap to the max after it.
    /// Adds `new` when `old` is not registered.
    pub fn swap_modifier(&mut self, old: &Modifier, new: Modifier) -> bool {
        let old_max = self.resource_max();
        let found = match self.modifiers.iter().position(|m| m == old) {
            Some(index) => {
                self.modifiers[index] = new;
                true
            }
            None => {
                self.modifiers.push(new);
                false
            }
        };
        self.modifiers_changed(old_max);
        found
    }

    /// Remove every modifier from `source`, returning how many were removed
    pub fn remove_modifiers_by_source(&mut self, source: ModifierSource) -> usize {
        let old_max = self.resource_max();
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.source() != source);
        let removed = before - self.modifiers.len();
        if removed > 0 {
            self.modifiers_changed(old_max);
        }
        removed
    }

    /// Remove all modifiers; returns false if there were none
    pub fn clear_modifiers(&mut self) -> bool {
        if self.modifiers.is_empty() {
            return false;
        }
        let old_max = self.resource_max();
        self.modifiers.clear();
        self.modifiers_changed(old_max);
        true
    }

    /// Take the notifications raised since the last drain
    pub fn drain_events(&mut self) -> Vec<StatEvent> {
        self.events.drain()
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    fn invalidate(&mut self) {
        self.dirty.set(true);
        self.events.push(StatEvent::ValueChanged {
            attribute: self.id.clone(),
        });
    }

    fn modifiers_changed(&mut self, old_max: Option<f64>) {
        self.invalidate();
        if let Some(old_max) = old_max {
            self.rescale_current(old_max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityId;

    #[test]
    fn test_value_formula() {
        let mut attribute = Attribute::new("attack", 100.0);
        attribute.add_modifier(Modifier::flat(20.0));
        attribute.add_modifier(Modifier::percent_add(0.3));
        attribute.add_modifier(Modifier::percent_add(0.2));
        attribute.add_modifier(Modifier::percent_mult(1.2));

        assert!((attribute.value() - 216.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_is_cached_until_changed() {
        let mut attribute = Attribute::new("armour", 50.0);
        let first = attribute.value();
        let count = attribute.recalculations();

        let second = attribute.value();
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(attribute.recalculations(), count);

        attribute.add_modifier(Modifier::flat(5.0));
        assert!(attribute.is_dirty());
        assert!((attribute.value() - 55.0).abs() < f64::EPSILON);
        assert_eq!(attribute.recalculations(), count + 1);
    }

    #[test]
    fn test_every_mutation_invalidates() {
        let mut attribute = Attribute::new("speed", 10.0);
        let modifier = Modifier::percent_add(0.5);

        attribute.add_modifier(modifier);
        assert!((attribute.value() - 15.0).abs() < 1e-9);

        attribute.set_base_value(20.0);
        assert!((attribute.value() - 30.0).abs() < 1e-9);

        assert!(attribute.remove_modifier(&modifier));
        assert!((attribute.value() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_base_value_unchanged_is_silent() {
        let mut attribute = Attribute::new("speed", 10.0);
        attribute.drain_events();

        assert!(!attribute.set_base_value(10.0));
        assert!(attribute.drain_events().is_empty());

        assert!(attribute.set_base_value(12.0));
        assert_eq!(attribute.drain_events().len(), 1);
    }

    #[test]
    fn test_remove_missing_modifier_is_noop() {
        let mut attribute = Attribute::new("speed", 10.0);
        attribute.value();
        let count = attribute.recalculations();

        assert!(!attribute.remove_modifier(&Modifier::flat(1.0)));
        assert!(!attribute.is_dirty());
        assert!(attribute.drain_events().is_empty());
        assert_eq!(attribute.recalculations(), count);
    }

    #[test]
    fn test_remove_by_source() {
        let caster = ModifierSource::Entity(EntityId(7));
        let mut attribute = Attribute::new("strength", 10.0);
        attribute.add_modifier(Modifier::flat(1.0).with_source(caster));
        attribute.add_modifier(Modifier::flat(2.0).with_source(caster));
        attribute.add_modifier(Modifier::flat(4.0));
        attribute.drain_events();

        assert_eq!(attribute.remove_modifiers_by_source(caster), 2);
        assert!((attribute.value() - 14.0).abs() < f64::EPSILON);
        assert_eq!(attribute.drain_events().len(), 1);

        assert_eq!(attribute.remove_modifiers_by_source(caster), 0);
        assert!(attribute.drain_events().is_empty());
    }

    #[test]
    fn test_clear_modifiers() {
        let mut attribute = Attribute::new("strength", 10.0);
        assert!(!attribute.clear_modifiers());

        attribute.add_modifier(Modifier::percent_mult(2.0));
        assert!(attribute.clear_modifiers());
        assert!((attribute.value() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bounds_clamp_value() {
        let mut attribute = Attribute::new("crit_chance", 0.9).with_bounds(0.0, Some(1.0));
        attribute.add_modifier(Modifier::flat(0.5));
        assert!((attribute.value() - 1.0).abs() < f64::EPSILON);

        attribute.add_modifier(Modifier::percent_mult(-1.0));
        assert!((attribute.value() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unbounded_max_only_clamps_lower() {
        let mut attribute = Attribute::new("armour", 10.0);
        attribute.add_modifier(Modifier::flat(-50.0));
        assert!((attribute.value() - 0.0).abs() < f64::EPSILON);

        attribute.clear_modifiers();
        attribute.add_modifier(Modifier::percent_mult(1000.0));
        assert!((attribute.value() - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_definition_uses_override() {
        let definition = AttributeDefinition::new("health", 100.0).with_bounds(0.0, Some(500.0)).synced();

        let plain = Attribute::from_definition(&definition, false, None);
        assert!((plain.value() - 100.0).abs() < f64::EPSILON);
        assert!(plain.network_sync());
        assert!(!plain.is_resource());

        let resource = Attribute::from_definition(&definition, true, Some(250.0));
        assert!(resource.is_resource());
        assert!((resource.value() - 250.0).abs() < f64::EPSILON);
        assert!((resource.current() - 250.0).abs() < f64::EPSILON);
    }
}
