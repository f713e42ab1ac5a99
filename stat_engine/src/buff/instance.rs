//! BuffInstance - Runtime state of one applied buff

use super::definition::{BuffDefinition, RemovalPolicy};
use crate::attribute_set::AttributeSet;
use crate::modifier::Modifier;
use crate::types::{BuffHandle, ModifierSource, StatusFlags};
use std::sync::Arc;

/// One applied buff: `Active` until [`expire`](Self::expire), then inert
#[derive(Debug, Clone)]
pub struct BuffInstance {
    handle: BuffHandle,
    definition: Arc<BuffDefinition>,
    /// Whoever applied the buff
    source: ModifierSource,
    stacks: u32,
    remaining_duration: f64,
    next_tick_countdown: f64,
    remaining_uses: u32,
    expired: bool,
    /// Modifiers currently registered in the owner's attribute set
    applied_modifiers: Vec<(String, Modifier)>,
}

impl BuffInstance {
    pub fn new(handle: BuffHandle, definition: Arc<BuffDefinition>, source: ModifierSource) -> Self {
        let next_tick_countdown = definition.tick.map(|t| t.interval).unwrap_or(0.0);
        BuffInstance {
            handle,
            source,
            stacks: 1,
            remaining_duration: definition.duration,
            next_tick_countdown,
            remaining_uses: definition.max_uses,
            expired: false,
            applied_modifiers: Vec::new(),
            definition,
        }
    }

    pub fn handle(&self) -> BuffHandle {
        self.handle
    }

    pub fn definition(&self) -> &BuffDefinition {
        &self.definition
    }

    pub fn definition_id(&self) -> &str {
        &self.definition.id
    }

    pub fn source(&self) -> ModifierSource {
        self.source
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    /// Seconds left; meaningless for permanent buffs
    pub fn remaining_duration(&self) -> f64 {
        self.remaining_duration
    }

    pub fn next_tick_countdown(&self) -> f64 {
        self.next_tick_countdown
    }

    pub fn remaining_uses(&self) -> u32 {
        self.remaining_uses
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn is_permanent(&self) -> bool {
        self.definition.is_permanent()
    }

    pub fn status_flags(&self) -> StatusFlags {
        self.definition.status_flags
    }

    /// Modifiers this instance has registered, by attribute key
    pub fn applied_modifiers(&self) -> &[(String, Modifier)] {
        &self.applied_modifiers
    }

    /// Source tag put on every modifier this instance registers
    pub fn modifier_source(&self) -> ModifierSource {
        ModifierSource::Buff(self.handle)
    }

    /// Signed tick delta at the current stack count
    pub fn tick_delta(&self) -> Option<f64> {
        self.definition.tick.map(|t| t.magnitude * self.stacks as f64)
    }

    /// Advance by `dt` seconds; returns true if a tick is due this call
    ///
    /// Natural expiry wins over a tick landing on the same call. The tick
    /// countdown carries its overshoot into the next interval.
    pub fn update(&mut self, dt: f64) -> bool {
        if self.expired {
            return false;
        }

        if !self.is_permanent() && self.definition.removal.contains(RemovalPolicy::TIMER) {
            self.remaining_duration -= dt;
            if self.remaining_duration <= 0.0 {
                self.expire();
                return false;
            }
        }

        if let Some(tick) = self.definition.tick {
            self.next_tick_countdown -= dt;
            if self.next_tick_countdown <= 0.0 {
                self.next_tick_countdown += tick.interval;
                return true;
            }
        }

        false
    }

    /// Mark as expired; the owning engine removes it on its next pass
    pub fn expire(&mut self) {
        self.expired = true;
    }

    /// Add one stack; false if not stackable or already at max
    ///
    /// The caller re-registers modifiers for the new count.
    pub fn add_stack(&mut self) -> bool {
        if self.expired || !self.definition.stackable || self.stacks >= self.definition.max_stacks {
            return false;
        }
        self.stacks += 1;
        true
    }

    /// Remove one stack; returns true when that was the last one (expired)
    pub fn remove_stack(&mut self) -> bool {
        if self.stacks <= 1 {
            self.expire();
            return true;
        }
        self.stacks -= 1;
        false
    }

    pub fn refresh_duration(&mut self) {
        self.remaining_duration = self.definition.duration;
    }

    /// Extend the timer; the result may exceed the definition's duration
    pub fn add_duration(&mut self, amount: f64) {
        self.remaining_duration += amount;
    }

    /// Owner took damage
    pub fn on_take_damage(&mut self) {
        if self.definition.removal.contains(RemovalPolicy::ON_HIT) {
            self.expire();
        }
    }

    /// Spend one use; returns true when the uses ran out (expired)
    pub fn consume_use(&mut self) -> bool {
        if !self.definition.removal.contains(RemovalPolicy::ON_USE_COUNT) {
            return false;
        }
        self.remaining_uses = self.remaining_uses.saturating_sub(1);
        if self.remaining_uses == 0 {
            self.expire();
            return true;
        }
        false
    }

    /// Register one modifier per template at the current stack count,
    /// replacing whatever this instance registered before. A modifier that
    /// is already registered is swapped in place so resources rescale once.
    pub fn apply_modifiers(&mut self, attributes: &mut AttributeSet) {
        let mut previous = std::mem::take(&mut self.applied_modifiers);

        let source = self.modifier_source();
        for template in &self.definition.modifiers {
            let modifier = template.instantiate(self.stacks, source);
            let registered = match previous.iter().position(|(key, _)| *key == template.attribute) {
                Some(index) => {
                    let (key, old) = previous.remove(index);
                    let swapped = attributes.swap_modifier(&key, &old, modifier);
                    debug_assert!(swapped, "buff modifier on '{key}' was not registered");
                    true
                }
                // Unknown keys are skipped (and logged) by the set
                None => attributes.add_modifier(&template.attribute, modifier),
            };
            if registered {
                self.applied_modifiers.push((template.attribute.clone(), modifier));
            }
        }

        for (key, modifier) in previous {
            let removed = attributes.remove_modifier(&key, &modifier);
            debug_assert!(removed, "buff modifier on '{key}' was not registered");
        }
    }

    /// Unregister everything this instance registered
    pub fn remove_modifiers(&mut self, attributes: &mut AttributeSet) {
        for (key, modifier) in self.applied_modifiers.drain(..) {
            let removed = attributes.remove_modifier(&key, &modifier);
            debug_assert!(removed, "buff modifier on '{key}' was not registered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::buff::StackPolicy;
    use crate::modifier::ModifierKind;

    fn instance(definition: BuffDefinition) -> BuffInstance {
        BuffInstance::new(BuffHandle(1), Arc::new(definition), ModifierSource::Unattributed)
    }

    fn attributes() -> AttributeSet {
        AttributeSet::from_attributes("test", [Attribute::new("armour", 100.0), Attribute::new("speed", 5.0)])
    }

    #[test]
    fn test_timer_expiry() {
        let mut buff = instance(BuffDefinition::new("haste", 5.0));
        assert!(!buff.update(2.0));
        assert!((buff.remaining_duration() - 3.0).abs() < 1e-9);
        assert!(!buff.is_expired());

        assert!(!buff.update(4.0));
        assert!(buff.is_expired());
    }

    #[test]
    fn test_expiry_beats_tick() {
        let mut buff = instance(BuffDefinition::new("burn", 1.0).with_tick(1.0, 5.0));
        assert!(!buff.update(1.0));
        assert!(buff.is_expired());
    }

    #[test]
    fn test_tick_keeps_overshoot() {
        let mut buff = instance(BuffDefinition::new("regen", 10.0).with_tick(1.0, -2.0));

        assert!(!buff.update(0.7));
        assert!(buff.update(0.5));
        // 1.0 - 1.2 + 1.0
        assert!((buff.next_tick_countdown() - 0.8).abs() < 1e-9);
        assert!(buff.update(0.8));
    }

    #[test]
    fn test_expired_instance_is_inert() {
        let mut buff = instance(BuffDefinition::new("regen", 10.0).with_tick(0.5, -2.0));
        buff.expire();
        assert!(!buff.update(1.0));
        assert!((buff.remaining_duration() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_permanent_never_expires() {
        let mut buff = instance(BuffDefinition::new("aura", 0.0).with_tick(1.0, 1.0));
        let mut ticks = 0;
        for _ in 0..100 {
            if buff.update(0.5) {
                ticks += 1;
            }
        }
        assert!(!buff.is_expired());
        assert_eq!(ticks, 50);
    }

    #[test]
    fn test_on_hit_only_policy_ignores_timer() {
        let mut buff = instance(BuffDefinition::new("sleep", 1.0).with_removal(RemovalPolicy::ON_HIT));
        buff.update(5.0);
        assert!(!buff.is_expired());

        buff.on_take_damage();
        assert!(buff.is_expired());
    }

    #[test]
    fn test_on_take_damage_without_policy() {
        let mut buff = instance(BuffDefinition::new("haste", 5.0));
        buff.on_take_damage();
        assert!(!buff.is_expired());
    }

    #[test]
    fn test_stacks() {
        let mut buff = instance(BuffDefinition::new("fury", 5.0).with_stacking(StackPolicy::StackAndRefresh, 3));
        assert!(buff.add_stack());
        assert!(buff.add_stack());
        assert!(!buff.add_stack());
        assert_eq!(buff.stacks(), 3);

        assert!(!buff.remove_stack());
        assert!(!buff.remove_stack());
        assert!(buff.remove_stack());
        assert!(buff.is_expired());
    }

    #[test]
    fn test_non_stackable_add_stack() {
        let mut buff = instance(BuffDefinition::new("haste", 5.0));
        assert!(!buff.add_stack());
        assert_eq!(buff.stacks(), 1);
    }

    #[test]
    fn test_refresh_and_add_duration() {
        let mut buff = instance(BuffDefinition::new("shield", 10.0));
        buff.update(6.0);
        buff.refresh_duration();
        assert!((buff.remaining_duration() - 10.0).abs() < f64::EPSILON);

        buff.add_duration(10.0);
        assert!((buff.remaining_duration() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_consume_use() {
        let mut buff = instance(BuffDefinition::new("riposte", 10.0).with_uses(2));
        assert!(!buff.consume_use());
        assert_eq!(buff.remaining_uses(), 1);
        assert!(buff.consume_use());
        assert!(buff.is_expired());

        let mut plain = instance(BuffDefinition::new("haste", 5.0));
        assert!(!plain.consume_use());
        assert!(!plain.is_expired());
    }

    #[test]
    fn test_apply_modifiers_scales_and_replaces() {
        let mut set = attributes();
        let mut buff = instance(
            BuffDefinition::new("fortify", 5.0)
                .with_stacking(StackPolicy::StackAndRefresh, 5)
                .with_modifier("armour", ModifierKind::Flat, 10.0)
                .with_modifier("speed", ModifierKind::PercentAdd, 0.1),
        );

        buff.apply_modifiers(&mut set);
        assert!((set.value("armour") - 110.0).abs() < 1e-9);

        buff.add_stack();
        buff.add_stack();
        buff.apply_modifiers(&mut set);
        assert!((set.value("armour") - 130.0).abs() < 1e-9);
        assert!((set.value("speed") - 6.5).abs() < 1e-9);
        assert_eq!(set.attribute("armour").unwrap().modifiers().len(), 1);

        buff.remove_modifiers(&mut set);
        assert!(buff.applied_modifiers().is_empty());
        assert!((set.value("armour") - 100.0).abs() < 1e-9);
        assert!((set.value("speed") - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_modifiers_skips_unknown_attribute() {
        let mut set = attributes();
        let mut buff = instance(
            BuffDefinition::new("odd", 5.0)
                .with_modifier("luck", ModifierKind::Flat, 1.0)
                .with_modifier("armour", ModifierKind::Flat, 1.0),
        );
        buff.apply_modifiers(&mut set);
        assert_eq!(buff.applied_modifiers().len(), 1);
        assert_eq!(buff.applied_modifiers()[0].0, "armour");
    }
}
