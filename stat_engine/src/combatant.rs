//! Combatant - An entity hosting an attribute set and a buff engine
//!
//! This is the host side of the buff contract: ticks raised by the engine are
//! routed through the same damage pipeline as direct hits, so invulnerability
//! and on-hit removal apply to both uniformly.

use crate::attribute_set::AttributeSet;
use crate::buff::{BuffDefinition, BuffEngine};
use crate::events::{BuffTick, StatEvent};
use crate::types::{BuffHandle, EntityId, ModifierSource, StatusFlags};
use std::sync::Arc;
use tracing::debug;

/// Attribute key used for health unless overridden
pub const DEFAULT_HEALTH_KEY: &str = "health";

#[derive(Debug)]
pub struct Combatant {
    pub id: EntityId,
    pub name: String,
    attributes: AttributeSet,
    buffs: BuffEngine,
    health_key: String,
    /// Reused between updates
    pending_ticks: Vec<BuffTick>,
}

impl Combatant {
    pub fn new(id: EntityId, name: impl Into<String>, attributes: AttributeSet) -> Self {
        Combatant {
            id,
            name: name.into(),
            attributes,
            buffs: BuffEngine::new(),
            health_key: DEFAULT_HEALTH_KEY.to_string(),
            pending_ticks: Vec::new(),
        }
    }

    /// Use a different resource attribute as health
    pub fn with_health_key(mut self, key: impl Into<String>) -> Self {
        self.health_key = key.into();
        self
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Direct access for equipment and other non-buff modifier sources
    pub fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }

    pub fn buffs(&self) -> &BuffEngine {
        &self.buffs
    }

    pub fn status(&self) -> StatusFlags {
        self.buffs.active_status_effects()
    }

    pub fn health(&self) -> f64 {
        self.attributes.current(&self.health_key)
    }

    pub fn max_health(&self) -> f64 {
        self.attributes.max(&self.health_key)
    }

    pub fn is_alive(&self) -> bool {
        !self.attributes.is_depleted(&self.health_key)
    }

    /// Apply damage; returns the amount actually removed from health
    pub fn take_damage(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        if self.status().is_invulnerable() {
            debug!(entity = %self.id, amount, "damage ignored (invulnerable)");
            return 0.0;
        }

        let dealt = self.attributes.reduce_resource(&self.health_key, amount);
        // On-hit buffs only break on a hit that landed
        if dealt > 0.0 {
            self.buffs.notify_damage_taken(&mut self.attributes);
        }
        dealt
    }

    /// Restore health; returns the amount actually restored
    pub fn heal(&mut self, amount: f64) -> f64 {
        self.attributes.restore_resource(&self.health_key, amount)
    }

    pub fn apply_buff(&mut self, definition: &Arc<BuffDefinition>, source: impl Into<ModifierSource>) -> Option<BuffHandle> {
        self.buffs.apply_buff(definition, source.into(), &mut self.attributes)
    }

    pub fn remove_buff(&mut self, id: &str) -> bool {
        self.buffs.remove_buff(id, &mut self.attributes)
    }

    pub fn remove_buffs_from_source(&mut self, source: impl Into<ModifierSource>) -> usize {
        self.buffs.remove_buffs_from_source(source.into(), &mut self.attributes)
    }

    pub fn dispel_debuffs(&mut self, max_count: usize) -> usize {
        self.buffs.dispel_debuffs(max_count, &mut self.attributes)
    }

    pub fn purge_buffs(&mut self, max_count: usize) -> usize {
        self.buffs.purge_buffs(max_count, &mut self.attributes)
    }

    pub fn consume_use(&mut self, id: &str) -> bool {
        self.buffs.consume_use(id, &mut self.attributes)
    }

    /// Advance buffs by `dt` seconds and resolve their ticks
    pub fn update(&mut self, dt: f64) {
        let mut ticks = std::mem::take(&mut self.pending_ticks);
        self.buffs.update(dt, &mut self.attributes, &mut ticks);

        for tick in ticks.drain(..) {
            if tick.is_damage() {
                self.take_damage(tick.delta);
            } else if tick.is_heal() {
                self.heal(-tick.delta);
            }
        }
        self.pending_ticks = ticks;
    }

    /// Buff events followed by attribute events, each in the order raised
    pub fn drain_events(&mut self) -> Vec<StatEvent> {
        let mut events = self.buffs.drain_events();
        events.extend(self.attributes.drain_events());
        events
    }
}
