//! BuffEngine - Owns every buff instance on one entity

use super::definition::{BuffDefinition, StackPolicy};
use super::instance::BuffInstance;
use crate::attribute_set::AttributeSet;
use crate::events::{BuffTick, EventQueue, StatEvent, TickSink};
use crate::types::{BuffHandle, ModifierSource, StatusFlags};
use serde::Serialize;
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Read-only summary of an active buff, for HUD collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveBuffView {
    pub id: String,
    pub name: String,
    pub handle: BuffHandle,
    pub stacks: u32,
    /// Seconds left; `None` for permanent buffs
    pub remaining: Option<f64>,
    pub is_debuff: bool,
}

/// Active buffs of one entity
///
/// Instances are kept in insertion order; every per-definition list holds
/// the handles of that definition's instances in the same order. Removal
/// operations unregister modifiers from the attribute set immediately.
#[derive(Debug, Default)]
pub struct BuffEngine {
    instances: Vec<BuffInstance>,
    by_definition: HashMap<String, Vec<BuffHandle>>,
    status_cache: Cell<StatusFlags>,
    status_dirty: Cell<bool>,
    /// Flags last reported through `StatusEffectsChanged`
    published_flags: StatusFlags,
    next_handle: u64,
    events: EventQueue,
}

impl BuffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Active instances, oldest first
    pub fn instances(&self) -> &[BuffInstance] {
        &self.instances
    }

    pub fn instance(&self, handle: BuffHandle) -> Option<&BuffInstance> {
        self.instances.iter().find(|i| i.handle() == handle)
    }

    pub fn has_buff(&self, id: &str) -> bool {
        self.by_definition.contains_key(id)
    }

    /// Total stacks across every instance of `id`
    pub fn stack_count(&self, id: &str) -> u32 {
        self.instances
            .iter()
            .filter(|i| i.definition_id() == id)
            .map(|i| i.stacks())
            .sum()
    }

    pub fn active_buffs(&self) -> Vec<ActiveBuffView> {
        self.instances
            .iter()
            .filter(|i| !i.is_expired())
            .map(|i| ActiveBuffView {
                id: i.definition_id().to_string(),
                name: i.definition().name.clone(),
                handle: i.handle(),
                stacks: i.stacks(),
                remaining: (!i.is_permanent()).then_some(i.remaining_duration()),
                is_debuff: i.definition().is_debuff,
            })
            .collect()
    }

    /// OR of the status flags of every active instance
    pub fn active_status_effects(&self) -> StatusFlags {
        if self.status_dirty.get() {
            let flags = self
                .instances
                .iter()
                .filter(|i| !i.is_expired())
                .fold(StatusFlags::empty(), |acc, i| acc | i.status_flags());
            self.status_cache.set(flags);
            self.status_dirty.set(false);
        }
        self.status_cache.get()
    }

    // === Application ===

    /// Apply a buff from `source`
    ///
    /// Returns `None` only when the entity is immune and the buff is a
    /// debuff. Reapplying a definition that already has an instance follows
    /// its [`StackPolicy`]; the returned handle is the instance affected.
    pub fn apply_buff(
        &mut self,
        definition: &Arc<BuffDefinition>,
        source: ModifierSource,
        attributes: &mut AttributeSet,
    ) -> Option<BuffHandle> {
        if definition.is_debuff && self.active_status_effects().is_immune() {
            debug!(buff = %definition.id, "debuff rejected by immunity");
            return None;
        }

        let handles = self.by_definition.get(&definition.id).cloned().unwrap_or_default();
        let handle = match (handles.first(), handles.last()) {
            (Some(&oldest), Some(&latest)) => self.reapply(definition, source, oldest, latest, handles.len(), attributes),
            _ => self.spawn(definition, source, attributes),
        };

        self.publish_status_change();
        self.check_invariants(attributes);
        Some(handle)
    }

    fn reapply(
        &mut self,
        definition: &Arc<BuffDefinition>,
        source: ModifierSource,
        oldest: BuffHandle,
        latest: BuffHandle,
        count: usize,
        attributes: &mut AttributeSet,
    ) -> BuffHandle {
        match definition.stack_policy {
            StackPolicy::Ignore => latest,
            StackPolicy::RefreshDuration => {
                self.modify(latest, |instance| instance.refresh_duration());
                latest
            }
            StackPolicy::AddDuration => {
                self.modify(latest, |instance| instance.add_duration(definition.duration));
                latest
            }
            StackPolicy::StackAndRefresh => {
                self.modify(latest, |instance| {
                    if instance.add_stack() {
                        instance.apply_modifiers(attributes);
                    }
                    instance.refresh_duration();
                });
                latest
            }
            StackPolicy::Independent => {
                if count < definition.max_stacks as usize {
                    self.spawn(definition, source, attributes)
                } else {
                    self.modify(oldest, |instance| instance.refresh_duration());
                    oldest
                }
            }
        }
    }

    /// Run `f` on one instance, then report its new stacks and timer
    fn modify(&mut self, handle: BuffHandle, f: impl FnOnce(&mut BuffInstance)) {
        let Some(instance) = self.instances.iter_mut().find(|i| i.handle() == handle) else {
            return;
        };
        f(instance);
        debug!(
            buff = instance.definition_id(),
            handle = %handle,
            stacks = instance.stacks(),
            remaining = instance.remaining_duration(),
            "buff refreshed"
        );
        self.events.push(StatEvent::BuffRefreshed {
            buff_id: instance.definition_id().to_string(),
            handle,
            stacks: instance.stacks(),
            remaining: instance.remaining_duration(),
        });
    }

    fn spawn(&mut self, definition: &Arc<BuffDefinition>, source: ModifierSource, attributes: &mut AttributeSet) -> BuffHandle {
        self.next_handle += 1;
        let handle = BuffHandle(self.next_handle);

        let mut instance = BuffInstance::new(handle, Arc::clone(definition), source);
        instance.apply_modifiers(attributes);
        if !definition.status_flags.is_empty() {
            self.status_dirty.set(true);
        }

        self.by_definition.entry(definition.id.clone()).or_default().push(handle);
        self.instances.push(instance);

        debug!(buff = %definition.id, handle = %handle, ?source, "buff applied");
        self.events.push(StatEvent::BuffApplied {
            buff_id: definition.id.clone(),
            handle,
            source,
        });
        handle
    }

    // === Removal ===

    /// Remove the most recently applied instance of `id`
    pub fn remove_buff(&mut self, id: &str, attributes: &mut AttributeSet) -> bool {
        let Some(handle) = self.latest(id) else {
            return false;
        };
        self.expire_where(attributes, |i| i.handle() == handle) == 1
    }

    /// Remove every instance of `id`
    pub fn remove_all_stacks(&mut self, id: &str, attributes: &mut AttributeSet) -> usize {
        self.expire_where(attributes, |i| i.definition_id() == id)
    }

    /// Remove every instance applied by `source`
    pub fn remove_buffs_from_source(&mut self, source: ModifierSource, attributes: &mut AttributeSet) -> usize {
        self.expire_where(attributes, |i| i.source() == source)
    }

    /// Remove up to `max_count` dispellable debuffs, most recent first
    pub fn dispel_debuffs(&mut self, max_count: usize, attributes: &mut AttributeSet) -> usize {
        self.dispel(true, max_count, attributes)
    }

    /// Remove up to `max_count` dispellable beneficial buffs, most recent first
    pub fn purge_buffs(&mut self, max_count: usize, attributes: &mut AttributeSet) -> usize {
        self.dispel(false, max_count, attributes)
    }

    fn dispel(&mut self, debuffs: bool, max_count: usize, attributes: &mut AttributeSet) -> usize {
        let mut count = 0;
        for instance in self
            .instances
            .iter_mut()
            .rev()
            .filter(|i| !i.is_expired() && i.definition().dispellable && i.definition().is_debuff == debuffs)
            .take(max_count)
        {
            instance.expire();
            count += 1;
        }
        self.purge_expired(attributes);
        self.publish_status_change();
        count
    }

    /// Drop one stack from the latest instance of `id`; the instance is
    /// removed when its last stack goes
    pub fn remove_stack(&mut self, id: &str, attributes: &mut AttributeSet) -> bool {
        let Some(handle) = self.latest(id) else {
            return false;
        };
        let Some(instance) = self.instances.iter_mut().find(|i| i.handle() == handle) else {
            return false;
        };
        if !instance.remove_stack() {
            instance.apply_modifiers(attributes);
        }
        self.purge_expired(attributes);
        self.publish_status_change();
        true
    }

    /// Spend one use of the latest instance of `id`; true when it ran out
    pub fn consume_use(&mut self, id: &str, attributes: &mut AttributeSet) -> bool {
        let Some(handle) = self.latest(id) else {
            return false;
        };
        let depleted = self
            .instances
            .iter_mut()
            .find(|i| i.handle() == handle)
            .is_some_and(|i| i.consume_use());
        if depleted {
            self.purge_expired(attributes);
            self.publish_status_change();
        }
        depleted
    }

    /// Forward a damage notification to every instance (on-hit removal)
    pub fn notify_damage_taken(&mut self, attributes: &mut AttributeSet) {
        for instance in &mut self.instances {
            instance.on_take_damage();
        }
        self.purge_expired(attributes);
        self.publish_status_change();
    }

    /// Remove every instance
    pub fn clear(&mut self, attributes: &mut AttributeSet) -> usize {
        self.expire_where(attributes, |_| true)
    }

    fn expire_where(&mut self, attributes: &mut AttributeSet, predicate: impl Fn(&BuffInstance) -> bool) -> usize {
        let mut count = 0;
        for instance in self.instances.iter_mut().filter(|i| !i.is_expired() && predicate(i)) {
            instance.expire();
            count += 1;
        }
        self.purge_expired(attributes);
        self.publish_status_change();
        count
    }

    fn latest(&self, id: &str) -> Option<BuffHandle> {
        self.by_definition.get(id).and_then(|handles| handles.last().copied())
    }

    // === Time ===

    /// Advance every instance by `dt` seconds
    ///
    /// Ticks are reported to `sink` in insertion order; instances that
    /// expired during this call are removed afterwards.
    pub fn update(&mut self, dt: f64, attributes: &mut AttributeSet, sink: &mut dyn TickSink) {
        for instance in &mut self.instances {
            if !instance.update(dt) {
                continue;
            }
            let Some(delta) = instance.tick_delta() else {
                continue;
            };
            let tick = BuffTick {
                buff_id: instance.definition_id().to_string(),
                handle: instance.handle(),
                source: instance.source(),
                delta,
            };
            trace!(buff = %tick.buff_id, handle = %tick.handle, delta, "buff tick");
            self.events.push(StatEvent::BuffTicked {
                buff_id: tick.buff_id.clone(),
                handle: tick.handle,
                delta,
            });
            sink.on_tick(tick);
        }

        self.purge_expired(attributes);
        self.publish_status_change();
        self.check_invariants(attributes);
    }

    /// Physically remove every expired instance; returns how many went
    pub fn purge_expired(&mut self, attributes: &mut AttributeSet) -> usize {
        if !self.instances.iter().any(|i| i.is_expired()) {
            return 0;
        }

        let (expired, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.instances)
            .into_iter()
            .partition(|i| i.is_expired());
        self.instances = active;

        let count = expired.len();
        for mut instance in expired {
            instance.remove_modifiers(attributes);

            let id = instance.definition_id();
            if let Some(handles) = self.by_definition.get_mut(id) {
                handles.retain(|&h| h != instance.handle());
                if handles.is_empty() {
                    self.by_definition.remove(id);
                }
            }
            if !instance.status_flags().is_empty() {
                self.status_dirty.set(true);
            }

            debug!(buff = id, handle = %instance.handle(), "buff removed");
            self.events.push(StatEvent::BuffRemoved {
                buff_id: id.to_string(),
                handle: instance.handle(),
            });
        }
        count
    }

    /// Raise `StatusEffectsChanged` if the aggregate differs from the last report
    fn publish_status_change(&mut self) {
        let new = self.active_status_effects();
        if new != self.published_flags {
            let old = self.published_flags;
            self.published_flags = new;
            debug!(?old, ?new, "status effects changed");
            self.events.push(StatEvent::StatusEffectsChanged { old, new });
        }
    }

    fn check_invariants(&self, attributes: &AttributeSet) {
        debug_assert_eq!(
            self.by_definition.values().map(Vec::len).sum::<usize>(),
            self.instances.len(),
            "per-definition index out of sync with instances"
        );
        debug_assert!(
            self.instances.iter().all(|i| {
                i.applied_modifiers().iter().all(|(key, modifier)| {
                    attributes
                        .attribute(key)
                        .is_some_and(|a| a.modifiers().contains(modifier))
                })
            }),
            "buff modifier missing from attribute set"
        );
    }

    /// Take all notifications raised since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<StatEvent> {
        self.events.drain()
    }
}
