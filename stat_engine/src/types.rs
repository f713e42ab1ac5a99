//! Core handle and flag types shared across the engine

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a simulated entity (player, monster, totem, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Handle to one live buff instance inside a [`BuffEngine`](crate::buff::BuffEngine)
///
/// Handles are never reused by the engine that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuffHandle(pub u64);

impl fmt::Display for BuffHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buff#{}", self.0)
    }
}

/// Opaque identity of whatever contributed a modifier or applied a buff
///
/// The engine only compares sources for equality (bulk removal); it never
/// follows a source back to the thing it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ModifierSource {
    /// No particular owner
    #[default]
    Unattributed,
    /// Another (or the same) entity, e.g. the caster of a buff
    Entity(EntityId),
    /// An equipment slot index on the owning entity
    Equipment(u32),
    /// A buff instance living in the owning entity's buff engine
    Buff(BuffHandle),
    /// Zones, weather, auras that belong to no entity
    Environment(u32),
}

impl From<EntityId> for ModifierSource {
    fn from(id: EntityId) -> Self {
        ModifierSource::Entity(id)
    }
}

impl From<BuffHandle> for ModifierSource {
    fn from(handle: BuffHandle) -> Self {
        ModifierSource::Buff(handle)
    }
}

bitflags! {
    /// Behavioral gates aggregated from all active buffs on an entity.
    ///
    /// Serialized in the `bitflags` text form, e.g. `"STUN | SLOW"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u32 {
        const STUN         = 1 << 0;
        const ROOT         = 1 << 1;
        const SILENCE      = 1 << 2;
        const SLOW         = 1 << 3;
        const DISARM       = 1 << 4;
        const FEAR         = 1 << 5;
        const SLEEP        = 1 << 6;
        const INVULNERABLE = 1 << 7;
        const IMMUNE       = 1 << 8;
        const INVISIBLE    = 1 << 9;
    }
}

impl StatusFlags {
    /// Flags that stop all voluntary actions
    pub const INCAPACITATED: StatusFlags = StatusFlags::STUN
        .union(StatusFlags::FEAR)
        .union(StatusFlags::SLEEP);

    /// Whether the entity may move under its own control
    pub fn can_move(self) -> bool {
        !self.intersects(Self::INCAPACITATED | StatusFlags::ROOT)
    }

    /// Whether the entity may act at all (attack, use items, cast)
    pub fn can_act(self) -> bool {
        !self.intersects(Self::INCAPACITATED)
    }

    /// Whether the entity may use weapon attacks
    pub fn can_attack(self) -> bool {
        self.can_act() && !self.contains(StatusFlags::DISARM)
    }

    /// Whether the entity may cast spells
    pub fn can_cast(self) -> bool {
        self.can_act() && !self.contains(StatusFlags::SILENCE)
    }

    /// Whether incoming damage should be ignored
    pub fn is_invulnerable(self) -> bool {
        self.contains(StatusFlags::INVULNERABLE)
    }

    /// Whether incoming debuffs should be rejected
    pub fn is_immune(self) -> bool {
        self.contains(StatusFlags::IMMUNE)
    }
}
