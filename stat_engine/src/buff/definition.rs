//! Buff definitions - Static configuration for buffs and debuffs

use crate::modifier::{Modifier, ModifierKind};
use crate::types::{ModifierSource, StatusFlags};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which events end a buff. Serialized as e.g. `"TIMER | ON_HIT"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RemovalPolicy: u8 {
        /// Expires when its duration runs out
        const TIMER        = 1 << 0;
        /// Expires when the owner takes damage
        const ON_HIT       = 1 << 1;
        /// Expires after `max_uses` consumptions
        const ON_USE_COUNT = 1 << 2;
    }
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        RemovalPolicy::TIMER
    }
}

/// What happens when a buff is applied while an instance is already active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackPolicy {
    /// Keep the existing instance untouched
    Ignore,
    /// Reset the existing timer to the full duration
    #[default]
    RefreshDuration,
    /// Extend the existing timer by a full duration
    AddDuration,
    /// Add a stack (up to max) and reset the timer
    StackAndRefresh,
    /// Run up to `max_stacks` separate instances, each with its own timer
    Independent,
}

/// Stat contribution of a buff, per stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierTemplate {
    pub attribute: String,
    pub kind: ModifierKind,
    pub magnitude_per_stack: f64,
    #[serde(default)]
    pub priority: i32,
}

impl ModifierTemplate {
    pub fn new(attribute: impl Into<String>, kind: ModifierKind, magnitude_per_stack: f64) -> Self {
        ModifierTemplate {
            attribute: attribute.into(),
            kind,
            magnitude_per_stack,
            priority: 0,
        }
    }

    /// Concrete modifier for the given stack count
    pub fn instantiate(&self, stacks: u32, source: ModifierSource) -> Modifier {
        Modifier::new(self.kind, self.magnitude_per_stack * stacks as f64, source).with_priority(self.priority)
    }
}

/// Periodic damage (positive) or healing (negative)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Seconds between ticks
    pub interval: f64,
    /// Delta per stack per tick
    pub magnitude: f64,
}

/// Static description of a buff or debuff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffDefinition {
    /// Unique identifier (e.g. "poison", "battle_shout")
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Seconds; 0 or less means permanent
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub removal: RemovalPolicy,
    /// Uses before expiry under [`RemovalPolicy::ON_USE_COUNT`]
    #[serde(default)]
    pub max_uses: u32,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    #[serde(default)]
    pub stack_policy: StackPolicy,
    #[serde(default)]
    pub modifiers: Vec<ModifierTemplate>,
    #[serde(default)]
    pub status_flags: StatusFlags,
    #[serde(default)]
    pub tick: Option<TickConfig>,
    #[serde(default)]
    pub dispellable: bool,
    #[serde(default)]
    pub is_debuff: bool,
}

fn default_max_stacks() -> u32 {
    1
}

impl BuffDefinition {
    /// Timed, non-stacking buff with no effects yet
    pub fn new(id: impl Into<String>, duration: f64) -> Self {
        let id = id.into();
        BuffDefinition {
            name: id.clone(),
            id,
            duration,
            removal: RemovalPolicy::TIMER,
            max_uses: 0,
            stackable: false,
            max_stacks: 1,
            stack_policy: StackPolicy::RefreshDuration,
            modifiers: Vec::new(),
            status_flags: StatusFlags::empty(),
            tick: None,
            dispellable: false,
            is_debuff: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_modifier(mut self, attribute: impl Into<String>, kind: ModifierKind, magnitude_per_stack: f64) -> Self {
        self.modifiers.push(ModifierTemplate::new(attribute, kind, magnitude_per_stack));
        self
    }

    pub fn with_status(mut self, flags: StatusFlags) -> Self {
        self.status_flags |= flags;
        self
    }

    pub fn with_tick(mut self, interval: f64, magnitude: f64) -> Self {
        self.tick = Some(TickConfig { interval, magnitude });
        self
    }

    /// Set the stacking policy; `max_stacks > 1` also marks it stackable
    pub fn with_stacking(mut self, policy: StackPolicy, max_stacks: u32) -> Self {
        self.stack_policy = policy;
        self.max_stacks = max_stacks.max(1);
        self.stackable = self.max_stacks > 1;
        self
    }

    pub fn with_removal(mut self, removal: RemovalPolicy) -> Self {
        self.removal = removal;
        self
    }

    /// Expire after `uses` consumptions (adds [`RemovalPolicy::ON_USE_COUNT`])
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.removal |= RemovalPolicy::ON_USE_COUNT;
        self.max_uses = uses;
        self
    }

    pub fn debuff(mut self) -> Self {
        self.is_debuff = true;
        self
    }

    pub fn dispellable(mut self) -> Self {
        self.dispellable = true;
        self
    }

    /// Whether the buff never runs out on its own
    pub fn is_permanent(&self) -> bool {
        self.duration <= 0.0
    }

    pub fn has_tick(&self) -> bool {
        self.tick.is_some()
    }
}
