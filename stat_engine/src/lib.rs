//! stat_engine - Attribute, modifier and buff resolution for game entities
//!
//! This library provides:
//! - Attribute: Base value plus categorized modifiers, lazily resolved
//! - AttributeSet: All attributes of one entity, with sync snapshots
//! - BuffEngine: Timed buffs/debuffs with stacking, ticks and status flags
//! - Combatant: Host entity routing buff ticks through its damage pipeline
//! - Content: TOML definitions for attributes, attribute sets and buffs

pub mod attribute;
pub mod attribute_set;
pub mod buff;
pub mod combatant;
pub mod config;
pub mod events;
pub mod modifier;
pub mod prelude;
pub mod types;

// Re-export core types for convenience
pub use attribute::{Attribute, AttributeCatalog, AttributeDefinition, AttributeSetDefinition, AttributeShape, ValueBreakdown};
pub use attribute_set::{AttributeSet, SyncEntry, SyncSnapshot};
pub use buff::{ActiveBuffView, BuffCatalog, BuffDefinition, BuffEngine, BuffInstance, RemovalPolicy, StackPolicy};
pub use combatant::Combatant;
pub use config::{ConfigError, Content};
pub use events::{BuffTick, EventBus, EventQueue, StatEvent, Subscription, TickSink};
pub use modifier::{Modifier, ModifierKind};
pub use types::{BuffHandle, EntityId, ModifierSource, StatusFlags};
