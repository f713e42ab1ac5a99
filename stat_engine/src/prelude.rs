//! Prelude module for convenient imports
//!
//! ```rust
//! use stat_engine::prelude::*;
//! ```

// Attributes
pub use crate::attribute::{Attribute, AttributeDefinition, AttributeSetDefinition};
pub use crate::attribute_set::{AttributeSet, SyncSnapshot};
pub use crate::modifier::{Modifier, ModifierKind};

// Buffs
pub use crate::buff::{BuffCatalog, BuffDefinition, BuffEngine, StackPolicy};
pub use crate::combatant::Combatant;

// Events
pub use crate::events::{BuffTick, EventBus, StatEvent, Subscription, TickSink};

// Identity and flags
pub use crate::types::{BuffHandle, EntityId, ModifierSource, StatusFlags};

// Config
pub use crate::config::{ConfigError, Content};
