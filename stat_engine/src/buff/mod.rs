//! Buffs and debuffs - Timed modifier bundles with stacking and ticks

mod definition;
mod engine;
mod instance;

pub use definition::{BuffDefinition, ModifierTemplate, RemovalPolicy, StackPolicy, TickConfig};
pub use engine::{ActiveBuffView, BuffEngine};
pub use instance::BuffInstance;

use std::collections::HashMap;
use std::sync::Arc;

/// Buff definition registry, shared read-only by every engine
#[derive(Debug, Clone, Default)]
pub struct BuffCatalog {
    definitions: HashMap<String, Arc<BuffDefinition>>,
}

impl BuffCatalog {
    pub fn new() -> Self {
        BuffCatalog {
            definitions: HashMap::new(),
        }
    }

    /// Register a definition, returning any previous one with the same id
    pub fn register(&mut self, definition: BuffDefinition) -> Option<Arc<BuffDefinition>> {
        self.definitions.insert(definition.id.clone(), Arc::new(definition))
    }

    /// Get a definition by ID
    pub fn get(&self, id: &str) -> Option<&Arc<BuffDefinition>> {
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

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BuffDefinition>> {
        self.definitions.values()
    }
}

impl FromIterator<BuffDefinition> for BuffCatalog {
    fn from_iter<I: IntoIterator<Item = BuffDefinition>>(iter: I) -> Self {
        let mut catalog = BuffCatalog::new();
        for definition in iter {
            catalog.register(definition);
        }
        catalog
    }
}
