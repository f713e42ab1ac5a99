//! Modifier - One contribution to an attribute's derived value

use crate::types::ModifierSource;
use serde::{Deserialize, Serialize};

/// How a modifier participates in the value formula
///
/// `(base + Σ flat) × (1 + Σ percent_add) × Π percent_mult`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Added to the base value
    Flat,
    /// Summed with other additive percentages (0.30 = +30%)
    PercentAdd,
    /// Multiplied into the result (1.20 = ×1.2)
    PercentMult,
}

/// An immutable modifier value
///
/// Equality compares every field, so two modifiers with the same kind,
/// magnitude, priority and source are interchangeable for removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    kind: ModifierKind,
    magnitude: f64,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    source: ModifierSource,
}

impl Modifier {
    pub fn new(kind: ModifierKind, magnitude: f64, source: ModifierSource) -> Self {
        debug_assert!(magnitude.is_finite(), "modifier magnitude must be finite");
        Modifier {
            kind,
            magnitude,
            priority: 0,
            source,
        }
    }

    /// Flat modifier with no particular source
    pub fn flat(magnitude: f64) -> Self {
        Self::new(ModifierKind::Flat, magnitude, ModifierSource::Unattributed)
    }

    /// Additive percentage modifier with no particular source
    pub fn percent_add(magnitude: f64) -> Self {
        Self::new(ModifierKind::PercentAdd, magnitude, ModifierSource::Unattributed)
    }

    /// Multiplicative modifier with no particular source
    pub fn percent_mult(magnitude: f64) -> Self {
        Self::new(ModifierKind::PercentMult, magnitude, ModifierSource::Unattributed)
    }

    /// Set the ordering priority (ascending within a kind)
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the source used for bulk removal
    pub fn with_source(mut self, source: impl Into<ModifierSource>) -> Self {
        self.source = source.into();
        self
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn source(&self) -> ModifierSource {
        self.source
    }
}
