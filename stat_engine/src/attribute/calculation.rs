//! ValueBreakdown - The three-bucket modifier math (Flat → PercentAdd → PercentMult)

use crate::modifier::{Modifier, ModifierKind};
use serde::{Deserialize, Serialize};

/// Summed modifier buckets for one attribute
///
/// Final value is calculated as:
/// `(base + flat) × (1 + percent_add) × percent_mult`
///
/// - `base`: The attribute's base value
/// - `flat`: Sum of all flat modifiers
/// - `percent_add`: Sum of all additive percentages (as decimal, 0.30 = +30%)
/// - `percent_mult`: Product of all multiplicative magnitudes (1.0 when empty)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueBreakdown {
    pub base: f64,
    pub flat: f64,
    pub percent_add: f64,
    pub percent_mult: f64,
}

impl Default for ValueBreakdown {
    fn default() -> Self {
        Self::with_base(0.0)
    }
}

impl ValueBreakdown {
    /// A breakdown with no modifiers applied
    pub fn with_base(base: f64) -> Self {
        ValueBreakdown {
            base,
            flat: 0.0,
            percent_add: 0.0,
            percent_mult: 1.0,
        }
    }

    /// Fold modifiers into their buckets
    ///
    /// Each bucket is visited in ascending priority order; equal priorities
    /// keep insertion order. For pure sums and products the order does not
    /// change the result, but it is kept deterministic.
    pub fn from_modifiers(base: f64, modifiers: &[Modifier]) -> Self {
        let mut breakdown = Self::with_base(base);

        for kind in [ModifierKind::Flat, ModifierKind::PercentAdd, ModifierKind::PercentMult] {
            let mut group: Vec<&Modifier> = modifiers.iter().filter(|m| m.kind() == kind).collect();
            // sort_by_key is stable
            group.sort_by_key(|m| m.priority());

            for modifier in group {
                breakdown.add(modifier.kind(), modifier.magnitude());
            }
        }

        breakdown
    }

    /// Add a single magnitude to the matching bucket
    pub fn add(&mut self, kind: ModifierKind, magnitude: f64) {
        match kind {
            ModifierKind::Flat => self.flat += magnitude,
            ModifierKind::PercentAdd => self.percent_add += magnitude,
            ModifierKind::PercentMult => self.percent_mult *= magnitude,
        }
    }

    /// Unclamped value: (base + flat) × (1 + percent_add) × percent_mult
    pub fn compute(&self) -> f64 {
        self.total_flat() * self.total_percent_add_multiplier() * self.percent_mult
    }

    /// Base plus flat additions
    pub fn total_flat(&self) -> f64 {
        self.base + self.flat
    }

    /// 1 + sum of additive percentages
    pub fn total_percent_add_multiplier(&self) -> f64 {
        1.0 + self.percent_add
    }
}

/// Clamp to `[min, max]`, or only to `min` when there is no upper bound
pub fn clamp_to_bounds(value: f64, min: f64, max: Option<f64>) -> f64 {
    let lower = value.max(min);
    match max {
        Some(max) => lower.min(max),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_basic() {
        let breakdown = ValueBreakdown::with_base(100.0);
        assert!((breakdown.compute() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compute_full_formula() {
        // (100 + 20) × (1 + 0.3 + 0.2) × 1.2 = 216
        let modifiers = [
            Modifier::flat(20.0),
            Modifier::percent_add(0.3),
            Modifier::percent_add(0.2),
            Modifier::percent_mult(1.2),
        ];
        let breakdown = ValueBreakdown::from_modifiers(100.0, &modifiers);

        assert!((breakdown.flat - 20.0).abs() < f64::EPSILON);
        assert!((breakdown.percent_add - 0.5).abs() < 1e-12);
        assert!((breakdown.percent_mult - 1.2).abs() < 1e-12);
        assert!((breakdown.compute() - 216.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_add_stacks_additively() {
        let modifiers = [Modifier::percent_add(0.2), Modifier::percent_add(0.3)];
        // 100 × 1.5 = 150, not 100 × 1.2 × 1.3 = 156
        let value = ValueBreakdown::from_modifiers(100.0, &modifiers).compute();
        assert!((value - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_mult_stacks_multiplicatively() {
        let modifiers = [Modifier::percent_mult(1.2), Modifier::percent_mult(1.3)];
        let value = ValueBreakdown::from_modifiers(100.0, &modifiers).compute();
        assert!((value - 156.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_applies_before_percentages() {
        // (10 + 10) × 2 = 40, not 10 × 2 + 10 = 30
        let modifiers = [Modifier::percent_add(1.0), Modifier::flat(10.0)];
        let value = ValueBreakdown::from_modifiers(10.0, &modifiers).compute();
        assert!((value - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_priority_does_not_change_result() {
        let forward = [
            Modifier::percent_mult(1.5).with_priority(2),
            Modifier::percent_mult(0.5).with_priority(1),
        ];
        let reverse = [forward[1], forward[0]];
        let a = ValueBreakdown::from_modifiers(80.0, &forward).compute();
        let b = ValueBreakdown::from_modifiers(80.0, &reverse).compute();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_to_bounds() {
        assert!((clamp_to_bounds(-5.0, 0.0, None) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_to_bounds(1e9, 0.0, None) - 1e9).abs() < f64::EPSILON);
        assert!((clamp_to_bounds(150.0, 0.0, Some(100.0)) - 100.0).abs() < f64::EPSILON);
        assert!((clamp_to_bounds(50.0, 0.0, Some(100.0)) - 50.0).abs() < f64::EPSILON);
    }
}
