//! Resource behavior (current/max) for attributes with the resource shape
//!
//! Every operation here is a no-op returning 0 / false on a plain attribute.

use super::{Attribute, AttributeShape};
use crate::events::StatEvent;

impl Attribute {
    /// Current value of a resource; 0 for plain attributes
    pub fn current(&self) -> f64 {
        match self.shape {
            AttributeShape::Resource { current } => current,
            AttributeShape::Plain => 0.0,
        }
    }

    /// Maximum of a resource (its derived value)
    pub fn max(&self) -> f64 {
        if self.is_resource() {
            self.value()
        } else {
            0.0
        }
    }

    /// `current / max` in `[0, 1]`; 0 when the maximum is not positive
    pub fn percent(&self) -> f64 {
        let max = self.max();
        if max <= 0.0 {
            return 0.0;
        }
        self.current() / max
    }

    /// Whether a resource has run out (`current <= 0`)
    pub fn is_depleted(&self) -> bool {
        self.is_resource() && self.current() <= 0.0
    }

    /// Subtract `amount` from the current value, never going below 0
    ///
    /// Returns the amount actually removed. Negative or non-finite amounts
    /// are ignored. Raises [`StatEvent::ResourceDepleted`] only on the call
    /// that takes the resource from above 0 to 0.
    pub fn reduce(&mut self, amount: f64) -> f64 {
        if !self.is_resource() || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let old = self.current();
        let new = (old - amount).max(0.0);
        let delta = old - new;
        self.write_current(new);
        if old > 0.0 && new <= 0.0 {
            self.events.push(StatEvent::ResourceDepleted {
                attribute: self.id.clone(),
            });
        }
        delta
    }

    /// Add `amount` to the current value, never going above the maximum
    ///
    /// Returns the amount actually restored.
    pub fn restore(&mut self, amount: f64) -> f64 {
        if !self.is_resource() || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let old = self.current();
        let new = (old + amount).min(self.value()).max(old);
        self.write_current(new);
        new - old
    }

    /// Set current to the maximum
    pub fn fill(&mut self) {
        if self.is_resource() {
            let max = self.value().max(0.0);
            self.write_current(max);
        }
    }

    /// Set current to 0
    pub fn deplete(&mut self) {
        if !self.is_resource() {
            return;
        }
        let old = self.current();
        self.write_current(0.0);
        if old > 0.0 {
            self.events.push(StatEvent::ResourceDepleted {
                attribute: self.id.clone(),
            });
        }
    }

    /// Overwrite the current value (clamped to `[0, max]`), for loading or
    /// replicating authoritative state
    pub fn set_current_direct(&mut self, value: f64) -> bool {
        if !self.is_resource() || value.is_nan() {
            return false;
        }
        let bounded = bound_current(value, self.value());
        self.write_current(bounded)
    }

    pub(super) fn resource_max(&self) -> Option<f64> {
        self.is_resource().then(|| self.value())
    }

    /// Keep the same fraction of the maximum after a modifier change
    pub(super) fn rescale_current(&mut self, old_max: f64) {
        let new_max = self.value();
        let current = self.current();
        let rescaled = if old_max > 0.0 {
            current * (new_max / old_max)
        } else {
            current.min(new_max)
        };
        self.write_current(bound_current(rescaled, new_max));
    }

    pub(super) fn clamp_current_to_max(&mut self) {
        if !self.is_resource() {
            return;
        }
        let max = self.value();
        if self.current() > max {
            self.write_current(bound_current(self.current(), max));
        }
    }

    /// Store a new current value, raising a change event if it differs
    fn write_current(&mut self, new: f64) -> bool {
        let AttributeShape::Resource { current } = &mut self.shape else {
            return false;
        };
        let old = *current;
        if old == new {
            return false;
        }
        *current = new;
        self.events.push(StatEvent::ResourceChanged {
            attribute: self.id.clone(),
            old,
            new,
        });
        true
    }
}

fn bound_current(value: f64, max: f64) -> f64 {
    value.min(max).max(0.0)
}
