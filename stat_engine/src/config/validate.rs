//! Content validation, run once at load time

use super::{ConfigError, ContentFile};
use crate::attribute::{AttributeDefinition, AttributeSetDefinition};
use crate::buff::{BuffDefinition, RemovalPolicy};
use std::collections::HashSet;
use tracing::warn;

pub(super) fn validate(file: &ContentFile) -> Result<(), ConfigError> {
    let mut attribute_ids = HashSet::new();
    for attribute in &file.attributes {
        validate_attribute(attribute)?;
        if !attribute_ids.insert(attribute.id.as_str()) {
            return Err(invalid(format!("duplicate attribute '{}'", attribute.id)));
        }
    }

    let mut set_ids = HashSet::new();
    for set in &file.attribute_sets {
        validate_attribute_set(set, &attribute_ids)?;
        if !set_ids.insert(set.id.as_str()) {
            return Err(invalid(format!("duplicate attribute set '{}'", set.id)));
        }
    }

    let mut buff_ids = HashSet::new();
    for buff in &file.buffs {
        validate_buff(buff, &attribute_ids)?;
        if !buff_ids.insert(buff.id.as_str()) {
            return Err(invalid(format!("duplicate buff '{}'", buff.id)));
        }
    }

    Ok(())
}

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}

fn check_id(kind: &str, id: &str) -> Result<(), ConfigError> {
    if id.trim().is_empty() {
        return Err(invalid(format!("{kind} with empty id")));
    }
    Ok(())
}

fn check_finite(owner: &str, field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(invalid(format!("'{owner}': {field} must be finite, got {value}")));
    }
    Ok(())
}

fn validate_attribute(attribute: &AttributeDefinition) -> Result<(), ConfigError> {
    check_id("attribute", &attribute.id)?;
    check_finite(&attribute.id, "default_value", attribute.default_value)?;
    check_finite(&attribute.id, "min", attribute.min)?;

    if let Some(max) = attribute.max {
        check_finite(&attribute.id, "max", max)?;
        if attribute.min > max {
            return Err(invalid(format!(
                "'{}': min {} exceeds max {}",
                attribute.id, attribute.min, max
            )));
        }
    }
    Ok(())
}

fn validate_attribute_set(set: &AttributeSetDefinition, attribute_ids: &HashSet<&str>) -> Result<(), ConfigError> {
    check_id("attribute set", &set.id)?;

    let mut seen = HashSet::new();
    for entry in &set.entries {
        if !attribute_ids.contains(entry.attribute.as_str()) {
            return Err(invalid(format!(
                "attribute set '{}' references unknown attribute '{}'",
                set.id, entry.attribute
            )));
        }
        if !seen.insert(entry.attribute.as_str()) {
            return Err(invalid(format!(
                "attribute set '{}' lists '{}' twice",
                set.id, entry.attribute
            )));
        }
        if let Some(value) = entry.default_value {
            check_finite(&set.id, "default_value", value)?;
        }
    }
    Ok(())
}

fn validate_buff(buff: &BuffDefinition, attribute_ids: &HashSet<&str>) -> Result<(), ConfigError> {
    check_id("buff", &buff.id)?;
    check_finite(&buff.id, "duration", buff.duration)?;

    if buff.max_stacks == 0 {
        return Err(invalid(format!("'{}': max_stacks must be at least 1", buff.id)));
    }
    if buff.removal.contains(RemovalPolicy::ON_USE_COUNT) && buff.max_uses == 0 {
        return Err(invalid(format!("'{}': ON_USE_COUNT removal needs max_uses > 0", buff.id)));
    }
    if buff.removal.is_empty() && !buff.is_permanent() {
        warn!(buff = %buff.id, "buff has a duration but no removal policy; it never expires");
    }

    if let Some(tick) = buff.tick {
        check_finite(&buff.id, "tick.magnitude", tick.magnitude)?;
        if !(tick.interval.is_finite() && tick.interval > 0.0) {
            return Err(invalid(format!(
                "'{}': tick.interval must be positive, got {}",
                buff.id, tick.interval
            )));
        }
    }

    for template in &buff.modifiers {
        check_finite(&buff.id, "magnitude_per_stack", template.magnitude_per_stack)?;
        // Sets without the attribute skip the modifier at runtime
        if !attribute_ids.contains(template.attribute.as_str()) {
            warn!(buff = %buff.id, attribute = %template.attribute, "buff modifies an undefined attribute");
        }
    }
    Ok(())
}
