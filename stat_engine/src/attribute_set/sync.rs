//! Sync snapshots - Plain base/current data for save files and replication

use super::AttributeSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Replicated state of one attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncEntry {
    pub base_value: f64,
    /// Current value for resources; the derived value for plain attributes
    pub current_value: f64,
}

/// `attribute id -> SyncEntry` for every sync-flagged attribute
pub type SyncSnapshot = BTreeMap<String, SyncEntry>;

impl AttributeSet {
    /// Capture base and current values of every sync-flagged attribute
    pub fn sync_snapshot(&self) -> SyncSnapshot {
        self.attributes
            .iter()
            .filter(|a| a.network_sync())
            .map(|a| {
                let current_value = if a.is_resource() { a.current() } else { a.value() };
                (
                    a.id().to_string(),
                    SyncEntry {
                        base_value: a.base_value(),
                        current_value,
                    },
                )
            })
            .collect()
    }

    /// Write authoritative base (and resource current) values directly
    ///
    /// Modifiers are left untouched. Entries for unknown or non-synced
    /// attributes are skipped with a warning. Returns how many entries were
    /// applied.
    pub fn apply_sync_snapshot(&mut self, snapshot: &SyncSnapshot) -> usize {
        let mut applied = 0;
        for (key, entry) in snapshot {
            let Some(&index) = self.index.get(key.as_str()) else {
                warn!(attribute = %key, "sync snapshot references unknown attribute");
                continue;
            };
            let attribute = &mut self.attributes[index];
            if !attribute.network_sync() {
                warn!(attribute = %key, "sync snapshot entry for non-synced attribute ignored");
                continue;
            }

            attribute.set_base_value(entry.base_value);
            if attribute.is_resource() {
                attribute.set_current_direct(entry.current_value);
            }
            self.events.append(attribute.events_mut());
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;
    use crate::modifier::Modifier;

    fn synced_set() -> AttributeSet {
        AttributeSet::from_attributes(
            "hero",
            [
                Attribute::resource("health", 100.0).with_network_sync(true),
                Attribute::new("strength", 12.0).with_network_sync(true),
                Attribute::new("hidden_luck", 3.0),
            ],
        )
    }

    #[test]
    fn test_snapshot_contains_only_synced() {
        let mut set = synced_set();
        set.reduce_resource("health", 25.0);

        let snapshot = set.sync_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains_key("hidden_luck"));
        assert_eq!(
            snapshot["health"],
            SyncEntry {
                base_value: 100.0,
                current_value: 75.0
            }
        );
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let mut set = synced_set();
        set.add_modifier("health", Modifier::flat(50.0));
        set.reduce_resource("health", 40.0);
        set.add_modifier("strength", Modifier::percent_add(0.5));

        let before = set.sync_snapshot();
        set.drain_events();
        assert_eq!(set.apply_sync_snapshot(&before), 2);

        assert_eq!(set.sync_snapshot(), before);
        assert!(set.drain_events().is_empty());
    }

    #[test]
    fn test_apply_to_fresh_set() {
        let mut source = synced_set();
        source.set_base_value("strength", 20.0);
        source.reduce_resource("health", 60.0);
        let snapshot = source.sync_snapshot();

        let mut replica = synced_set();
        replica.apply_sync_snapshot(&snapshot);

        assert!((replica.value("strength") - 20.0).abs() < f64::EPSILON);
        assert!((replica.current("health") - 40.0).abs() < f64::EPSILON);
        assert_eq!(replica.sync_snapshot(), snapshot);
    }

    #[test]
    fn test_unknown_and_unsynced_entries_skipped() {
        let mut set = synced_set();
        let mut snapshot = SyncSnapshot::new();
        snapshot.insert(
            "hidden_luck".to_string(),
            SyncEntry {
                base_value: 99.0,
                current_value: 99.0,
            },
        );
        snapshot.insert(
            "nonexistent".to_string(),
            SyncEntry {
                base_value: 1.0,
                current_value: 1.0,
            },
        );

        assert_eq!(set.apply_sync_snapshot(&snapshot), 0);
        assert!((set.value("hidden_luck") - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let set = synced_set();
        let json = serde_json::to_value(set.sync_snapshot()).unwrap();
        assert_eq!(json["strength"]["base_value"], 12.0);
        assert_eq!(json["health"]["current_value"], 100.0);
    }
}
