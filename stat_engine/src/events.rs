//! Change notifications raised by attributes and the buff engine
//!
//! Producers push [`StatEvent`]s into an [`EventQueue`]. The host drains the
//! queue once per operation or frame and hands the snapshot to an
//! [`EventBus`], so listeners never observe a collection mid-mutation.

use crate::types::{BuffHandle, ModifierSource, StatusFlags};
use serde::{Deserialize, Serialize};

/// A single notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatEvent {
    /// Base value or modifier set changed; the derived value must be re-read
    ValueChanged { attribute: String },
    /// Current value of a resource attribute changed
    ResourceChanged { attribute: String, old: f64, new: f64 },
    /// A resource attribute transitioned into `current <= 0`
    ResourceDepleted { attribute: String },
    BuffApplied {
        buff_id: String,
        handle: BuffHandle,
        source: ModifierSource,
    },
    /// Stack count or timer of an existing instance changed by reapplication
    BuffRefreshed {
        buff_id: String,
        handle: BuffHandle,
        stacks: u32,
        remaining: f64,
    },
    BuffRemoved { buff_id: String, handle: BuffHandle },
    /// Periodic tick; positive delta is damage, negative is healing
    BuffTicked {
        buff_id: String,
        handle: BuffHandle,
        delta: f64,
    },
    StatusEffectsChanged { old: StatusFlags, new: StatusFlags },
}

/// Ordered outbox of pending events
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<StatEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: StatEvent) {
        self.events.push(event);
    }

    /// Move every event from `other` to the back of this queue
    pub fn append(&mut self, other: &mut EventQueue) {
        self.events.append(&mut other.events);
    }

    /// Take all pending events, oldest first
    pub fn drain(&mut self) -> Vec<StatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Return value of a listener: stay registered or drop out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Keep,
    Cancel,
}

/// Identifies a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&StatEvent) -> Subscription>;

/// Listener registry for drained event snapshots
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, returning its id for later removal
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StatEvent) -> Subscription + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Deliver each event to every listener in registration order
    ///
    /// A listener returning [`Subscription::Cancel`] receives no further
    /// events, including the remaining events of this batch.
    pub fn dispatch(&mut self, events: &[StatEvent]) {
        for event in events {
            self.listeners
                .retain_mut(|(_, listener)| listener(event) == Subscription::Keep);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// One periodic tick produced by a buff during an engine update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffTick {
    pub buff_id: String,
    pub handle: BuffHandle,
    /// Whoever applied the buff
    pub source: ModifierSource,
    /// Positive = damage, negative = healing
    pub delta: f64,
}

impl BuffTick {
    pub fn is_damage(&self) -> bool {
        self.delta > 0.0
    }

    pub fn is_heal(&self) -> bool {
        self.delta < 0.0
    }
}

/// Receiver for tick deltas; the host routes them through its own damage
/// and healing pipeline
pub trait TickSink {
    fn on_tick(&mut self, tick: BuffTick);
}

impl TickSink for Vec<BuffTick> {
    fn on_tick(&mut self, tick: BuffTick) {
        self.push(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn value_changed(name: &str) -> StatEvent {
        StatEvent::ValueChanged {
            attribute: name.to_string(),
        }
    }

    #[test]
    fn test_queue_drain_is_ordered() {
        let mut queue = EventQueue::new();
        queue.push(value_changed("a"));
        queue.push(value_changed("b"));

        let drained = queue.drain();
        assert_eq!(drained, vec![value_changed("a"), value_changed("b")]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_bus_delivers_and_unsubscribes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let sink = Rc::clone(&seen);
        let id = bus.subscribe(move |event| {
            sink.borrow_mut().push(event.clone());
            Subscription::Keep
        });

        bus.dispatch(&[value_changed("health")]);
        assert_eq!(seen.borrow().len(), 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.dispatch(&[value_changed("health")]);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_listener_can_cancel_during_dispatch() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();

        let counter = Rc::clone(&count);
        bus.subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Subscription::Cancel
        });
        let other = Rc::new(RefCell::new(0));
        let other_counter = Rc::clone(&other);
        bus.subscribe(move |_| {
            *other_counter.borrow_mut() += 1;
            Subscription::Keep
        });

        bus.dispatch(&[value_changed("a"), value_changed("b"), value_changed("c")]);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(*other.borrow(), 3);
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_vec_tick_sink_collects() {
        let mut ticks: Vec<BuffTick> = Vec::new();
        ticks.on_tick(BuffTick {
            buff_id: "burn".to_string(),
            handle: BuffHandle(1),
            source: ModifierSource::Unattributed,
            delta: 4.0,
        });
        assert_eq!(ticks.len(), 1);
        assert!(ticks[0].is_damage());
    }
}
