//! Change notification bus.
//!
//! A typed, synchronous publish/subscribe primitive. Every handler subscribed
//! to a topic runs before [`EventBus::publish`] returns. Nothing is queued:
//! a subscriber registered after a publish never sees it and must read the
//! current state itself.
//!
//! Snapshot-on-publish semantics:
//!   - A handler removed *during* delivery is still called in that round.
//!   - A handler added *during* delivery is not called until the next publish.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::domain::content::ContentKind;

/// Identifier returned by [`EventBus::subscribe`].
pub type ListenerId = u64;

type Handler = dyn Fn(&StoreEvent);

/// Named channel on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Content(ContentKind),
    Categories,
    Profile,
    About,
    Gtm,
    Consultation,
    /// Fired after every successful write, whatever was written.
    StorageChanged,
}

impl From<ContentKind> for Topic {
    fn from(kind: ContentKind) -> Self {
        Topic::Content(kind)
    }
}

/// Payload of a reorder notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderDescriptor {
    pub from_index: usize,
    pub to_index: usize,
    /// Record ids in their new order.
    pub new_order: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A collection or document was written; `items` is the new value.
    Updated { key: String, items: Value },
    /// An ordered collection was rearranged.
    Reordered {
        key: String,
        descriptor: ReorderDescriptor,
    },
    /// Catch-all companion of every specific notification.
    StorageChanged { key: String },
}

impl StoreEvent {
    pub fn key(&self) -> &str {
        match self {
            Self::Updated { key, .. } => key,
            Self::Reordered { key, .. } => key,
            Self::StorageChanged { key } => key,
        }
    }
}

#[derive(Default)]
struct BusInner {
    listeners: RefCell<Vec<(ListenerId, Topic, Rc<Handler>)>>,
    next_id: Cell<ListenerId>,
}

/// Process-wide bus. Clones share the same listener list.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`.
    pub fn subscribe(&self, topic: Topic, handler: impl Fn(&StoreEvent) + 'static) -> ListenerId {
        let id = self.inner.next_id.get() + 1;
        self.inner.next_id.set(id);
        let handler: Rc<Handler> = Rc::new(handler);
        self.inner.listeners.borrow_mut().push((id, topic, handler));
        id
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _, _)| *lid != id);
        listeners.len() != before
    }

    /// Deliver `event` to every handler subscribed to `topic`.
    pub fn publish(&self, topic: Topic, event: &StoreEvent) {
        let snapshot: Vec<Rc<Handler>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();
        log::trace!(
            "delivering {:?} for '{}' to {} handler(s)",
            topic,
            event.key(),
            snapshot.len()
        );
        for handler in snapshot {
            handler(event);
        }
    }

    pub fn listener_count(&self, topic: Topic) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|(_, t, _)| *t == topic)
            .count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(key: &str) -> StoreEvent {
        StoreEvent::StorageChanged {
            key: key.to_string(),
        }
    }

    #[test]
    fn delivers_only_to_matching_topic() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        bus.subscribe(Topic::Categories, move |e| {
            sink.borrow_mut().push(e.key().to_string())
        });

        bus.publish(Topic::Profile, &changed("profile"));
        bus.publish(Topic::Categories, &changed("categories"));

        assert_eq!(*seen.borrow(), vec!["categories".to_string()]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let id = bus.subscribe(Topic::StorageChanged, move |_| counter.set(counter.get() + 1));

        bus.publish(Topic::StorageChanged, &changed("a"));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(Topic::StorageChanged, &changed("b"));

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handler_added_during_delivery_waits_for_next_publish() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));

        let bus_for_handler = bus.clone();
        let count_for_handler = Rc::clone(&count);
        bus.subscribe(Topic::About, move |_| {
            let inner = Rc::clone(&count_for_handler);
            bus_for_handler.subscribe(Topic::About, move |_| inner.set(inner.get() + 1));
        });

        bus.publish(Topic::About, &changed("about"));
        assert_eq!(count.get(), 0);
        bus.publish(Topic::About, &changed("about"));
        assert_eq!(count.get(), 1);
        assert_eq!(bus.listener_count(Topic::About), 3);
    }

    #[test]
    fn every_publish_is_delivered() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        bus.subscribe(Topic::Gtm, move |_| counter.set(counter.get() + 1));

        for _ in 0..3 {
            bus.publish(Topic::Gtm, &changed("gtm"));
        }
        assert_eq!(count.get(), 3);
    }
}
