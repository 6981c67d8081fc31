//! Event bus.
//!
//! Each editor session owns one bus and shares it by `Arc` with the
//! document store. Listeners are called synchronously, on the publishing
//! thread, once the publisher's mutation is complete.

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory};
use crate::data::FeatureId;

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId {
    /// Registration order; listeners are called in this order.
    order: u64,
    uuid: Uuid,
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener#{} ({})", self.order, self.uuid.simple())
    }
}

/// Which events a listener receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventFilter {
    #[default]
    All,
    /// Events in any of these categories.
    Categories(Vec<EventCategory>),
    /// Events concerning one feature, e.g. for a table row or popup.
    Feature(FeatureId),
}

impl EventFilter {
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
            EventFilter::Feature(id) => event.touches(id),
        }
    }

    pub fn only(category: EventCategory) -> Self {
        EventFilter::Categories(vec![category])
    }
}

type Listener = Arc<dyn Fn(&AppEvent) + Send + Sync>;

/// Publish/subscribe hub for session events.
///
/// The listener table is copied before dispatch, so a listener may
/// subscribe or unsubscribe (itself included) without deadlocking. Changes
/// made during a dispatch take effect from the next event.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<BTreeMap<SubscriptionId, (EventFilter, Listener)>>,
    next_order: Mutex<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every matching listener, in subscription order.
    ///
    /// Returns the number of listeners called; zero is not an error.
    pub fn publish(&self, event: AppEvent) -> usize {
        tracing::trace!("Publishing {}", event.description());
        let matching: Vec<Listener> = self
            .listeners
            .read()
            .values()
            .filter(|(filter, _)| filter.matches(&event))
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in &matching {
            listener(&event);
        }
        matching.len()
    }

    /// Registers a listener for events matching `filter`.
    pub fn subscribe<F>(&self, filter: EventFilter, listener: F) -> SubscriptionId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = {
            let mut order = self.next_order.lock();
            *order += 1;
            SubscriptionId {
                order: *order,
                uuid: Uuid::new_v4(),
            }
        };
        tracing::debug!("Subscribed {} to {:?}", id, filter);
        self.listeners.write().insert(id, (filter, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.listeners.write().remove(&id).is_some();
        if removed {
            tracing::debug!("Unsubscribed {}", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::events::{DocumentChange, DocumentEvent, ModeEvent, SelectionEvent};
    use crate::{CanonicalDocument, InteractionMode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn selection(id: i64) -> AppEvent {
        AppEvent::Selection(SelectionEvent::Changed {
            previous: None,
            selected: Some(FeatureId::Int(id)),
        })
    }

    fn property_change(id: i64) -> AppEvent {
        AppEvent::Document(DocumentEvent::Changed {
            revision: 1,
            change: DocumentChange::PropertyUpdated {
                id: FeatureId::Int(id),
                key: "name".to_string(),
            },
            document: Arc::new(CanonicalDocument::default()),
        })
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new();

        let id = bus.subscribe(EventFilter::All, |_| {});
        assert_eq!(bus.subscriber_count(), 1);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn test_publish_without_listeners_is_not_an_error() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(selection(1)), 0);
    }

    #[test]
    fn test_category_filter() {
        let bus = EventBus::new();
        let selection_count = Arc::new(AtomicUsize::new(0));
        let mode_count = Arc::new(AtomicUsize::new(0));

        let sc = selection_count.clone();
        bus.subscribe(EventFilter::only(EventCategory::Selection), move |_| {
            sc.fetch_add(1, Ordering::SeqCst);
        });
        let mc = mode_count.clone();
        bus.subscribe(EventFilter::only(EventCategory::Mode), move |_| {
            mc.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(selection(1));
        bus.publish(AppEvent::Mode(ModeEvent::Changed {
            from: InteractionMode::Idle,
            to: InteractionMode::Idle,
        }));
        bus.publish(selection(2));

        assert_eq!(selection_count.load(Ordering::SeqCst), 2);
        assert_eq!(mode_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_feature_filter() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        bus.subscribe(EventFilter::Feature(FeatureId::Int(3)), move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(property_change(3));
        bus.publish(property_change(4));
        bus.publish(selection(3));
        bus.publish(selection(5));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listeners_run_in_subscription_order() {
        let bus = EventBus::new();
        let calls: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        for name in ["table", "map", "status"] {
            let calls = Arc::clone(&calls);
            bus.subscribe(EventFilter::All, move |_| calls.lock().push(name));
        }

        bus.publish(selection(1));
        assert_eq!(*calls.lock(), vec!["table", "map", "status"]);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let bus = Arc::new(EventBus::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let bus_clone = Arc::clone(&bus);
        let slot_clone = Arc::clone(&slot);
        let id = bus.subscribe(EventFilter::All, move |_| {
            if let Some(id) = *slot_clone.lock() {
                bus_clone.unsubscribe(id);
            }
        });
        *slot.lock() = Some(id);

        assert_eq!(bus.publish(selection(1)), 1);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(selection(2)), 0);
    }
}
