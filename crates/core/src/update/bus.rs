//! Handler registry with symmetric subscribe/unsubscribe.
//!
//! Transports that do not have their own notification plumbing can embed an
//! [`EventBus`] and forward `subscribe` to it. Every registration is
//! represented by a [`Subscription`]; dropping it removes the handler.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::debug;

use super::events::{UpdateEvent, UpdateEventHandler};

struct Registration {
    id: u64,
    handler: Arc<dyn UpdateEventHandler>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<Registration>,
}

/// Fan-out of update events to registered handlers.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
        // A handler panicking mid-dispatch never holds this lock.
        registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `handler` until the returned subscription is dropped.
    pub fn subscribe(&self, handler: Arc<dyn UpdateEventHandler>) -> Subscription {
        let mut registry = Self::lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.handlers.push(Registration { id, handler });
        debug!("Event handler {} subscribed", id);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every handler registered at the time of the call.
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe while being called.
    pub fn publish(&self, event: &UpdateEvent) {
        let handlers: Vec<Arc<dyn UpdateEventHandler>> = Self::lock(&self.registry)
            .handlers
            .iter()
            .map(|r| Arc::clone(&r.handler))
            .collect();

        for handler in handlers {
            handler.dispatch(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        Self::lock(&self.registry).handlers.len()
    }
}

/// Live registration on an [`EventBus`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the handler now. Safe to call repeatedly.
    pub fn unsubscribe(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        EventBus::lock(&registry)
            .handlers
            .retain(|r| r.id != self.id);
        self.registry = Weak::new();
        debug!("Event handler {} unsubscribed", self.id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
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
    use crate::update::events::{CheckComplete, UpdateChanged, UpdateFailure, UpdateStart, UpdateSuccess};

    #[derive(Default)]
    struct Counter {
        seen: Mutex<Vec<&'static str>>,
    }

    impl Counter {
        fn seen(&self) -> Vec<&'static str> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl UpdateEventHandler for Counter {
        fn on_check_complete(&self, _: &CheckComplete) {
            self.seen.lock().unwrap().push("check_complete");
        }
        fn on_update_start(&self, _: &UpdateStart) {
            self.seen.lock().unwrap().push("update_start");
        }
        fn on_update_changed(&self, _: &UpdateChanged) {
            self.seen.lock().unwrap().push("update_changed");
        }
        fn on_update_success(&self, _: &UpdateSuccess) {
            self.seen.lock().unwrap().push("update_success");
        }
        fn on_update_failure(&self, _: &UpdateFailure) {
            self.seen.lock().unwrap().push("update_failure");
        }
        fn on_update_all_complete(&self) {
            self.seen.lock().unwrap().push("update_all_complete");
        }
    }

    #[test]
    fn test_publish_reaches_subscribers() {
        let bus = EventBus::new();
        let counter = Arc::new(Counter::default());
        let _sub = bus.subscribe(counter.clone());

        bus.publish(&UpdateEvent::UpdateStart(UpdateStart {
            name: "a".to_string(),
        }));
        bus.publish(&UpdateEvent::UpdateAllComplete);

        assert_eq!(counter.seen(), vec!["update_start", "update_all_complete"]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let counter = Arc::new(Counter::default());
        let sub = bus.subscribe(counter.clone());
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(&UpdateEvent::UpdateAllComplete);
        assert!(counter.seen().is_empty());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(Arc::new(Counter::default()));
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_only_removes_own_handler() {
        let bus = EventBus::new();
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());
        let mut first_sub = bus.subscribe(first.clone());
        let _second_sub = bus.subscribe(second.clone());

        first_sub.unsubscribe();
        bus.publish(&UpdateEvent::UpdateAllComplete);

        assert!(first.seen().is_empty());
        assert_eq!(second.seen(), vec!["update_all_complete"]);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(Arc::new(Counter::default()));
        drop(bus);
        sub.unsubscribe();
        drop(sub);
    }
}
