//! Mock update transport for testing.

use std::sync::{Arc, Mutex};

use crate::update::{EventBus, ResourceTransport, Subscription, UpdateEvent, UpdateEventHandler};

/// Mock implementation of the ResourceTransport trait.
///
/// Provides controllable behavior for testing:
/// - Count check/update requests for assertions
/// - Publish notifications to subscribed handlers on demand
/// - Replay scripted notifications synchronously from inside
///   `check_resources` / `update_resources`, like an inline transport would
///
/// # Example
///
/// ```rust,ignore
/// let transport = Arc::new(MockTransport::new());
/// transport.set_check_script(vec![fixtures::check_complete_event(0, 0)]);
///
/// orchestrator.enter(); // check_resources replays the script
/// assert_eq!(transport.check_requests(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    bus: EventBus,
    check_requests: Mutex<u32>,
    update_requests: Mutex<u32>,
    check_script: Mutex<Vec<UpdateEvent>>,
    update_script: Mutex<Vec<UpdateEvent>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published synchronously by the next `check_resources` call.
    pub fn set_check_script(&self, events: Vec<UpdateEvent>) {
        *self.check_script.lock().unwrap() = events;
    }

    /// Events published synchronously by the next `update_resources` call.
    pub fn set_update_script(&self, events: Vec<UpdateEvent>) {
        *self.update_script.lock().unwrap() = events;
    }

    /// Deliver one notification to every subscriber.
    pub fn publish(&self, event: UpdateEvent) {
        self.bus.publish(&event);
    }

    /// Deliver notifications in order.
    pub fn publish_all(&self, events: impl IntoIterator<Item = UpdateEvent>) {
        for event in events {
            self.bus.publish(&event);
        }
    }

    /// Number of `check_resources` calls so far.
    pub fn check_requests(&self) -> u32 {
        *self.check_requests.lock().unwrap()
    }

    /// Number of `update_resources` calls so far.
    pub fn update_requests(&self) -> u32 {
        *self.update_requests.lock().unwrap()
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    fn replay(&self, script: &Mutex<Vec<UpdateEvent>>) {
        let events = std::mem::take(&mut *script.lock().unwrap());
        self.publish_all(events);
    }
}

impl ResourceTransport for MockTransport {
    fn subscribe(&self, handler: Arc<dyn UpdateEventHandler>) -> Subscription {
        self.bus.subscribe(handler)
    }

    fn check_resources(&self) {
        *self.check_requests.lock().unwrap() += 1;
        self.replay(&self.check_script);
    }

    fn update_resources(&self) {
        *self.update_requests.lock().unwrap() += 1;
        self.replay(&self.update_script);
    }
}
