//! The set of live subscribers.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use parking_lot::Mutex;
use sysfeed_core::{Payload, SubscriberId};
use tracing::debug;

use super::subscriber::{Delivery, Mailbox, Subscriber, subscriber_channel};

/// Result of one fan-out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers whose queue accepted the payload.
    pub delivered: usize,
    /// Subscribers removed because their queue was full or closed.
    pub evicted: Vec<SubscriberId>,
}

/// Concurrency-safe set of live subscribers.
///
/// A single mutex guards the map. It is never held across an `.await`; every operation
/// that touches a queue uses the non-blocking `try_send`.
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    queue_capacity: usize,
}

impl SubscriberRegistry {
    /// Create an empty registry whose subscribers get `queue_capacity` slots each.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Per-subscriber queue bound.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Create a subscriber with an empty queue, add it, and hand back its mailbox.
    pub fn register(&self) -> Mailbox {
        self.register_with_capacity(self.queue_capacity)
    }

    /// Like [`register`](Self::register) with an explicit queue bound.
    pub fn register_with_capacity(&self, capacity: usize) -> Mailbox {
        let (subscriber, mailbox) = subscriber_channel(capacity);
        let _ = self.add(subscriber);
        mailbox
    }

    /// Add a subscriber. Returns `false` (and keeps the existing entry) if the id is
    /// already present.
    pub fn add(&self, subscriber: Subscriber) -> bool {
        let mut subscribers = self.subscribers.lock();
        match subscribers.entry(subscriber.id().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                debug!(subscriber_id = %subscriber.id(), "subscriber added");
                let _ = slot.insert(subscriber);
                true
            }
        }
    }

    /// Remove a subscriber, closing its queue. Removing an absent id is a no-op.
    pub fn remove(&self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.lock().remove(id).is_some();
        if removed {
            debug!(subscriber_id = %id, "subscriber removed");
        }
        removed
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.subscribers.lock().contains_key(id)
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    /// Remove every subscriber, closing all queues. Returns how many were removed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.subscribers.lock().drain().collect();
        drained.len()
    }

    /// Offer `payload` to every subscriber under the lock.
    ///
    /// A subscriber whose queue is full or closed is removed in the same critical
    /// section, which drops its sending half and ends its writer loop.
    pub fn fan_out(&self, payload: &Payload) -> PublishReport {
        let mut report = PublishReport::default();
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|id, subscriber| match subscriber.offer(payload.clone()) {
            Delivery::Queued => {
                report.delivered += 1;
                true
            }
            Delivery::Full | Delivery::Closed => {
                report.evicted.push(id.clone());
                false
            }
        });
        report
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(10)
    }
}
