//! One subscriber's bounded outbound queue.
//!
//! The queue is a tokio `mpsc` channel. The [`Subscriber`] (sending half) lives in the
//! registry; the [`Mailbox`] (receiving half) is owned by the connection's writer task.
//! Dropping the `Subscriber` closes the queue: the writer drains what was already
//! enqueued and then sees the end of the stream.

use sysfeed_core::{Payload, SubscriberId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outcome of offering a payload to one subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The payload was enqueued.
    Queued,
    /// The queue is at capacity.
    Full,
    /// The writer side has gone away.
    Closed,
}

/// Registry-side handle of a subscriber.
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<Payload>,
}

impl Subscriber {
    /// Subscriber id.
    pub fn id(&self) -> &SubscriberId {
        &self.id
    }

    /// Try to enqueue without waiting.
    pub fn offer(&self, payload: Payload) -> Delivery {
        match self.tx.try_send(payload) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Number of payloads currently waiting in the queue.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// Writer-side handle of a subscriber.
#[derive(Debug)]
pub struct Mailbox {
    id: SubscriberId,
    rx: mpsc::Receiver<Payload>,
}

impl Mailbox {
    /// Subscriber id.
    pub fn id(&self) -> &SubscriberId {
        &self.id
    }

    /// Wait for the next payload. `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<Payload> {
        self.rx.recv().await
    }

    /// Take the next payload if one is already queued.
    pub fn try_recv(&mut self) -> Option<Payload> {
        self.rx.try_recv().ok()
    }
}

/// Create a fresh subscriber with an empty queue of `capacity` slots (at least one).
pub fn subscriber_channel(capacity: usize) -> (Subscriber, Mailbox) {
    channel_with_id(SubscriberId::new(), capacity)
}

pub(crate) fn channel_with_id(id: SubscriberId, capacity: usize) -> (Subscriber, Mailbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        Subscriber { id: id.clone(), tx },
        Mailbox { id, rx },
    )
}
