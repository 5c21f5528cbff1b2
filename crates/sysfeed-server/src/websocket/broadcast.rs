//! Payload fan-out to every subscriber.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use sysfeed_core::Payload;
use tracing::{debug, trace};

use super::registry::{PublishReport, SubscriberRegistry};
use crate::metrics::{
    BROADCAST_DELIVERIES_TOTAL, BROADCAST_FANOUT_DURATION_SECONDS, BROADCAST_PAYLOADS_TOTAL,
    WS_EVICTIONS_TOTAL,
};

/// Delivers payloads to all registered subscribers without ever blocking on one of them.
#[derive(Clone, Debug)]
pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over `registry`.
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster fans out to.
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Enqueue `payload` for every subscriber.
    ///
    /// Subscribers that cannot take it right away are evicted. Never fails; the report
    /// is informational.
    pub fn publish(&self, payload: Payload) -> PublishReport {
        let started = Instant::now();
        let report = self.registry.fan_out(&payload);

        counter!(BROADCAST_PAYLOADS_TOTAL).increment(1);
        counter!(BROADCAST_DELIVERIES_TOTAL).increment(report.delivered as u64);
        histogram!(BROADCAST_FANOUT_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        if !report.evicted.is_empty() {
            counter!(WS_EVICTIONS_TOTAL).increment(report.evicted.len() as u64);
            for id in &report.evicted {
                debug!(subscriber_id = %id, "subscriber evicted, queue full or closed");
            }
        }
        trace!(
            bytes = payload.len(),
            delivered = report.delivered,
            evicted = report.evicted.len(),
            "payload published"
        );
        report
    }
}
