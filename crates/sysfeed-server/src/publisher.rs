//! Periodic publication of host snapshots.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use sysfeed_core::{Payload, SnapshotSource, UpdateKind};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::metrics::{
    PUBLISHER_SECTION_FAILURES_TOTAL, PUBLISHER_TICK_DURATION_SECONDS, PUBLISHER_TICKS_TOTAL,
};
use crate::websocket::broadcast::Broadcaster;

/// Shortest accepted tick period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What one tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Sections published, in order.
    pub published: Vec<UpdateKind>,
    /// Sections skipped because sampling failed.
    pub failed: Vec<UpdateKind>,
    /// Total enqueues across all sections.
    pub deliveries: usize,
    /// Total evictions across all sections.
    pub evictions: usize,
}

/// Samples the snapshot source on a fixed period and broadcasts each section.
pub struct Publisher {
    source: Arc<dyn SnapshotSource>,
    broadcaster: Broadcaster,
    interval: Duration,
}

impl Publisher {
    /// Create a publisher ticking every `interval`.
    pub fn new(source: Arc<dyn SnapshotSource>, broadcaster: Broadcaster, interval: Duration) -> Self {
        Self {
            source,
            broadcaster,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Tick period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sample and publish the timestamp, system, disk and CPU sections, in that order.
    ///
    /// Sections are independent: a failing one is logged and skipped while the others
    /// still go out.
    pub async fn run_tick(&self) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport::default();

        for kind in UpdateKind::ALL {
            match self.source.section(kind).await {
                Ok(fragment) => {
                    let published = self.broadcaster.publish(Payload::tagged(kind, &fragment));
                    report.deliveries += published.delivered;
                    report.evictions += published.evicted.len();
                    report.published.push(kind);
                }
                Err(e) => {
                    warn!(
                        section = kind.section(),
                        error_kind = e.error_kind(),
                        error = %e,
                        "section skipped this tick"
                    );
                    counter!(
                        PUBLISHER_SECTION_FAILURES_TOTAL,
                        "section" => kind.section(),
                        "kind" => e.error_kind()
                    )
                    .increment(1);
                    report.failed.push(kind);
                }
            }
        }

        counter!(PUBLISHER_TICKS_TOTAL).increment(1);
        histogram!(PUBLISHER_TICK_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        report
    }

    /// Tick until `cancel` fires. The first tick runs immediately.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = self.interval.as_millis(), "publisher started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if self.broadcaster.registry().is_empty() {
                        trace!("no subscribers, skipping tick");
                        continue;
                    }
                    let report = self.run_tick().await;
                    debug!(
                        published = report.published.len(),
                        failed = report.failed.len(),
                        deliveries = report.deliveries,
                        evictions = report.evictions,
                        "tick complete"
                    );
                }
            }
        }

        info!("publisher stopped");
    }

    /// Run on a new task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
