//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Call once at startup before any metrics are recorded.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// Payloads handed to the broadcaster (counter).
pub const BROADCAST_PAYLOADS_TOTAL: &str = "broadcast_payloads_total";
/// Payloads enqueued to a subscriber (counter).
pub const BROADCAST_DELIVERIES_TOTAL: &str = "broadcast_deliveries_total";
/// Fan-out duration seconds (histogram).
pub const BROADCAST_FANOUT_DURATION_SECONDS: &str = "broadcast_fanout_duration_seconds";
/// Subscribers evicted for a full or closed queue (counter).
pub const WS_EVICTIONS_TOTAL: &str = "ws_evictions_total";
/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter, labels: reason).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// WebSocket connection lifetime seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Publication ticks that sampled the host (counter).
pub const PUBLISHER_TICKS_TOTAL: &str = "publisher_ticks_total";
/// Sections skipped because sampling failed (counter, labels: section, kind).
pub const PUBLISHER_SECTION_FAILURES_TOTAL: &str = "publisher_section_failures_total";
/// Publication tick duration seconds (histogram).
pub const PUBLISHER_TICK_DURATION_SECONDS: &str = "publisher_tick_duration_seconds";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_without_global_install() {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let output = render(&handle);
        assert!(output.is_empty() || output.contains('#') || output.contains('\n'));
    }

    #[test]
    fn metric_constants_are_snake_case() {
        let names = [
            BROADCAST_PAYLOADS_TOTAL,
            BROADCAST_DELIVERIES_TOTAL,
            BROADCAST_FANOUT_DURATION_SECONDS,
            WS_EVICTIONS_TOTAL,
            WS_CONNECTIONS_TOTAL,
            WS_DISCONNECTIONS_TOTAL,
            WS_CONNECTIONS_ACTIVE,
            WS_CONNECTION_DURATION_SECONDS,
            PUBLISHER_TICKS_TOTAL,
            PUBLISHER_SECTION_FAILURES_TOTAL,
            PUBLISHER_TICK_DURATION_SECONDS,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
