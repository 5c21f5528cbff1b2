//! Subscriber lifecycle: from upgrade through disconnect.
//!
//! `Connecting` is handled by axum's upgrade extractor. Once upgraded, the connection is
//! registered (`Active`) and a writer loop forwards queued payloads. When the loop ends
//! for any reason the subscriber is removed from the registry (`Closing`) and the
//! connection is closed exactly once (`Closed`).

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use futures::StreamExt;
use metrics::{counter, gauge, histogram};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::connection::{Connection, WsConnection};
use super::registry::SubscriberRegistry;
use super::subscriber::Mailbox;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL,
};

/// Why a subscriber's writer loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The queue was closed by the registry (overflow or server-wide close).
    Evicted,
    /// Writing to the connection failed.
    WriteFailed,
    /// The client closed its side.
    PeerClosed,
    /// The server is shutting down.
    Shutdown,
}

impl DisconnectReason {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Evicted => "evicted",
            Self::WriteFailed => "write_failed",
            Self::PeerClosed => "peer_closed",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drive one registered subscriber until its loop ends, then tear it down.
///
/// The mailbox must already be registered in `registry`. Payloads are written in queue
/// order. On every exit path the subscriber is removed and `conn` is closed once.
pub async fn run_subscriber<C: Connection>(
    mut conn: C,
    mut mailbox: Mailbox,
    registry: &SubscriberRegistry,
    peer_closed: CancellationToken,
    shutdown: CancellationToken,
) -> DisconnectReason {
    let reason = loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break DisconnectReason::Shutdown,
            () = peer_closed.cancelled() => break DisconnectReason::PeerClosed,
            next = mailbox.recv() => {
                let Some(payload) = next else {
                    break DisconnectReason::Evicted;
                };
                let written = tokio::select! {
                    biased;
                    () = shutdown.cancelled() => break DisconnectReason::Shutdown,
                    result = conn.send(&payload) => result,
                };
                if let Err(e) = written {
                    debug!(
                        subscriber_id = %mailbox.id(),
                        error = %e,
                        error_kind = e.error_kind(),
                        "write failed"
                    );
                    break DisconnectReason::WriteFailed;
                }
            }
        }
    };

    let _ = registry.remove(mailbox.id());
    drop(mailbox);
    conn.close().await;
    reason
}

/// Serve an upgraded socket as a subscriber until it disconnects.
#[instrument(skip_all)]
pub async fn serve_websocket(
    socket: WebSocket,
    registry: Arc<SubscriberRegistry>,
    shutdown: CancellationToken,
) {
    let (sink, mut stream) = socket.split();
    let mailbox = registry.register();
    let subscriber_id = mailbox.id().clone();

    let started = Instant::now();
    info!(subscriber_id = %subscriber_id, "subscriber connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    // Inbound frames carry no data for us; the reader only watches for the peer leaving.
    let peer_closed = CancellationToken::new();
    let reader_token = peer_closed.clone();
    let reader_id = subscriber_id.clone();
    let reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Close(_)) => {
                    debug!(subscriber_id = %reader_id, "client sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(subscriber_id = %reader_id, error = %e, "read failed");
                    break;
                }
                Ok(_) => {}
            }
        }
        reader_token.cancel();
    });

    let reason = run_subscriber(
        WsConnection::new(sink),
        mailbox,
        &registry,
        peer_closed,
        shutdown,
    )
    .await;
    reader.abort();

    info!(
        subscriber_id = %subscriber_id,
        reason = %reason,
        duration_secs = started.elapsed().as_secs(),
        "subscriber disconnected"
    );
    counter!(WS_DISCONNECTIONS_TOTAL, "reason" => reason.as_str()).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
}
