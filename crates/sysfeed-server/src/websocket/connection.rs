//! Transport abstraction for a subscriber's connection.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::SinkExt;
use futures::stream::SplitSink;
use sysfeed_core::Payload;
use tracing::debug;

/// Errors from writing to a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The underlying transport rejected the write.
    #[error("transport error: {0}")]
    Transport(String),
    /// The connection was already closed.
    #[error("connection closed")]
    Closed,
}

impl ConnectionError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Closed => "closed",
        }
    }
}

/// Outbound side of one client connection.
#[async_trait]
pub trait Connection: Send + Sized + 'static {
    /// Write one payload as a text frame.
    async fn send(&mut self, payload: &Payload) -> Result<(), ConnectionError>;

    /// Close the connection. Consumes the handle, so it can only happen once.
    async fn close(self);
}

/// [`Connection`] over the sending half of an axum `WebSocket`.
pub struct WsConnection {
    sink: SplitSink<WebSocket, Message>,
}

impl WsConnection {
    /// Wrap the sending half of a split socket.
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, payload: &Payload) -> Result<(), ConnectionError> {
        self.sink
            .send(Message::Text(payload.as_str().into()))
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }

    async fn close(mut self) {
        if let Err(e) = self.sink.send(Message::Close(None)).await {
            debug!(error = %e, "close frame not sent");
        }
        if let Err(e) = self.sink.close().await {
            debug!(error = %e, "socket close failed");
        }
    }
}
