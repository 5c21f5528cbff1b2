//! # sysfeed-server
//!
//! Axum HTTP + `WebSocket` server that pushes host snapshots to every connected browser.
//!
//! - [`websocket::registry`]: the set of live subscribers, one bounded queue each
//! - [`websocket::broadcast`]: non-blocking fan-out with evict-on-overflow
//! - [`websocket::session`]: per-connection lifecycle from upgrade to close
//! - [`publisher`]: periodic sampling and publication of the four snapshot sections
//! - HTTP endpoints: `/health`, `/metrics`, static assets
//! - Graceful shutdown via `CancellationToken`
//!
//! ## Crate Position
//!
//! Depends on: sysfeed-core, sysfeed-settings.
//! Depended on by: the `sysfeed` binary.

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod publisher;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use publisher::{Publisher, TickReport};
pub use server::SysfeedServer;
