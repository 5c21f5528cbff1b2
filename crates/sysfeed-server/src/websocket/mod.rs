//! Subscriber registry, fan-out, and per-connection lifecycle.

pub mod broadcast;
pub mod connection;
pub mod registry;
pub mod session;
pub mod subscriber;
