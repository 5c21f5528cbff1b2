//! # sysfeed-core
//!
//! Shared vocabulary for the sysfeed crates.
//!
//! - **Payloads**: [`payload::Payload`] is one immutable, tagged update shared by every
//!   subscriber queue; [`payload::UpdateKind`] names the four update tags
//! - **Branded IDs**: [`ids::SubscriberId`]
//! - **Snapshot source**: [`source::SnapshotSource`] is the contract the publication driver
//!   uses to obtain formatted fragments from the host collector
//! - **Errors**: [`errors::SourceError`] via `thiserror`
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `sysfeed-hardware` and `sysfeed-server`.

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod payload;
pub mod source;

pub use errors::SourceError;
pub use ids::SubscriberId;
pub use payload::{Payload, UpdateKind};
pub use source::SnapshotSource;
