//! # sysfeed-hardware
//!
//! Host sampling via `sysinfo` and rendering of the htmx fragments pushed to subscribers.
//!
//! - [`collect`]: raw samples ([`SystemInfo`], [`DiskInfo`], [`CpuInfo`])
//! - [`format`]: pure HTML rendering, one fragment per section
//! - [`HardwareService`]: the [`SnapshotSource`](sysfeed_core::SnapshotSource) used in production
//!
//! ## Crate Position
//!
//! Depends on: sysfeed-core.
//! Depended on by: the `sysfeed` binary.

#![deny(unsafe_code)]

pub mod collect;
pub mod format;
pub mod service;

pub use collect::{CpuInfo, DiskInfo, SystemInfo};
pub use service::HardwareService;
