//! Production snapshot source backed by `sysinfo`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use sysfeed_core::{SnapshotSource, SourceError};
use sysinfo::System;
use tracing::{debug, instrument};

use crate::{collect, format};

/// Samples the local host and renders htmx fragments.
///
/// One `System` is kept for the life of the service so CPU usage is measured between
/// consecutive ticks. Sampling runs on the blocking pool.
#[derive(Clone)]
pub struct HardwareService {
    system: Arc<Mutex<System>>,
    disk_mount_point: Arc<PathBuf>,
}

impl HardwareService {
    /// Create a service reporting the filesystem mounted at `disk_mount_point`.
    pub fn new(disk_mount_point: impl Into<PathBuf>) -> Self {
        let mut system = System::new_all();
        system.refresh_cpu_usage();
        Self {
            system: Arc::new(Mutex::new(system)),
            disk_mount_point: Arc::new(disk_mount_point.into()),
        }
    }

    /// Mount point reported in the disk section.
    pub fn disk_mount_point(&self) -> &Path {
        &self.disk_mount_point
    }

    async fn sample<T, F>(&self, f: F) -> Result<T, SourceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut System) -> Result<T, SourceError> + Send + 'static,
    {
        let system = Arc::clone(&self.system);
        tokio::task::spawn_blocking(move || f(&mut system.lock()))
            .await
            .map_err(|e| SourceError::Task(e.to_string()))?
    }
}

impl std::fmt::Debug for HardwareService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardwareService")
            .field("disk_mount_point", &self.disk_mount_point)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SnapshotSource for HardwareService {
    #[instrument(skip(self), level = "trace")]
    async fn system_section(&self) -> Result<String, SourceError> {
        let info = self.sample(collect::system_info).await?;
        debug!(processes = info.processes, "sampled system");
        Ok(format::format_system(&info))
    }

    #[instrument(skip(self), level = "trace")]
    async fn disk_section(&self) -> Result<String, SourceError> {
        let mount = Arc::clone(&self.disk_mount_point);
        let info = tokio::task::spawn_blocking(move || collect::disk_info(&mount))
            .await
            .map_err(|e| SourceError::Task(e.to_string()))??;
        Ok(format::format_disk(&info))
    }

    #[instrument(skip(self), level = "trace")]
    async fn cpu_section(&self) -> Result<String, SourceError> {
        let info = self.sample(collect::cpu_info).await?;
        debug!(cores = info.cores_usage.len(), "sampled cpu");
        Ok(format::format_cpu(&info))
    }

    fn timestamp_section(&self, now: DateTime<Local>) -> String {
        format::format_timestamp(&now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysfeed_core::UpdateKind;

    #[tokio::test]
    async fn sections_render_with_ids() {
        let service = HardwareService::new("/");
        let system = service.system_section().await.unwrap();
        assert!(system.contains("id=\"system-data\""));
        let cpu = service.cpu_section().await.unwrap();
        assert!(cpu.contains("id=\"cpu-data\""));
    }

    #[tokio::test]
    async fn unknown_mount_is_reported_per_section() {
        let service = HardwareService::new("/no/such/mount/here");
        let err = service.disk_section().await.unwrap_err();
        assert_eq!(err.section(), Some(UpdateKind::DiskData));
        assert!(service.system_section().await.is_ok());
    }

    #[tokio::test]
    async fn timestamp_goes_through_section_dispatch() {
        let service = HardwareService::new("/");
        let html = service.section(UpdateKind::Timestamp).await.unwrap();
        assert!(html.starts_with("<div id=\"update-timestamp\">"));
    }
}
