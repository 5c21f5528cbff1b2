//! The snapshot source contract.
//!
//! The broadcast layer never samples the host itself. It asks a [`SnapshotSource`] for
//! formatted fragments, one section at a time, and publishes whatever comes back.

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::errors::SourceError;
use crate::payload::UpdateKind;

/// Producer of formatted snapshot fragments.
///
/// Each retrieval is independent: a failure in one section says nothing about the others.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// OS, host and memory summary.
    async fn system_section(&self) -> Result<String, SourceError>;

    /// Usage of the monitored filesystem.
    async fn disk_section(&self) -> Result<String, SourceError>;

    /// CPU model and per-core usage.
    async fn cpu_section(&self) -> Result<String, SourceError>;

    /// Render the "last update" fragment. Pure; never fails.
    fn timestamp_section(&self, now: DateTime<Local>) -> String;

    /// Produce the fragment for `kind`.
    async fn section(&self, kind: UpdateKind) -> Result<String, SourceError> {
        match kind {
            UpdateKind::Timestamp => Ok(self.timestamp_section(Local::now())),
            UpdateKind::SystemData => self.system_section().await,
            UpdateKind::DiskData => self.disk_section().await,
            UpdateKind::CpuData => self.cpu_section().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl SnapshotSource for Fixed {
        async fn system_section(&self) -> Result<String, SourceError> {
            Ok("sys".into())
        }

        async fn disk_section(&self) -> Result<String, SourceError> {
            Err(SourceError::Unavailable {
                section: UpdateKind::DiskData,
                reason: "no disk".into(),
            })
        }

        async fn cpu_section(&self) -> Result<String, SourceError> {
            Ok("cpu".into())
        }

        fn timestamp_section(&self, _now: DateTime<Local>) -> String {
            "ts".into()
        }
    }

    #[tokio::test]
    async fn section_dispatches_by_kind() {
        let source = Fixed;
        assert_eq!(source.section(UpdateKind::Timestamp).await.unwrap(), "ts");
        assert_eq!(source.section(UpdateKind::SystemData).await.unwrap(), "sys");
        assert_eq!(source.section(UpdateKind::CpuData).await.unwrap(), "cpu");
        assert!(source.section(UpdateKind::DiskData).await.is_err());
    }
}
