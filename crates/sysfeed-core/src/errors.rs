//! Errors raised by snapshot sources.

use crate::payload::UpdateKind;

/// Failure to produce one section of a snapshot.
///
/// Every variant is local to a single section and a single tick; the publication driver
/// logs it and tries again on the next tick.
#[derive(Clone, Debug, thiserror::Error)]
pub enum SourceError {
    /// The OS-facing library returned an error while sampling.
    #[error("failed to get {} info: {reason}", .section.section())]
    Collect {
        /// Section being sampled.
        section: UpdateKind,
        /// Message from the sampling library.
        reason: String,
    },
    /// The requested data does not exist on this host (no CPUs reported, mount missing).
    #[error("{} info unavailable: {reason}", .section.section())]
    Unavailable {
        /// Section being sampled.
        section: UpdateKind,
        /// What was missing.
        reason: String,
    },
    /// The blocking sampling task panicked or was cancelled.
    #[error("sampling task failed: {0}")]
    Task(String),
}

impl SourceError {
    /// Short classification string for logging/metrics.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Collect { .. } => "collect",
            Self::Unavailable { .. } => "unavailable",
            Self::Task(_) => "task",
        }
    }

    /// The section this error belongs to, when known.
    pub fn section(&self) -> Option<UpdateKind> {
        match self {
            Self::Collect { section, .. } | Self::Unavailable { section, .. } => Some(*section),
            Self::Task(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_display_names_section() {
        let err = SourceError::Collect {
            section: UpdateKind::SystemData,
            reason: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to get system info: permission denied"
        );
        assert_eq!(err.section(), Some(UpdateKind::SystemData));
    }

    #[test]
    fn unavailable_display() {
        let err = SourceError::Unavailable {
            section: UpdateKind::DiskData,
            reason: "no filesystem mounted at /data".into(),
        };
        assert_eq!(
            err.to_string(),
            "disk info unavailable: no filesystem mounted at /data"
        );
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(SourceError::Task("panicked".into()).error_kind(), "task");
        assert_eq!(
            SourceError::Unavailable {
                section: UpdateKind::CpuData,
                reason: String::new()
            }
            .error_kind(),
            "unavailable"
        );
        assert!(SourceError::Task("cancelled".into()).section().is_none());
    }
}
