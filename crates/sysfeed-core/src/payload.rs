//! Tagged update payloads.
//!
//! Every message pushed to a subscriber is a UTF-8 text frame of the form
//! `<TAG>:<html-fragment>`. The tag tells the page which element to swap, so the four
//! sections of a snapshot travel as four independent messages.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Kind of update carried by a [`Payload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// Time of the last refresh.
    Timestamp,
    /// OS, host and memory summary.
    SystemData,
    /// Usage of the monitored filesystem.
    DiskData,
    /// CPU model and per-core usage.
    CpuData,
}

impl UpdateKind {
    /// All kinds, in the order they are published within one tick.
    pub const ALL: [Self; 4] = [
        Self::Timestamp,
        Self::SystemData,
        Self::DiskData,
        Self::CpuData,
    ];

    /// Wire tag placed in front of the fragment (without the `:` separator).
    pub fn tag(self) -> &'static str {
        match self {
            Self::Timestamp => "UPDATE_TIMESTAMP",
            Self::SystemData => "UPDATE_SYSTEM_DATA",
            Self::DiskData => "UPDATE_DISK_DATA",
            Self::CpuData => "UPDATE_CPU_DATA",
        }
    }

    /// Short section name, used as a log field and metric label.
    pub fn section(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::SystemData => "system",
            Self::DiskData => "disk",
            Self::CpuData => "cpu",
        }
    }

    /// Look up a kind by its wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One immutable unit of outbound data.
///
/// Cloning is a reference-count bump, so a single payload published to N subscribers
/// occupies one allocation no matter how many queues hold it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload(Arc<str>);

impl Payload {
    /// Build a payload from raw text. No tag is added.
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Build `<TAG>:<fragment>` for the given kind.
    pub fn tagged(kind: UpdateKind, fragment: &str) -> Self {
        let tag = kind.tag();
        let mut text = String::with_capacity(tag.len() + 1 + fragment.len());
        text.push_str(tag);
        text.push(':');
        text.push_str(fragment);
        Self(text.into())
    }

    /// The payload as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split a tagged payload into its kind and fragment.
    ///
    /// Returns `None` for untagged payloads or unknown tags.
    pub fn split(&self) -> Option<(UpdateKind, &str)> {
        let (tag, fragment) = self.0.split_once(':')?;
        UpdateKind::from_tag(tag).map(|kind| (kind, fragment))
    }

    /// Whether two payloads share the same allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
