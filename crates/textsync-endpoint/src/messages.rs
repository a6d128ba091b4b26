//! Sync protocol message types.
//!
//! A peer is sent either the whole value or a patch against a snapshot it is
//! known to hold. The transport carries these commands; how it frames them is
//! up to the transport, with [`SyncCommand::to_wire`] and
//! [`SyncCommand::from_wire`] as a ready-made raw framing.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use textsync_core::{Differ, PatchError};

use crate::error::{Result, SyncError};

/// Sync protocol commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncCommand {
    /// The entire current value.
    FullSnapshot {
        content: String,
    },

    /// Differ-encoded patch against a snapshot the receiver already holds.
    ///
    /// Only produced when the sender's history contains the snapshot for the
    /// fingerprint the receiver reported.
    DeltaPatch {
        metadata: Bytes,
    },
}

impl SyncCommand {
    pub fn full_snapshot(content: impl Into<String>) -> Self {
        SyncCommand::FullSnapshot {
            content: content.into(),
        }
    }

    pub fn delta_patch(metadata: impl Into<Bytes>) -> Self {
        SyncCommand::DeltaPatch {
            metadata: metadata.into(),
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, SyncCommand::DeltaPatch { .. })
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncCommand::FullSnapshot { .. } => "full-snapshot",
            SyncCommand::DeltaPatch { .. } => "delta-patch",
        }
    }

    /// Raw framing: a snapshot as its UTF-8 bytes, a patch as its metadata.
    pub fn to_wire(&self) -> Bytes {
        match self {
            SyncCommand::FullSnapshot { content } => Bytes::copy_from_slice(content.as_bytes()),
            SyncCommand::DeltaPatch { metadata } => metadata.clone(),
        }
    }

    /// Decode a raw frame produced by [`to_wire`](Self::to_wire).
    ///
    /// Anything `differ` accepts as patch metadata is a [`SyncCommand::DeltaPatch`];
    /// anything else must be UTF-8 and becomes a [`SyncCommand::FullSnapshot`].
    pub fn from_wire<D: Differ>(raw: Bytes, differ: &D) -> Result<Self> {
        match differ.parse_patch(&raw) {
            Ok(_) => Ok(SyncCommand::DeltaPatch { metadata: raw }),
            Err(PatchError::NotAPatch(_)) => snapshot_from_bytes(&raw).map(SyncCommand::full_snapshot),
            Err(e) => Err(SyncError::InvalidMessage(e.to_string())),
        }
    }

    /// Resolve this command into something the endpoint can apply.
    pub(crate) fn interpret<D: Differ>(self, differ: &D) -> Result<Incoming<D::Patch>> {
        match self {
            SyncCommand::FullSnapshot { content } => Ok(Incoming::Snapshot(content)),
            SyncCommand::DeltaPatch { metadata } => match differ.parse_patch(&metadata) {
                Ok(patch) => Ok(Incoming::Patch(patch)),
                Err(PatchError::NotAPatch(_)) => {
                    // A snapshot that arrived in the patch slot.
                    snapshot_from_bytes(&metadata).map(Incoming::Snapshot)
                }
                Err(e) => Err(SyncError::InvalidMessage(e.to_string())),
            },
        }
    }
}

/// A decoded incoming command.
pub(crate) enum Incoming<P> {
    Snapshot(String),
    Patch(P),
}

fn snapshot_from_bytes(raw: &[u8]) -> Result<String> {
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| SyncError::InvalidMessage(format!("neither patch metadata nor text: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use textsync_core::SpliceDiffer;

    #[test]
    fn test_wire_snapshot() {
        let differ = SpliceDiffer::new();
        let cmd = SyncCommand::full_snapshot("hello world");

        let decoded = SyncCommand::from_wire(cmd.to_wire(), &differ).unwrap();
        assert_eq!(decoded, cmd);
        assert!(!decoded.is_delta());
    }

    #[test]
    fn test_wire_patch() {
        let differ = SpliceDiffer::new();
        let patch = differ.compute_patch("hello", "hello world").unwrap();
        let cmd = SyncCommand::delta_patch(differ.encode_patch(&patch).unwrap());

        let decoded = SyncCommand::from_wire(cmd.to_wire(), &differ).unwrap();
        assert_eq!(decoded, cmd);
        assert_eq!(decoded.kind(), "delta-patch");
    }

    #[test]
    fn test_wire_rejects_binary_garbage() {
        let differ = SpliceDiffer::new();
        let err = SyncCommand::from_wire(Bytes::from_static(&[0xff, 0xfe, 0x00]), &differ)
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidMessage(_)));
    }

    #[test]
    fn test_text_in_patch_slot_is_snapshot() {
        let differ = SpliceDiffer::new();
        let cmd = SyncCommand::delta_patch(Bytes::from_static(b"plain text"));

        match cmd.interpret(&differ).unwrap() {
            Incoming::Snapshot(content) => assert_eq!(content, "plain text"),
            Incoming::Patch(_) => panic!("expected snapshot"),
        }
    }
}
