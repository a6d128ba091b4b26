//! Error types for textsync core.

use thiserror::Error;

use crate::fingerprint::Fingerprint;

/// Errors raised by a [`Differ`](crate::Differ).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The bytes are not patch metadata.
    #[error("not a patch: {0}")]
    NotAPatch(String),

    /// The patch was computed against a different base than the one supplied.
    #[error("patch base mismatch: expected {expected}, got {actual}")]
    Mismatch {
        expected: Fingerprint,
        actual: Fingerprint,
    },

    /// The patch matched its base but could not be applied cleanly.
    #[error("corrupt patch against base {base}: {reason}")]
    Corrupt { base: Fingerprint, reason: String },

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl PatchError {
    /// The base fingerprint the failing patch was computed against, if known.
    pub fn base(&self) -> Option<Fingerprint> {
        match self {
            PatchError::Mismatch { expected, .. } => Some(*expected),
            PatchError::Corrupt { base, .. } => Some(*base),
            PatchError::NotAPatch(_) | PatchError::Encoding(_) => None,
        }
    }

    /// Whether the failure means "this patch cannot merge into the local value".
    ///
    /// Such failures are recoverable by fetching a replacement command.
    pub fn is_merge_failure(&self) -> bool {
        matches!(self, PatchError::Mismatch { .. } | PatchError::Corrupt { .. })
    }
}

/// Result type for patch operations.
pub type Result<T> = std::result::Result<T, PatchError>;
