//! Error types for the sync endpoint.

use thiserror::Error;

use textsync_core::{Fingerprint, PatchError};

use crate::recovery::BoxError;

/// Errors surfaced by [`SyncEndpoint`](crate::SyncEndpoint) operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A patch did not apply and no recovery could take its place.
    #[error("patch against base {base} cannot merge into local state {local}")]
    PatchMismatch { base: Fingerprint, local: Fingerprint },

    /// The recovery handler, or the future it returned, failed.
    #[error("recovery for patch against base {base} failed: {source}")]
    RecoveryFailed {
        base: Fingerprint,
        #[source]
        source: BoxError,
    },

    /// The differ failed while building an outbound patch.
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    /// Message could not be decoded.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Deferred recovery needs a running tokio runtime to schedule on.
    #[error("deferred recovery requires a tokio runtime")]
    NoRuntime,

    /// A pending synchronization was cancelled.
    #[error("sync cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// The base fingerprint of the patch that could not be applied, if any.
    ///
    /// Lets the caller decide whether to request a full resync out of band.
    pub fn attempted_base(&self) -> Option<Fingerprint> {
        match self {
            SyncError::PatchMismatch { base, .. } | SyncError::RecoveryFailed { base, .. } => {
                Some(*base)
            }
            _ => None,
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
