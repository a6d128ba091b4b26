//! Recovery from patches that cannot merge.
//!
//! When an incoming patch was computed against a base this endpoint no
//! longer holds, the caller-supplied [`RecoveryHandler`] produces a
//! replacement command, either right away or as a future.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinHandle;

use textsync_core::{Fingerprint, PatchError};

use crate::error::{Result, SyncError};
use crate::messages::SyncCommand;

/// Boxed error returned by recovery handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A replacement command that will be available later.
pub type DeferredCommand =
    Pin<Box<dyn Future<Output = std::result::Result<SyncCommand, BoxError>> + Send + 'static>>;

/// Details of a patch the endpoint refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRejection {
    /// Base fingerprint the patch was computed against.
    pub base: Fingerprint,
    /// Fingerprint of the local value the patch was tried on.
    pub local: Fingerprint,
    pub error: PatchError,
}

/// What a recovery handler hands back.
pub enum RecoveryResult {
    /// A replacement command to apply in the same call.
    Immediate(SyncCommand),
    /// A replacement command that arrives once the future resolves.
    Deferred(DeferredCommand),
}

impl RecoveryResult {
    /// Wrap a future as a deferred recovery.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = std::result::Result<SyncCommand, BoxError>> + Send + 'static,
    {
        RecoveryResult::Deferred(Box::pin(future))
    }
}

impl fmt::Debug for RecoveryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryResult::Immediate(cmd) => f.debug_tuple("Immediate").field(cmd).finish(),
            RecoveryResult::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Caller logic invoked when an incoming patch cannot be applied.
///
/// Called at most once per incoming update. The endpoint is not locked
/// while the handler runs, so it may read the endpoint it recovers.
pub trait RecoveryHandler {
    fn recover(&self, rejection: &PatchRejection) -> std::result::Result<RecoveryResult, BoxError>;
}

impl<F> RecoveryHandler for F
where
    F: Fn(&PatchRejection) -> std::result::Result<RecoveryResult, BoxError>,
{
    fn recover(&self, rejection: &PatchRejection) -> std::result::Result<RecoveryResult, BoxError> {
        self(rejection)
    }
}

/// Outcome of an incoming update.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The local value is up to date.
    Applied,
    /// Synchronization completes once the deferred recovery resolves.
    Pending(PendingSync),
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SyncOutcome::Pending(_))
    }
}

/// Handle to a continuation waiting on deferred recovery.
///
/// Dropping the handle detaches the continuation; it still runs.
#[derive(Debug)]
pub struct PendingSync {
    base: Fingerprint,
    handle: JoinHandle<Result<()>>,
}

impl PendingSync {
    pub(crate) fn new(base: Fingerprint, handle: JoinHandle<Result<()>>) -> Self {
        Self { base, handle }
    }

    /// Base fingerprint of the patch that triggered recovery.
    pub fn base(&self) -> Fingerprint {
        self.base
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abandon the continuation. Local content is untouched unless it had
    /// already been applied.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Wait for the continuation to apply the recovered command.
    pub async fn wait(self) -> Result<()> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(SyncError::Cancelled),
            Err(e) => Err(SyncError::Internal(format!("recovery task panicked: {e}"))),
        }
    }
}
