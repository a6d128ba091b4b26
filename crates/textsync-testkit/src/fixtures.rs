//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: paired endpoints, scripted
//! recovery handlers, and log capture.

use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

use textsync_endpoint::{
    BoxError, PatchRejection, RecoveryHandler, RecoveryResult, Result, SyncCommand, SyncEndpoint,
    SyncOutcome,
};

/// Install a fmt subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

/// Two endpoints that start from the same value.
pub struct EndpointPair {
    pub sender: SyncEndpoint,
    pub receiver: SyncEndpoint,
}

impl EndpointPair {
    pub fn new(initial: &str) -> Self {
        Self {
            sender: SyncEndpoint::new(initial),
            receiver: SyncEndpoint::new(initial),
        }
    }

    /// One round: the receiver reports its fingerprint, the sender answers,
    /// the receiver applies. Returns the command that crossed the wire.
    pub fn sync(&self) -> Result<(SyncCommand, SyncOutcome)> {
        let command = self
            .sender
            .handle_outgoing_sync_request(&self.receiver.fingerprint())?;
        let outcome = self
            .receiver
            .handle_incoming_sync_update(command.clone(), None)?;
        Ok((command, outcome))
    }

    /// Whether both sides hold the same value.
    pub fn converged(&self) -> bool {
        self.sender.fingerprint() == self.receiver.fingerprint()
    }
}

/// Recovery that immediately requests a full snapshot from `source`.
pub fn resync_from(source: &SyncEndpoint) -> impl RecoveryHandler + '_ {
    move |_: &PatchRejection| -> std::result::Result<RecoveryResult, BoxError> {
        Ok(RecoveryResult::Immediate(SyncCommand::full_snapshot(
            source.content(),
        )))
    }
}

/// Recovery that always fails.
pub fn failing_recovery(reason: &'static str) -> impl RecoveryHandler {
    move |_: &PatchRejection| -> std::result::Result<RecoveryResult, BoxError> {
        Err(BoxError::from(reason))
    }
}

/// Recovery whose replacement command is supplied later through a channel.
pub struct DeferredRecovery {
    receiver: Mutex<Option<oneshot::Receiver<SyncCommand>>>,
    rejections: Mutex<Vec<PatchRejection>>,
}

impl DeferredRecovery {
    /// Create the handler and the sender that resolves it.
    pub fn new() -> (Self, oneshot::Sender<SyncCommand>) {
        let (tx, rx) = oneshot::channel();
        let handler = Self {
            receiver: Mutex::new(Some(rx)),
            rejections: Mutex::new(Vec::new()),
        };
        (handler, tx)
    }

    /// Rejections seen so far.
    pub fn rejections(&self) -> Vec<PatchRejection> {
        self.rejections.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl RecoveryHandler for DeferredRecovery {
    fn recover(&self, rejection: &PatchRejection) -> std::result::Result<RecoveryResult, BoxError> {
        self.rejections.lock().unwrap_or_else(PoisonError::into_inner).push(rejection.clone());
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| BoxError::from("deferred recovery already used"))?;
        Ok(RecoveryResult::deferred(async move {
            receiver.await.map_err(BoxError::from)
        }))
    }
}
