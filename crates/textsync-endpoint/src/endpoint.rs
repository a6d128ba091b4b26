//! The sync endpoint state machine.
//!
//! Decides between a full snapshot and a delta patch on the way out, applies
//! incoming commands on the way in, and drives recovery when a patch cannot
//! merge.
//!
//! Every operation ends by recording the current local value into the
//! history, keyed by its fingerprint, so the next round can diff against it.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use textsync_core::{
    ContentFingerprint, Differ, Fingerprint, Fingerprinter, HistoryCache, MemoizedFingerprinter,
    SpliceDiffer, DEFAULT_HISTORY_CAPACITY,
};

use crate::error::{Result, SyncError};
use crate::messages::{Incoming, SyncCommand};
use crate::recovery::{
    DeferredCommand, PatchRejection, PendingSync, RecoveryHandler, RecoveryResult, SyncOutcome,
};

/// Configuration for an endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Number of past snapshots kept for diffing.
    pub history_capacity: NonZeroUsize,
    /// Size of the fingerprint memo (0 disables it).
    pub fingerprint_memo_capacity: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            fingerprint_memo_capacity: 0,
        }
    }
}

/// Counters describing what an endpoint has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointStats {
    /// Outbound requests answered with a patch.
    pub deltas_sent: u64,
    /// Outbound requests answered with the whole value.
    pub snapshots_sent: u64,
    /// Incoming patches applied.
    pub patches_applied: u64,
    /// Incoming snapshots applied.
    pub snapshots_applied: u64,
    /// Recovery handler invocations.
    pub recoveries: u64,
    /// Recoveries that returned a future.
    pub deferred_recoveries: u64,
}

/// Builder for [`SyncEndpoint`].
pub struct EndpointBuilder<D = SpliceDiffer> {
    initial: String,
    config: EndpointConfig,
    fingerprinter: Option<Arc<dyn Fingerprinter>>,
    differ: D,
}

impl EndpointBuilder<SpliceDiffer> {
    /// Start building an endpoint whose local value is `initial`.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            initial: initial.into(),
            config: EndpointConfig::default(),
            fingerprinter: None,
            differ: SpliceDiffer::new(),
        }
    }
}

impl<D: Differ> EndpointBuilder<D> {
    pub fn config(mut self, config: EndpointConfig) -> Self {
        self.config = config;
        self
    }

    pub fn history_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// Fingerprint the local value with `fingerprinter` instead of a
    /// (possibly memoized) Blake3 fingerprinter. The differ keeps its own.
    pub fn fingerprinter(mut self, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        self.fingerprinter = Some(fingerprinter);
        self
    }

    /// Swap in a different diff/patch collaborator.
    pub fn differ<D2: Differ>(self, differ: D2) -> EndpointBuilder<D2> {
        EndpointBuilder {
            initial: self.initial,
            config: self.config,
            fingerprinter: self.fingerprinter,
            differ,
        }
    }

    /// Build the endpoint. The initial value is recorded in the history.
    pub fn build(self) -> SyncEndpoint<D> {
        let memo_capacity = self.config.fingerprint_memo_capacity;
        let fingerprinter: Arc<dyn Fingerprinter> = match self.fingerprinter {
            Some(fingerprinter) => fingerprinter,
            None => Arc::new(MemoizedFingerprinter::new(memo_capacity)),
        };

        let mut state = EndpointState {
            local: ContentFingerprint::new(self.initial, fingerprinter),
            history: HistoryCache::new(self.config.history_capacity),
            stats: EndpointStats::default(),
        };
        state.remember();

        SyncEndpoint {
            state: Arc::new(Mutex::new(state)),
            differ: Arc::new(self.differ),
        }
    }
}

/// One side of a string synchronization.
///
/// Owns the local value and a history of snapshots it believes the peer may
/// hold. Cloning yields another handle to the same endpoint; every operation
/// locks the whole endpoint for its duration.
pub struct SyncEndpoint<D: Differ = SpliceDiffer> {
    state: Arc<Mutex<EndpointState>>,
    differ: Arc<D>,
}

impl<D: Differ> Clone for SyncEndpoint<D> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            differ: Arc::clone(&self.differ),
        }
    }
}

impl SyncEndpoint<SpliceDiffer> {
    /// Create an endpoint with default configuration and the splice differ.
    pub fn new(initial: impl Into<String>) -> Self {
        EndpointBuilder::new(initial).build()
    }

    pub fn builder(initial: impl Into<String>) -> EndpointBuilder<SpliceDiffer> {
        EndpointBuilder::new(initial)
    }
}

impl<D: Differ> SyncEndpoint<D> {
    fn lock(&self) -> MutexGuard<'_, EndpointState> {
        // Every mutation leaves content and fingerprint consistent, so a
        // poisoned lock still guards valid state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer a peer that reports `remote_reported` as its current fingerprint.
    ///
    /// Returns a [`SyncCommand::DeltaPatch`] when that fingerprint is in the
    /// history, a [`SyncCommand::FullSnapshot`] otherwise. The current local
    /// value is recorded in the history either way, even if building the
    /// patch fails.
    pub fn handle_outgoing_sync_request(&self, remote_reported: &Fingerprint) -> Result<SyncCommand> {
        let mut state = self.lock();
        let command = state.build_command(&*self.differ, remote_reported);
        state.remember();
        command
    }

    /// Apply an incoming command to the local value.
    ///
    /// When a patch cannot merge, `recovery` is asked for a replacement:
    /// an immediate command is applied in this call (without a second
    /// recovery), a deferred one is applied by a spawned continuation and
    /// the call returns [`SyncOutcome::Pending`]. Without a handler the
    /// failure surfaces as [`SyncError::PatchMismatch`].
    ///
    /// The endpoint is unlocked while the handler runs. A `set_local` made
    /// in that window is overwritten by the recovered command and never
    /// recorded in the history.
    pub fn handle_incoming_sync_update(
        &self,
        message: SyncCommand,
        recovery: Option<&dyn RecoveryHandler>,
    ) -> Result<SyncOutcome> {
        let mut state = self.lock();
        let applied = state.apply(&*self.differ, message);

        let (rejection, handler) = match (applied, recovery) {
            (Err(ApplyError::Rejected(rejection)), Some(handler)) => (rejection, handler),
            (applied, _) => {
                state.remember();
                return applied
                    .map(|()| SyncOutcome::Applied)
                    .map_err(SyncError::from);
            }
        };

        // The handler may read this endpoint.
        drop(state);
        self.recover(rejection, handler)
    }

    fn recover(&self, rejection: PatchRejection, handler: &dyn RecoveryHandler) -> Result<SyncOutcome> {
        let base = rejection.base;
        let recovered = handler.recover(&rejection);

        let mut state = self.lock();
        state.stats.recoveries += 1;

        let outcome = match recovered {
            Err(source) => {
                tracing::warn!(base = ?base, "recovery handler failed: {}", source);
                Err(SyncError::RecoveryFailed { base, source })
            }
            Ok(RecoveryResult::Immediate(command)) => state
                .apply(&*self.differ, command)
                .map(|()| SyncOutcome::Applied)
                .map_err(SyncError::from),
            Ok(RecoveryResult::Deferred(pending)) => {
                state.stats.deferred_recoveries += 1;
                self.defer(base, pending).map(SyncOutcome::Pending)
            }
        };

        state.remember();
        outcome
    }

    /// Schedule a continuation that applies the deferred command once it resolves.
    fn defer(&self, base: Fingerprint, pending: DeferredCommand) -> Result<PendingSync> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let endpoint = self.clone();

        let handle = runtime.spawn(async move {
            let command = match pending.await {
                Ok(command) => command,
                Err(source) => {
                    tracing::warn!(base = ?base, "deferred recovery failed: {}", source);
                    return Err(SyncError::RecoveryFailed { base, source });
                }
            };
            endpoint
                .handle_incoming_sync_update(command, None)
                .map(|_| ())
        });

        tracing::debug!(base = ?base, "deferred recovery scheduled");
        Ok(PendingSync::new(base, handle))
    }

    /// Replace the local value. Recorded in the history by the next sync operation.
    pub fn set_local(&self, content: impl Into<String>) {
        self.lock().local.set(content);
    }

    pub fn content(&self) -> String {
        self.lock().local.content().to_owned()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.lock().local.fingerprint()
    }

    /// The local value together with its fingerprint, read atomically.
    pub fn snapshot(&self) -> (String, Fingerprint) {
        let state = self.lock();
        let (content, fingerprint) = state.local.get();
        (content.to_owned(), fingerprint)
    }

    pub fn stats(&self) -> EndpointStats {
        self.lock().stats
    }

    /// Whether the history holds a snapshot for `fingerprint` (recency untouched).
    pub fn has_snapshot(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().history.contains(fingerprint)
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn history_capacity(&self) -> NonZeroUsize {
        self.lock().history.capacity()
    }

    pub fn differ(&self) -> &D {
        &self.differ
    }
}

impl<D: Differ> std::fmt::Debug for SyncEndpoint<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SyncEndpoint")
            .field("local", &state.local)
            .field("history_len", &state.history.len())
            .finish()
    }
}

/// State guarded by the endpoint lock.
struct EndpointState {
    local: ContentFingerprint,
    history: HistoryCache,
    stats: EndpointStats,
}

/// Why an incoming command was not applied.
enum ApplyError {
    /// The patch cannot merge; recovery may replace it.
    Rejected(PatchRejection),
    Fatal(SyncError),
}

impl From<SyncError> for ApplyError {
    fn from(e: SyncError) -> Self {
        ApplyError::Fatal(e)
    }
}

impl From<ApplyError> for SyncError {
    fn from(e: ApplyError) -> Self {
        match e {
            ApplyError::Rejected(rejection) => SyncError::PatchMismatch {
                base: rejection.base,
                local: rejection.local,
            },
            ApplyError::Fatal(e) => e,
        }
    }
}

impl EndpointState {
    /// Record the current local value under its fingerprint.
    fn remember(&mut self) {
        let (content, fingerprint) = self.local.get();
        self.history.put(fingerprint, content.to_owned());
    }

    fn build_command<D: Differ>(&mut self, differ: &D, remote: &Fingerprint) -> Result<SyncCommand> {
        let Some(base) = self.history.get(remote) else {
            tracing::debug!(remote = ?remote, "remote state unknown, sending full snapshot");
            self.stats.snapshots_sent += 1;
            return Ok(SyncCommand::full_snapshot(self.local.content()));
        };

        let patch = differ.compute_patch(base, self.local.content())?;
        let metadata = differ.encode_patch(&patch)?;
        tracing::debug!(
            remote = ?remote,
            local = ?self.local.fingerprint(),
            bytes = metadata.len(),
            "sending delta patch"
        );
        self.stats.deltas_sent += 1;
        Ok(SyncCommand::DeltaPatch { metadata })
    }

    /// Apply a command. The local value is only changed on success.
    fn apply<D: Differ>(&mut self, differ: &D, command: SyncCommand) -> std::result::Result<(), ApplyError> {
        let kind = command.kind();
        match command.interpret(differ)? {
            Incoming::Snapshot(content) => {
                self.local.set(content);
                self.stats.snapshots_applied += 1;
                tracing::debug!(kind, local = ?self.local.fingerprint(), "applied full snapshot");
                Ok(())
            }
            Incoming::Patch(patch) => match differ.apply_patch(self.local.content(), &patch) {
                Ok(patched) => {
                    self.local.set(patched);
                    self.stats.patches_applied += 1;
                    tracing::debug!(kind, local = ?self.local.fingerprint(), "applied delta patch");
                    Ok(())
                }
                Err(error) => {
                    let Some(base) = error.base() else {
                        return Err(ApplyError::Fatal(error.into()));
                    };
                    let local = self.local.fingerprint();
                    tracing::warn!(base = ?base, local = ?local, "patch rejected: {}", error);
                    Err(ApplyError::Rejected(PatchRejection { base, local, error }))
                }
            },
        }
    }
}
