//! # textsync
//!
//! Keeps two copies of a mutable string consistent across an unreliable
//! channel while sending as little as possible.
//!
//! ## Overview
//!
//! - **Fingerprints**: every value is addressed by a digest of its content
//! - **History**: each endpoint remembers recent values by fingerprint, in a
//!   bounded LRU cache
//! - **Protocol**: a peer reporting a fingerprint we remember gets a patch;
//!   anyone else gets the full value
//! - **Recovery**: a patch that no longer applies is handed to a caller
//!   handler, which may answer now or later
//!
//! ## Usage
//!
//! ```rust
//! use textsync::{Fingerprint, SyncCommand, SyncEndpoint};
//!
//! let endpoint = SyncEndpoint::new("hello");
//! let h0 = endpoint.fingerprint();
//! endpoint.set_local("hello world");
//!
//! // The peer still holds "hello": it gets a patch.
//! let command = endpoint.handle_outgoing_sync_request(&h0).unwrap();
//! assert!(command.is_delta());
//!
//! // A peer we know nothing about gets everything.
//! let command = endpoint
//!     .handle_outgoing_sync_request(&Fingerprint::ZERO)
//!     .unwrap();
//! assert_eq!(command, SyncCommand::full_snapshot("hello world"));
//! ```
//!
//! ## Re-exports
//!
//! - `textsync::core` - fingerprints, history cache, differ
//! - `textsync::endpoint` - sync endpoint, commands, recovery

pub use textsync_core as core;
pub use textsync_endpoint as endpoint;

pub use textsync_core::{
    Blake3Fingerprinter, ContentFingerprint, Differ, Fingerprint, Fingerprinter, HistoryCache,
    MemoizedFingerprinter, PatchError, SpliceDiffer, SplicePatch,
};
pub use textsync_endpoint::{
    verify_convergence, BoxError, ConvergenceResult, EndpointBuilder, EndpointConfig,
    EndpointStats, PatchRejection, PendingSync, RecoveryHandler, RecoveryResult, Result,
    SyncCommand, SyncEndpoint, SyncError, SyncOutcome,
};
