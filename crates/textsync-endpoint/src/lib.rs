//! # textsync Endpoint
//!
//! The protocol side of differential string synchronization.
//!
//! ## Overview
//!
//! A [`SyncEndpoint`] keeps a local string value and a bounded history of
//! snapshots, keyed by fingerprint, that a peer may still hold. When a peer
//! reports its fingerprint, the endpoint answers with a patch against the
//! matching snapshot if it has one, or with the whole value if it does not.
//!
//! ## Key Properties
//!
//! - **Bandwidth-efficient**: patches are sent whenever a base is known
//! - **No partial writes**: a patch that cannot merge never touches the local value
//! - **Recoverable**: rejected patches go to a caller-supplied [`RecoveryHandler`]
//! - **Transport-agnostic**: commands are plain values; framing is the caller's
//!
//! ## Usage
//!
//! ```rust
//! use textsync_endpoint::{SyncCommand, SyncEndpoint};
//!
//! let sender = SyncEndpoint::new("hello");
//! let receiver = SyncEndpoint::new("hello");
//!
//! sender.set_local("hello world");
//! let command = sender
//!     .handle_outgoing_sync_request(&receiver.fingerprint())
//!     .unwrap();
//! assert!(command.is_delta());
//!
//! receiver.handle_incoming_sync_update(command, None).unwrap();
//! assert_eq!(receiver.content(), "hello world");
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Receiver                                Sender
//!   |-------- fingerprint h -------------->|
//!   |                                      |  history[h] hit?
//!   |<------- DeltaPatch / FullSnapshot ---|
//!   |  apply; on mismatch -> recovery      |
//! ```

pub mod convergence;
pub mod endpoint;
pub mod error;
pub mod messages;
pub mod recovery;

pub use convergence::{verify_convergence, ConvergenceResult};
pub use endpoint::{EndpointBuilder, EndpointConfig, EndpointStats, SyncEndpoint};
pub use error::{Result, SyncError};
pub use messages::SyncCommand;
pub use recovery::{
    BoxError, DeferredCommand, PatchRejection, PendingSync, RecoveryHandler, RecoveryResult,
    SyncOutcome,
};
