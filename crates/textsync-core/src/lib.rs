//! # textsync Core
//!
//! Pure primitives for differential string synchronization: fingerprints,
//! the snapshot history cache, and splice patches.
//!
//! This crate contains no I/O and no networking. It is pure computation
//! over strings and their digests.
//!
//! ## Key Types
//!
//! - [`Fingerprint`] - Content address of a string (Blake3 by default)
//! - [`ContentFingerprint`] - A string paired with its always-current fingerprint
//! - [`HistoryCache`] - Bounded LRU map from fingerprint to snapshot
//! - [`Differ`] - The diff/patch collaborator used by the sync protocol
//! - [`SpliceDiffer`] - Default differ producing single-splice patches
//!
//! ## Patch Encoding
//!
//! Splice patches are encoded as CBOR maps. A CBOR map always starts with a
//! byte in `0xA0..=0xBF`, which can never start valid UTF-8, so encoded
//! patches and raw text snapshots never collide on the wire.

pub mod error;
pub mod fingerprint;
pub mod history;
pub mod patch;

pub use error::{PatchError, Result};
pub use fingerprint::{
    Blake3Fingerprinter, ContentFingerprint, Fingerprint, Fingerprinter, MemoizedFingerprinter,
};
pub use history::{HistoryCache, DEFAULT_HISTORY_CAPACITY};
pub use patch::{Differ, SpliceDiffer, SplicePatch};
