//! The diff/patch collaborator.
//!
//! The sync protocol only needs three things from a differ: compute a patch
//! between two strings, apply a patch to a base, and tell patch metadata
//! apart from anything else. [`Differ`] captures that contract;
//! [`SpliceDiffer`] is the default implementation.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{PatchError, Result};
use crate::fingerprint::{Blake3Fingerprinter, Fingerprint, Fingerprinter};

/// Computes, applies, and decodes patches between string values.
pub trait Differ: Send + Sync + 'static {
    /// The decoded patch representation.
    type Patch: Send;

    /// Produce a patch that turns `base` into `target`.
    fn compute_patch(&self, base: &str, target: &str) -> Result<Self::Patch>;

    /// Apply `patch` to `base`.
    ///
    /// Fails with [`PatchError::Mismatch`] when `base` is not the value the
    /// patch was computed against. Never returns a partially patched value.
    fn apply_patch(&self, base: &str, patch: &Self::Patch) -> Result<String>;

    /// Decode patch metadata; [`PatchError::NotAPatch`] for anything else.
    fn parse_patch(&self, raw: &[u8]) -> Result<Self::Patch>;

    /// Encode a patch into opaque metadata accepted by [`parse_patch`](Self::parse_patch).
    fn encode_patch(&self, patch: &Self::Patch) -> Result<Bytes>;
}

/// A single-splice patch: replace `removed` bytes at `offset` with `inserted`.
///
/// Carries the fingerprints of the base it applies to and of the result it
/// must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplicePatch {
    pub base: Fingerprint,
    pub target: Fingerprint,
    /// Byte offset of the first changed byte in the base.
    pub offset: u64,
    /// Number of base bytes replaced.
    pub removed: u64,
    pub inserted: String,
}

impl SplicePatch {
    /// Whether applying this patch leaves the base unchanged.
    pub fn is_noop(&self) -> bool {
        self.removed == 0 && self.inserted.is_empty()
    }
}

/// Differ producing minimal single-splice patches.
///
/// The splice covers everything between the longest common prefix and the
/// longest common suffix of base and target, with both ends snapped to UTF-8
/// character boundaries.
#[derive(Clone)]
pub struct SpliceDiffer {
    fingerprinter: Arc<dyn Fingerprinter>,
}

impl SpliceDiffer {
    pub fn new() -> Self {
        Self::with_fingerprinter(Arc::new(Blake3Fingerprinter))
    }

    /// Use `fingerprinter` for the base and target fingerprints of patches.
    pub fn with_fingerprinter(fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        Self { fingerprinter }
    }
}

impl Default for SpliceDiffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpliceDiffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpliceDiffer").finish_non_exhaustive()
    }
}

impl Differ for SpliceDiffer {
    type Patch = SplicePatch;

    fn compute_patch(&self, base: &str, target: &str) -> Result<SplicePatch> {
        let prefix = common_prefix(base, target);
        let suffix = common_suffix(base, target, prefix);

        Ok(SplicePatch {
            base: self.fingerprinter.fingerprint(base),
            target: self.fingerprinter.fingerprint(target),
            offset: prefix as u64,
            removed: (base.len() - prefix - suffix) as u64,
            inserted: target[prefix..target.len() - suffix].to_owned(),
        })
    }

    fn apply_patch(&self, base: &str, patch: &SplicePatch) -> Result<String> {
        let actual = self.fingerprinter.fingerprint(base);
        if actual != patch.base {
            return Err(PatchError::Mismatch {
                expected: patch.base,
                actual,
            });
        }

        let corrupt = |reason: &str| PatchError::Corrupt {
            base: patch.base,
            reason: reason.to_owned(),
        };

        let start = usize::try_from(patch.offset).map_err(|_| corrupt("offset overflow"))?;
        let end = usize::try_from(patch.removed)
            .ok()
            .and_then(|removed| start.checked_add(removed))
            .ok_or_else(|| corrupt("splice length overflow"))?;

        if end > base.len() {
            return Err(corrupt("splice extends past end of base"));
        }
        if !base.is_char_boundary(start) || !base.is_char_boundary(end) {
            return Err(corrupt("splice does not fall on a character boundary"));
        }

        let mut patched = String::with_capacity(base.len() - (end - start) + patch.inserted.len());
        patched.push_str(&base[..start]);
        patched.push_str(&patch.inserted);
        patched.push_str(&base[end..]);

        if self.fingerprinter.fingerprint(&patched) != patch.target {
            return Err(corrupt("result does not match target fingerprint"));
        }

        Ok(patched)
    }

    fn parse_patch(&self, raw: &[u8]) -> Result<SplicePatch> {
        ciborium::from_reader(raw).map_err(|e| PatchError::NotAPatch(e.to_string()))
    }

    fn encode_patch(&self, patch: &SplicePatch) -> Result<Bytes> {
        let mut buf = Vec::new();
        ciborium::into_writer(patch, &mut buf).map_err(|e| PatchError::Encoding(e.to_string()))?;
        Ok(Bytes::from(buf))
    }
}

/// Length in bytes of the longest common prefix, on a char boundary of both.
fn common_prefix(a: &str, b: &str) -> usize {
    let mut len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(len) || !b.is_char_boundary(len) {
        len -= 1;
    }
    len
}

/// Length in bytes of the longest common suffix not overlapping `prefix`.
fn common_suffix(a: &str, b: &str, prefix: usize) -> usize {
    let max = a.len().min(b.len()) - prefix;
    let mut len = a
        .bytes()
        .rev()
        .zip(b.bytes().rev())
        .take(max)
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(a.len() - len) || !b.is_char_boundary(b.len() - len) {
        len -= 1;
    }
    len
}
