//! Content fingerprints.
//!
//! A [`Fingerprint`] is the content address of a string. The sync protocol
//! uses it as the key of the snapshot history, so it must never go stale:
//! [`ContentFingerprint`] recomputes it on every mutation.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use serde::{Deserialize, Serialize};

/// A 32-byte content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Compute the Blake3 fingerprint of a string.
    pub fn of(content: &str) -> Self {
        Self(*blake3::hash(content.as_bytes()).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero fingerprint (sentinel for "nothing seen yet").
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Computes fingerprints of string content.
///
/// Implementations must be deterministic: the same content always maps to
/// the same fingerprint, whatever caching happens underneath.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, content: &str) -> Fingerprint;
}

/// Stateless Blake3 fingerprinter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Fingerprinter;

impl Fingerprinter for Blake3Fingerprinter {
    fn fingerprint(&self, content: &str) -> Fingerprint {
        Fingerprint::of(content)
    }
}

/// A fingerprinter that remembers recent results in a bounded LRU memo.
///
/// A capacity of zero disables the memo and forwards every call.
pub struct MemoizedFingerprinter<F = Blake3Fingerprinter> {
    inner: F,
    memo: Option<Mutex<LruCache<String, Fingerprint>>>,
}

impl MemoizedFingerprinter<Blake3Fingerprinter> {
    /// Create a memoized Blake3 fingerprinter.
    pub fn new(capacity: usize) -> Self {
        Self::wrap(Blake3Fingerprinter, capacity)
    }
}

impl<F: Fingerprinter> MemoizedFingerprinter<F> {
    /// Memoize an arbitrary fingerprinter.
    pub fn wrap(inner: F, capacity: usize) -> Self {
        let memo = NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self { inner, memo }
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.memo
            .as_ref()
            .map_or(0, |memo| memo.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    /// Whether the memo holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of memoized entries (zero when disabled).
    pub fn capacity(&self) -> usize {
        self.memo.as_ref().map_or(0, |memo| {
            memo.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cap()
                .get()
        })
    }
}

impl<F: Fingerprinter> Fingerprinter for MemoizedFingerprinter<F> {
    fn fingerprint(&self, content: &str) -> Fingerprint {
        let Some(memo) = &self.memo else {
            return self.inner.fingerprint(content);
        };
        let mut memo = memo.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(fingerprint) = memo.get(content) {
            tracing::trace!(fingerprint = %fingerprint, "fingerprint memo hit");
            return *fingerprint;
        }
        let fingerprint = self.inner.fingerprint(content);
        memo.put(content.to_owned(), fingerprint);
        fingerprint
    }
}

impl<F> fmt::Debug for MemoizedFingerprinter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizedFingerprinter")
            .field("enabled", &self.memo.is_some())
            .finish()
    }
}

/// A string value paired with its fingerprint.
///
/// The fingerprint is recomputed synchronously on every [`set`](Self::set),
/// so callers can use it as a cache key without ever observing a stale value.
#[derive(Clone)]
pub struct ContentFingerprint {
    content: String,
    fingerprint: Fingerprint,
    fingerprinter: Arc<dyn Fingerprinter>,
}

impl ContentFingerprint {
    /// Wrap `content`, fingerprinting it with `fingerprinter`.
    pub fn new(content: impl Into<String>, fingerprinter: Arc<dyn Fingerprinter>) -> Self {
        let content = content.into();
        let fingerprint = fingerprinter.fingerprint(&content);
        Self {
            content,
            fingerprint,
            fingerprinter,
        }
    }

    /// Wrap `content` using the plain Blake3 fingerprinter.
    pub fn blake3(content: impl Into<String>) -> Self {
        Self::new(content, Arc::new(Blake3Fingerprinter))
    }

    /// Replace the content and recompute the fingerprint.
    pub fn set(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.fingerprint = self.fingerprinter.fingerprint(&self.content);
    }

    /// Read the content together with its fingerprint.
    pub fn get(&self) -> (&str, Fingerprint) {
        (&self.content, self.fingerprint)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

impl fmt::Debug for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentFingerprint")
            .field("len", &self.content.len())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hex_roundtrip() {
        let fp = Fingerprint::of("hello");
        let parsed = Fingerprint::from_hex(&fp.to_hex()).unwrap();
        assert_eq!(fp, parsed);
        assert_eq!(fp.to_string().len(), 64);
    }

    #[test]
    fn test_from_hex_rejects_short_input() {
        assert!(Fingerprint::from_hex("abcd").is_err());
    }

    #[test]
    fn test_set_recomputes_fingerprint() {
        let mut value = ContentFingerprint::blake3("hello");
        let h0 = value.fingerprint();
        assert_eq!(h0, Fingerprint::of("hello"));

        value.set("hello world");
        let (content, h1) = value.get();
        assert_eq!(content, "hello world");
        assert_eq!(h1, Fingerprint::of("hello world"));
        assert_ne!(h0, h1);
    }

    #[test]
    fn test_set_same_value_is_idempotent() {
        let mut value = ContentFingerprint::blake3("same");
        value.set("same");
        let first = value.fingerprint();
        value.set("same");
        assert_eq!(first, value.fingerprint());
    }

    #[test]
    fn test_memo_is_bounded() {
        let memo = MemoizedFingerprinter::new(2);
        memo.fingerprint("a");
        memo.fingerprint("b");
        memo.fingerprint("c");
        assert_eq!(memo.len(), 2);
        assert_eq!(memo.capacity(), 2);
    }

    #[test]
    fn test_memo_disabled_with_zero_capacity() {
        let memo = MemoizedFingerprinter::new(0);
        assert_eq!(memo.fingerprint("a"), Fingerprint::of("a"));
        assert!(memo.is_empty());
        assert_eq!(memo.capacity(), 0);
    }

    proptest! {
        #[test]
        fn test_memo_is_transparent(inputs in prop::collection::vec(".{0,16}", 1..32)) {
            let memo = MemoizedFingerprinter::new(4);
            let plain = Blake3Fingerprinter;
            for input in inputs.iter().chain(inputs.iter()) {
                prop_assert_eq!(memo.fingerprint(input), plain.fingerprint(input));
            }
        }
    }
}
