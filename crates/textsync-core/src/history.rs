//! Snapshot history: a bounded, content-addressed LRU cache.
//!
//! Maps the fingerprint a peer might report back to the exact string that
//! produced it, so an outbound sync can diff against that string instead of
//! resending everything.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::fingerprint::Fingerprint;

/// Default number of snapshots kept per endpoint.
pub const DEFAULT_HISTORY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(20) {
    Some(cap) => cap,
    None => unreachable!(),
};

/// Fixed-capacity map from fingerprint to snapshot with LRU eviction.
///
/// Both [`get`](Self::get) and [`put`](Self::put) count as a use. When full,
/// `put` evicts the least recently used entry before inserting.
#[derive(Debug)]
pub struct HistoryCache {
    entries: LruCache<Fingerprint, String>,
}

impl HistoryCache {
    /// Create an empty cache holding at most `capacity` snapshots.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up a snapshot, marking it most recently used.
    pub fn get(&mut self, key: &Fingerprint) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or refresh a snapshot.
    pub fn put(&mut self, key: Fingerprint, snapshot: String) {
        if let Some((evicted, _)) = self.entries.push(key, snapshot) {
            if evicted != key {
                tracing::trace!(evicted = %evicted, "history entry evicted");
            }
        }
    }

    /// Check for a snapshot without touching recency.
    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.cap()
    }

    /// Keys ordered from most to least recently used.
    pub fn keys(&self) -> Vec<Fingerprint> {
        self.entries.iter().map(|(key, _)| *key).collect()
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn entry(s: &str) -> (Fingerprint, String) {
        (Fingerprint::of(s), s.to_string())
    }

    #[test]
    fn test_put_then_get() {
        let mut cache = HistoryCache::new(cap(4));
        let (key, value) = entry("hello");
        cache.put(key, value);
        assert_eq!(cache.get(&key), Some("hello"));
        assert_eq!(cache.get(&Fingerprint::ZERO), None);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = HistoryCache::new(cap(2));
        let (a, va) = entry("a");
        let (b, vb) = entry("b");
        let (c, vc) = entry("c");

        cache.put(a, va);
        cache.put(b, vb);
        // Touch `a` so `b` becomes the eviction candidate.
        assert!(cache.get(&a).is_some());
        cache.put(c, vc);

        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_overwrite_refreshes_recency() {
        let mut cache = HistoryCache::new(cap(2));
        let (a, va) = entry("a");
        let (b, vb) = entry("b");
        let (c, vc) = entry("c");

        cache.put(a, va.clone());
        cache.put(b, vb);
        cache.put(a, va);
        cache.put(c, vc);

        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert_eq!(cache.keys(), vec![c, a]);
    }

    #[test]
    fn test_contains_does_not_refresh() {
        let mut cache = HistoryCache::new(cap(2));
        let (a, va) = entry("a");
        let (b, vb) = entry("b");
        let (c, vc) = entry("c");

        cache.put(a, va);
        cache.put(b, vb);
        assert!(cache.contains(&a));
        cache.put(c, vc);

        assert!(!cache.contains(&a));
    }

    #[test]
    fn test_default_capacity() {
        let cache = HistoryCache::default();
        assert_eq!(cache.capacity().get(), 20);
        assert!(cache.is_empty());
    }

    proptest! {
        #[test]
        fn test_first_key_evicted_after_capacity_plus_one(capacity in 1usize..32) {
            let mut cache = HistoryCache::new(cap(capacity));
            let keys: Vec<_> = (0..=capacity)
                .map(|i| {
                    let (key, value) = entry(&format!("snapshot-{i}"));
                    cache.put(key, value);
                    key
                })
                .collect();

            prop_assert!(cache.get(&keys[0]).is_none());
            for key in &keys[1..] {
                prop_assert!(cache.get(key).is_some());
            }
            prop_assert_eq!(cache.len(), capacity);
        }
    }
}
