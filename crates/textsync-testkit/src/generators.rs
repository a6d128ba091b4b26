//! Proptest generators for property-based testing.

use proptest::prelude::*;

use textsync_core::Fingerprint;

/// Generate printable text of at most `max_chars` characters.
pub fn text(max_chars: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>().prop_filter("printable", |c| !c.is_control()), 0..=max_chars)
        .prop_map(String::from_iter)
}

/// Generate a random fingerprint.
pub fn fingerprint() -> impl Strategy<Value = Fingerprint> {
    any::<[u8; 32]>().prop_map(Fingerprint::from_bytes)
}

/// Generate `count` distinct snapshot strings.
pub fn distinct_snapshots(count: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(text(24), count).prop_map(|set| set.into_iter().collect())
}

/// A base value and an edited version of it.
#[derive(Debug, Clone)]
pub struct EditParams {
    pub base: String,
    pub target: String,
}

impl Arbitrary for EditParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            text(64),
            any::<prop::sample::Index>(), // splice start
            0usize..=16,                  // chars removed
            text(16),                     // inserted
        )
            .prop_map(|(base, start, removed, inserted)| {
                let target = splice_chars(&base, start, removed, &inserted);
                EditParams { base, target }
            })
            .boxed()
    }
}

/// Replace `removed` chars at a char position picked by `start` with `inserted`.
fn splice_chars(base: &str, start: prop::sample::Index, removed: usize, inserted: &str) -> String {
    let chars: Vec<char> = base.chars().collect();
    let start = start.index(chars.len() + 1);
    let end = (start + removed).min(chars.len());

    chars[..start]
        .iter()
        .copied()
        .chain(inserted.chars())
        .chain(chars[end..].iter().copied())
        .collect()
}
