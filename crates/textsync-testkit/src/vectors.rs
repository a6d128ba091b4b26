//! Golden splice vectors.
//!
//! Every differ producing splice patches must agree on where the splice
//! starts, how much it removes, and what it inserts. These vectors pin that
//! down, including UTF-8 boundary handling.

use serde::{Deserialize, Serialize};

use textsync_core::{Differ, SpliceDiffer};

/// A single golden splice vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpliceVector {
    pub name: String,
    pub base: String,
    pub target: String,

    // Expected splice
    pub offset: u64,
    pub removed: u64,
    pub inserted: String,
}

fn vector(name: &str, base: &str, target: &str, offset: u64, removed: u64, inserted: &str) -> SpliceVector {
    SpliceVector {
        name: name.to_string(),
        base: base.to_string(),
        target: target.to_string(),
        offset,
        removed,
        inserted: inserted.to_string(),
    }
}

/// All golden vectors.
pub fn all_vectors() -> Vec<SpliceVector> {
    vec![
        vector("append", "hello", "hello world", 5, 0, " world"),
        vector("prepend", "world", "hello world", 0, 0, "hello "),
        vector("replace_middle", "the quick fox", "the slow fox", 4, 5, "slow"),
        vector("delete_all", "abc", "", 0, 3, ""),
        vector("from_empty", "", "abc", 0, 0, "abc"),
        vector("identical", "same", "same", 4, 0, ""),
        vector("shared_utf8_lead_byte", "café", "cafè", 3, 2, "è"),
        vector("repeated_chars", "aaa", "aaaa", 3, 0, "a"),
    ]
}

/// Check one vector against the splice differ.
pub fn verify_vector(vector: &SpliceVector) -> Result<(), String> {
    let differ = SpliceDiffer::new();
    let patch = differ
        .compute_patch(&vector.base, &vector.target)
        .map_err(|e| e.to_string())?;

    if (patch.offset, patch.removed, patch.inserted.as_str())
        != (vector.offset, vector.removed, vector.inserted.as_str())
    {
        return Err(format!(
            "expected splice ({}, {}, {:?}), got ({}, {}, {:?})",
            vector.offset, vector.removed, vector.inserted, patch.offset, patch.removed, patch.inserted
        ));
    }

    let applied = differ
        .apply_patch(&vector.base, &patch)
        .map_err(|e| e.to_string())?;
    if applied != vector.target {
        return Err(format!("patched to {applied:?}, expected {:?}", vector.target));
    }

    Ok(())
}

/// Verify every vector, returning the names and errors of any that fail.
pub fn verify_all_vectors() -> Vec<(String, String)> {
    all_vectors()
        .iter()
        .filter_map(|v| verify_vector(v).err().map(|e| (v.name.clone(), e)))
        .collect()
}

/// Serialize the vectors for other implementations to check against.
pub fn vectors_json() -> String {
    serde_json::to_string_pretty(&all_vectors()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_pass() {
        let failures = verify_all_vectors();
        assert!(failures.is_empty(), "failing vectors: {failures:?}");
    }

    #[test]
    fn test_vectors_json_roundtrip() {
        let parsed: Vec<SpliceVector> = serde_json::from_str(&vectors_json()).unwrap();
        assert_eq!(parsed.len(), all_vectors().len());
    }
}
