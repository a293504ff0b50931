//! # Anchor Merkle Tree — String-Hex Hashing
//!
//! Spec §4.G step 3 and §9 ("Anchor Merkle format"): leaves are hashed as
//! `SHA-256(proof_id_bytes)`, then adjacent **hex-string representations**
//! of nodes are concatenated and rehashed — not the raw sibling bytes.
//! Odd layers duplicate the last node. This is deliberately **not** the
//! workspace's general-purpose domain-separated Merkle Mountain Range;
//! it is a separate, simpler algorithm preserved bit-for-bit from
//! `services/anchor/anchor.py`'s `merkle()` function so that anchors
//! produced by either generation of this system verify identically.
//!
//! Documented quirk (spec §9): because siblings are concatenated as their
//! *hex string* forms (e.g. `"deadbeef...".to_string() +
//! "cafebabe...".to_string()`) and then that concatenated *string* is
//! UTF-8 encoded and hashed, this is not the same digest as concatenating
//! the raw 32-byte node values. The quirk must be preserved for verifier
//! compatibility.

use sha2::{Digest, Sha256};

/// Compute the anchor Merkle root over an ordered sequence of `proof_id`
/// hex strings. Returns `None` for an empty leaf set (spec §4.G step 2:
/// "If none, sleep and continue" — the caller never calls this with zero
/// rows).
pub fn merkle_root(proof_ids: &[String]) -> Option<String> {
    if proof_ids.is_empty() {
        return None;
    }

    let mut layer: Vec<String> = proof_ids.iter().map(|leaf| hash_hex_string(leaf)).collect();

    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len().div_ceil(2));
        let mut i = 0;
        while i < layer.len() {
            let a = &layer[i];
            let b = layer.get(i + 1).unwrap_or(a);
            let combined = format!("{a}{b}");
            next.push(hash_hex_string(&combined));
            i += 2;
        }
        layer = next;
    }

    layer.into_iter().next()
}

fn hash_hex_string(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_leaves_return_none() {
        assert_eq!(merkle_root(&[]), None);
    }

    #[test]
    fn single_leaf_root_is_its_own_hash() {
        let leaf = "abc".to_string();
        let root = merkle_root(&[leaf.clone()]).unwrap();
        assert_eq!(root, hash_hex_string(&leaf));
    }

    #[test]
    fn two_leaves_hash_concatenated_hex_strings() {
        let a = "aaaa".to_string();
        let b = "bbbb".to_string();
        let root = merkle_root(&[a.clone(), b.clone()]).unwrap();

        let ha = hash_hex_string(&a);
        let hb = hash_hex_string(&b);
        let expected = hash_hex_string(&format!("{ha}{hb}"));
        assert_eq!(root, expected);
    }

    #[test]
    fn odd_count_duplicates_last_node() {
        let leaves = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let root = merkle_root(&leaves).unwrap();

        let ha = hash_hex_string("a");
        let hb = hash_hex_string("b");
        let hc = hash_hex_string("c");
        let left = hash_hex_string(&format!("{ha}{hb}"));
        let right = hash_hex_string(&format!("{hc}{hc}"));
        let expected = hash_hex_string(&format!("{left}{right}"));
        assert_eq!(root, expected);
    }

    #[test]
    fn deterministic_across_calls() {
        let leaves = vec!["x".to_string(), "y".to_string(), "z".to_string(), "w".to_string()];
        assert_eq!(merkle_root(&leaves), merkle_root(&leaves));
    }

    #[test]
    fn order_sensitive() {
        let a = vec!["1".to_string(), "2".to_string()];
        let b = vec!["2".to_string(), "1".to_string()];
        assert_ne!(merkle_root(&a), merkle_root(&b));
    }

    #[test]
    fn known_vector_empty_string_leaf() {
        // SHA-256("") = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        let root = merkle_root(&["".to_string()]).unwrap();
        assert_eq!(root, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }
}
