//! # Canonical Serialization — JCS Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes used in
//! digest computation and signing across the entire decision stack.
//!
//! ## Security Invariant
//!
//! `CanonicalBytes` has a private inner field. The only way to construct one
//! is through `CanonicalBytes::new()`, which rejects floats and then applies
//! RFC 8785 (JSON Canonicalization Scheme) serialization: sorted keys,
//! compact separators, deterministic byte sequence. Any function that signs
//! or hashes a bundle must accept `&CanonicalBytes` — it is a compile error
//! to pass it raw `serde_json` output instead.
//!
//! Amounts are modeled as `rust_decimal::Decimal` and serialize to JSON
//! strings, so they never hit the float-rejection path; `ts` fields use
//! `decision_core::Timestamp`, which always serializes without sub-second
//! precision, so canonicalization never needs to second-guess timestamp
//! formatting.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS-canonical serialization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Floating point numbers are rejected.
/// - Object keys are sorted lexicographically with compact separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// This is the ONLY way to construct `CanonicalBytes`. All signing and
    /// digest computation in the decision stack must flow through this
    /// constructor.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let bytes = serde_jcs::to_string(&value)
            .map_err(|e| CanonicalizationError::JcsFailed(e.to_string()))?
            .into_bytes();
        Ok(Self(bytes))
    }

    /// Access the canonical bytes for digest computation or signing.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively reject non-integer floats in a JSON value tree.
///
/// Matches the contract in spec §9: numeric encoding must be deterministic,
/// and floats have non-deterministic JCS serialization edge cases across
/// implementations, so they are rejected outright rather than risking a
/// cross-language mismatch.
fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Object(map) => {
            for v in map.values() {
                reject_floats(v)?;
            }
            Ok(())
        }
        Value::Array(arr) => {
            for v in arr {
                reject_floats(v)?;
            }
            Ok(())
        }
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_keys_compact_separators() {
        let data = serde_json::json!({"b": 2, "a": 1, "c": "hello"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"{"a":1,"b":2,"c":"hello"}"#
        );
    }

    #[test]
    fn nested_objects_sorted() {
        let data = serde_json::json!({"outer": {"b": 2, "a": 1}, "list": [3, 2, 1]});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#
        );
    }

    #[test]
    fn float_rejected() {
        let data = serde_json::json!({"amount": 1.5});
        let err = CanonicalBytes::new(&data).unwrap_err();
        match err {
            CanonicalizationError::FloatRejected(f) => assert_eq!(f, 1.5),
            other => panic!("expected FloatRejected, got {other}"),
        }
    }

    #[test]
    fn integer_amount_accepted() {
        let data = serde_json::json!({"amount": 4200});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(std::str::from_utf8(cb.as_bytes()).unwrap(), r#"{"amount":4200}"#);
    }

    #[test]
    fn string_amount_accepted() {
        let data = serde_json::json!({"amount": "42.00"});
        let cb = CanonicalBytes::new(&data).unwrap();
        assert_eq!(
            std::str::from_utf8(cb.as_bytes()).unwrap(),
            r#"{"amount":"42.00"}"#
        );
    }

    #[test]
    fn deterministic_across_calls() {
        let data = serde_json::json!({"z": 1, "m": 2, "a": 3});
        let a = CanonicalBytes::new(&data).unwrap();
        let b = CanonicalBytes::new(&data).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn empty_object_and_array() {
        assert_eq!(CanonicalBytes::new(&serde_json::json!({})).unwrap().as_bytes(), b"{}");
        assert_eq!(CanonicalBytes::new(&serde_json::json!([])).unwrap().as_bytes(), b"[]");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value_no_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,50}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,10}", inner, 0..8)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn never_panics(value in json_value_no_floats()) {
            prop_assert!(CanonicalBytes::new(&value).is_ok());
        }

        #[test]
        fn deterministic(value in json_value_no_floats()) {
            let a = CanonicalBytes::new(&value).unwrap();
            let b = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn valid_utf8_and_json(value in json_value_no_floats()) {
            let cb = CanonicalBytes::new(&value).unwrap();
            prop_assert!(std::str::from_utf8(cb.as_bytes()).is_ok());
            let parsed: Result<Value, _> = serde_json::from_slice(cb.as_bytes());
            prop_assert!(parsed.is_ok());
        }

        #[test]
        fn float_always_rejected(f in any::<f64>().prop_filter("not integer", |f| f.fract() != 0.0 && f.is_finite())) {
            let data = serde_json::json!({"val": f});
            prop_assert!(CanonicalBytes::new(&data).is_err());
        }
    }
}
