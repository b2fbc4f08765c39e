// Property-based tests for the canonical round-trip law.
//
// Sizes and depths are kept small to keep CI fast.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;

use canon_dag_cbor::{decode, decode_exact, encode, Cid, Mode, Value};

fn arb_key() -> impl Strategy<Value = String> {
    // A small alphabet makes equal-length keys and shared prefixes common.
    proptest::collection::vec(proptest::char::range('a', 'e'), 0..6)
        .prop_map(|chars| chars.into_iter().collect())
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(Value::UnsignedInt),
        any::<u64>().prop_map(Value::NegativeInt),
        proptest::collection::vec(any::<u8>(), 0..48).prop_map(Value::Bytes),
        ".{0,24}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::Float),
        proptest::collection::vec(any::<u8>(), 0..40).prop_map(|b| Value::Link(Cid::from_bytes(b))),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 256, 10, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..10).prop_map(Value::Array),
            proptest::collection::btree_map(arb_key(), inner, 0..10).prop_map(|m| {
                Value::map_sorted(m.into_iter().collect()).expect("btree keys are unique")
            }),
        ]
    })
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(v in arb_value()) {
        let bytes = encode(&v, Mode::Plain).unwrap();
        let decoded = decode_exact(&bytes, Mode::Plain).unwrap();
        prop_assert_eq!(decoded, v);
    }

    #[test]
    fn decode_then_encode_reproduces_bytes(v in arb_value()) {
        let bytes = encode(&v, Mode::Plain).unwrap();
        let decoded = decode_exact(&bytes, Mode::Plain).unwrap();
        prop_assert_eq!(encode(&decoded, Mode::Plain).unwrap(), bytes);
    }

    #[test]
    fn atjson_decode_reencodes_to_same_bytes(v in arb_value()) {
        // Keys from arb_key never collide with the `$bytes` / `$link` markers.
        let bytes = encode(&v, Mode::Plain).unwrap();
        let json_model = decode_exact(&bytes, Mode::AtJson).unwrap();
        prop_assert_eq!(encode(&json_model, Mode::AtJson).unwrap(), bytes);
    }

    #[test]
    fn every_strict_prefix_is_truncated(v in arb_value()) {
        let bytes = encode(&v, Mode::Plain).unwrap();
        for cut in 0..bytes.len() {
            let err = decode(&bytes[..cut], Mode::Plain).unwrap_err();
            prop_assert!(err.is_truncation(), "prefix {} gave {:?}", cut, err);
        }
    }

    #[test]
    fn map_entry_order_does_not_change_encoding(
        entries in proptest::collection::btree_map(arb_key(), any::<u64>(), 0..12)
    ) {
        let forward: Vec<(String, Value)> =
            entries.iter().map(|(k, v)| (k.clone(), Value::UnsignedInt(*v))).collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        prop_assert_eq!(
            encode(&Value::Map(forward), Mode::Plain).unwrap(),
            encode(&Value::Map(reversed), Mode::Plain).unwrap()
        );
    }

    #[test]
    fn arbitrary_input_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        if let Ok((v, used)) = decode(&bytes, Mode::Plain) {
            prop_assert!(used <= bytes.len());
            prop_assert_eq!(encode(&v, Mode::Plain).unwrap(), &bytes[..used]);
        }
    }
}
