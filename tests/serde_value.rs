#![cfg(feature = "serde")]

use canon_dag_cbor::{decode_exact, encode, Cid, Mode, Value};

#[test]
fn value_serializes_to_json() {
    let v = Value::map_sorted(vec![
        ("n".into(), Value::from(-3i64)),
        ("ok".into(), Value::Bool(true)),
        ("list".into(), Value::Array(vec![Value::Null, Value::Float(1.5)])),
        ("name".into(), Value::from("x")),
    ])
    .unwrap();
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"n": -3, "ok": true, "list": [null, 1.5], "name": "x"})
    );
}

#[test]
fn json_deserializes_to_canonical_value() {
    let v: Value =
        serde_json::from_str(r#"{"zz": 1, "a": [true, null, -1, 2.5], "b": "s"}"#).unwrap();
    let keys: Vec<&str> = v.as_map().unwrap().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["a", "b", "zz"]);
    assert_eq!(v.get("zz"), Some(&Value::UnsignedInt(1)));

    let bytes = encode(&v, Mode::Plain).unwrap();
    assert_eq!(decode_exact(&bytes, Mode::Plain).unwrap(), v);
}

#[test]
fn json_duplicate_keys_are_rejected() {
    let res: Result<Value, _> = serde_json::from_str(r#"{"a": 1, "a": 2}"#);
    assert!(res.is_err());
}

#[test]
fn extreme_integers_survive_serde() {
    let big = Value::UnsignedInt(u64::MAX);
    let json = serde_json::to_string(&big).unwrap();
    assert_eq!(json, "18446744073709551615");
    assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), big);

    let neg = Value::from(i64::MIN);
    let json = serde_json::to_string(&neg).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), neg);
}

#[test]
fn atjson_values_travel_through_json() {
    let plain = Value::map_sorted(vec![
        ("blob".into(), Value::Bytes(b"hello".to_vec())),
        ("link".into(), Value::Link(Cid::from_slice(b"blah"))),
    ])
    .unwrap();
    let bytes = encode(&plain, Mode::Plain).unwrap();
    let json_model = decode_exact(&bytes, Mode::AtJson).unwrap();

    let text = serde_json::to_string(&json_model).unwrap();
    assert_eq!(
        text,
        r#"{"blob":{"$bytes":"aGVsbG8"},"link":{"$link":"bmjwgc2a"}}"#
    );

    let back: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(encode(&back, Mode::AtJson).unwrap(), bytes);
}

#[test]
fn cid_deserializes_from_multibase_text() {
    let cid: Cid = serde_json::from_str(r#""bmjwgc2a""#).unwrap();
    assert_eq!(cid, Cid::from_slice(b"blah"));

    let as_json = serde_json::to_string(&cid).unwrap();
    assert_eq!(as_json, "[98,108,97,104]");
    let back: Cid = serde_json::from_str(&as_json).unwrap();
    assert_eq!(back, cid);

    assert!(serde_json::from_str::<Cid>(r#""zQm""#).is_err());
}

#[test]
fn serialization_refuses_hostile_nesting() {
    let mut bytes = vec![0x81; 100_000];
    bytes.push(0x80);
    let deep = decode_exact(&bytes, Mode::Plain).unwrap();
    let err = serde_json::to_string(&deep).unwrap_err();
    assert!(err.to_string().contains("nesting depth limit exceeded"));

    let mut shallow = Value::Null;
    for _ in 0..100 {
        shallow = Value::Array(vec![shallow]);
    }
    let json = serde_json::to_string(&shallow).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), shallow);
}
