use canon_dag_cbor::{decode, decode_exact, encode, Cid, ErrorCode, ErrorKind, Mode, Value};

fn roundtrip(v: &Value) -> Value {
    let bytes = encode(v, Mode::Plain).unwrap();
    decode_exact(&bytes, Mode::Plain).unwrap()
}

#[test]
fn integer_domain_boundaries() {
    let max = Value::integer_i128(i128::from(u64::MAX)).unwrap();
    assert_eq!(max, Value::UnsignedInt(u64::MAX));
    assert_eq!(roundtrip(&max), max);

    let min = Value::integer_i128(-1 - i128::from(u64::MAX)).unwrap();
    assert_eq!(min, Value::NegativeInt(u64::MAX));
    assert_eq!(roundtrip(&min), min);
    assert_eq!(min.as_i128(), Some(-(1_i128 << 64)));

    for v in [i128::from(u64::MAX) + 1, -2 - i128::from(u64::MAX)] {
        let err = Value::integer_i128(v).unwrap_err();
        assert_eq!(err.code, ErrorCode::IntegerOutOfRange);
        assert_eq!(err.kind(), ErrorKind::DomainViolation);
    }
}

#[test]
fn i64_conversion_covers_both_signs() {
    assert_eq!(Value::from(0i64), Value::UnsignedInt(0));
    assert_eq!(Value::from(-1i64), Value::NegativeInt(0));
    assert_eq!(Value::from(i64::MIN), Value::NegativeInt(i64::MAX as u64));
    assert_eq!(Value::from(i64::MIN).as_i128(), Some(i128::from(i64::MIN)));
}

#[test]
fn canonical_bytes_roundtrip() {
    let cases: &[&[u8]] = &[
        &[0xf6],
        &[0x17],
        &[0x3b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
        &[0x65, b'h', b'e', b'l', b'l', b'o'],
        &[0x83, 0x01, 0x02, 0x03],
        &[0xa1, 0x65, b'w', b'o', b'r', b'l', b'd', 0x00],
        &[0xa2, 0x61, b'x', 0x01, 0x63, b'a', b'a', b'a', 0x02],
        &[0xd8, 0x2a, 0x45, 0x00, 0x62, 0x6c, 0x61, 0x68],
        &[0xfb, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    ];
    for bytes in cases {
        let v = decode_exact(bytes, Mode::Plain).unwrap();
        assert_eq!(encode(&v, Mode::Plain).unwrap(), *bytes);
    }
}

#[test]
fn values_roundtrip() {
    let v = Value::map_sorted(vec![
        ("bytes".into(), Value::Bytes(vec![0, 1, 2, 255])),
        ("float".into(), Value::Float(-12.25)),
        ("link".into(), Value::Link(Cid::from_slice(&[1, 0x71, 0x12, 0x20]))),
        (
            "list".into(),
            Value::Array(vec![Value::Null, Value::Bool(true), Value::from(-300i64)]),
        ),
        ("text".into(), Value::from("snowman \u{2603}")),
    ])
    .unwrap();
    assert_eq!(roundtrip(&v), v);
}

#[test]
fn map_sorted_orders_and_rejects_duplicates() {
    let v = Value::map_sorted(vec![
        ("bb".into(), Value::Null),
        ("c".into(), Value::Null),
        ("a".into(), Value::Null),
    ])
    .unwrap();
    let keys: Vec<&str> = v.as_map().unwrap().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["a", "c", "bb"]);

    let err = Value::map_sorted(vec![("a".into(), Value::Null), ("a".into(), Value::Null)])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateMapKey);
}

#[test]
fn decoded_maps_keep_wire_order() {
    let bytes = [0xa2, 0x61, b'x', 0x01, 0x63, b'a', b'a', b'a', 0x02];
    let v = decode_exact(&bytes, Mode::Plain).unwrap();
    let map = v.as_map().unwrap();
    assert_eq!(map[0].0, "x");
    assert_eq!(map[1].0, "aaa");
    assert_eq!(v.get("aaa").and_then(Value::as_i128), Some(2));
    assert_eq!(v.get("missing"), None);
}

#[test]
fn accessors_match_variants() {
    assert!(Value::Null.is_null());
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::from("x").as_str(), Some("x"));
    assert_eq!(Value::Bytes(vec![1]).as_bytes(), Some(&[1u8][..]));
    assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
    assert_eq!(Value::from(vec![Value::Null]).as_array().map(<[Value]>::len), Some(1));
    assert_eq!(Value::from("x").as_bytes(), None);
    assert_eq!(Value::Null.as_map(), None);

    let cid = Cid::from_slice(b"abc");
    assert_eq!(Value::from(cid.clone()).as_link(), Some(&cid));
}

#[test]
fn value_encode_matches_free_function() {
    let v = Value::Array(vec![Value::from(1u64), Value::from("a")]);
    assert_eq!(v.encode(Mode::Plain).unwrap(), encode(&v, Mode::Plain).unwrap());
}

#[test]
fn decodes_hostile_nesting_without_recursion() {
    let depth = 500_000;
    let mut bytes = vec![0x81; depth];
    bytes.push(0x80);

    let (v, used) = decode(&bytes, Mode::Plain).unwrap();
    assert_eq!(used, bytes.len());

    let mut level = 0;
    let mut cur = &v;
    while let Some(items) = cur.as_array() {
        match items.first() {
            Some(next) => {
                cur = next;
                level += 1;
            }
            None => break,
        }
    }
    assert_eq!(level, depth);
    assert_eq!(encode(&v, Mode::Plain).unwrap(), bytes);
}

#[test]
fn deep_nested_maps_roundtrip() {
    let depth = 100_000;
    let mut bytes = Vec::with_capacity(depth * 3 + 1);
    for _ in 0..depth {
        bytes.extend_from_slice(&[0xa1, 0x61, b'k']);
    }
    bytes.push(0xf6);

    let v = decode_exact(&bytes, Mode::Plain).unwrap();
    assert_eq!(encode(&v, Mode::Plain).unwrap(), bytes);
}

#[test]
fn hostile_nesting_clones_and_compares() {
    let mut bytes = vec![0x81; 500_000];
    bytes.push(0x80);
    let v = decode_exact(&bytes, Mode::Plain).unwrap();

    let copy = v.clone();
    assert!(copy == v);
    assert_eq!(encode(&copy, Mode::Plain).unwrap(), bytes);

    let mut maps = Vec::with_capacity(300_003);
    for _ in 0..100_000 {
        maps.extend_from_slice(&[0xa1, 0x61, b'k']);
    }
    maps.push(0x01);
    let m = decode_exact(&maps, Mode::Plain).unwrap();
    let mut other = maps.clone();
    *other.last_mut().unwrap() = 0x02;
    let n = decode_exact(&other, Mode::Plain).unwrap();
    assert!(m.clone() == m);
    assert!(m != n);
    assert!(m != v);
}

#[test]
fn equality_matches_structure() {
    let a = Value::map_sorted(vec![
        ("x".into(), Value::Array(vec![Value::from(1u64), Value::Float(-0.0)])),
        ("y".into(), Value::Link(Cid::from_slice(b"blah"))),
    ])
    .unwrap();
    let b = a.clone();
    assert_eq!(a, b);

    let renamed = Value::Map(vec![
        ("x".into(), Value::Array(vec![Value::from(1u64), Value::Float(-0.0)])),
        ("z".into(), Value::Link(Cid::from_slice(b"blah"))),
    ]);
    assert_ne!(a, renamed);
    assert_ne!(Value::Array(vec![Value::Null]), Value::Array(vec![]));
    assert_ne!(Value::UnsignedInt(1), Value::NegativeInt(1));
    assert_eq!(Value::Float(0.0), Value::Float(-0.0));
}

#[test]
fn debug_output_is_depth_bounded() {
    let flat = Value::Map(vec![("a".into(), Value::Array(vec![Value::Null, Value::from(2u64)]))]);
    assert_eq!(
        format!("{flat:?}"),
        r#"Map([("a", Array([Null, UnsignedInt(2)]))])"#
    );

    let mut bytes = vec![0x81; 500_000];
    bytes.push(0x80);
    let deep = decode_exact(&bytes, Mode::Plain).unwrap();
    let text = format!("{deep:?}");
    assert!(text.starts_with("Array([Array(["));
    assert!(text.contains("Array(..)"));
    assert!(text.len() < 4096);
}
