use canon_dag_cbor::{decode_stream, encode, ErrorCode, Mode, Value};

fn concat(values: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for v in values {
        out.extend(encode(v, Mode::Plain).unwrap());
    }
    out
}

#[test]
fn yields_every_object_in_order() {
    let values = vec![
        Value::from("hello"),
        Value::map_sorted(vec![("world".into(), Value::from(0u64))]).unwrap(),
        Value::Array(vec![Value::from(1u64), Value::from(2u64), Value::from(3u64)]),
    ];
    let bytes = concat(&values);

    let decoded: Vec<Value> = decode_stream(&bytes, Mode::Plain)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn empty_buffer_yields_nothing() {
    assert_eq!(decode_stream(&[], Mode::Plain).count(), 0);
}

#[test]
fn tracks_position_between_objects() {
    let bytes = [0x01, 0x62, b'h', b'i', 0xf6];
    let mut stream = decode_stream(&bytes, Mode::Plain);
    assert_eq!(stream.position(), 0);
    assert_eq!(stream.next().unwrap().unwrap(), Value::UnsignedInt(1));
    assert_eq!(stream.position(), 1);
    assert_eq!(stream.next().unwrap().unwrap(), Value::from("hi"));
    assert_eq!(stream.position(), 4);
    assert_eq!(stream.next().unwrap().unwrap(), Value::Null);
    assert!(stream.next().is_none());
}

#[test]
fn stops_after_first_error() {
    // null, then an overlong integer, then a valid integer that is never reached
    let bytes = [0xf6, 0x18, 0x01, 0x02];
    let mut stream = decode_stream(&bytes, Mode::Plain);
    assert_eq!(stream.next().unwrap().unwrap(), Value::Null);
    let err = stream.next().unwrap().unwrap_err();
    assert_eq!(err.code, ErrorCode::NonCanonicalEncoding);
    assert_eq!(err.offset, 1);
    assert!(stream.next().is_none());
}

#[test]
fn truncated_tail_is_reported() {
    let mut bytes = concat(&[Value::from(7u64)]);
    bytes.push(0x63);
    bytes.push(b'a');
    let results: Vec<_> = decode_stream(&bytes, Mode::Plain).collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), &Value::UnsignedInt(7));
    let err = results[1].as_ref().unwrap_err();
    assert!(err.is_truncation());
    assert_eq!(err.offset, 2);
}

#[test]
fn atjson_mode_applies_to_each_object() {
    let bytes = concat(&[Value::Bytes(b"hello".to_vec()), Value::Bytes(vec![])]);
    let decoded: Vec<Value> = decode_stream(&bytes, Mode::AtJson)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(decoded[0].get("$bytes").and_then(Value::as_str), Some("aGVsbG8"));
    assert_eq!(decoded[1].get("$bytes").and_then(Value::as_str), Some(""));
}
