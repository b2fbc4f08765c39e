use std::collections::HashSet;

use canon_dag_cbor::{Cid, ErrorCode, ErrorKind};

#[test]
fn raw_bytes_are_the_identity() {
    let a = Cid::from_slice(b"blah");
    let b = Cid::from_bytes(b"blah".to_vec());
    assert_eq!(a, b);
    assert_eq!(a.as_bytes(), b"blah");
    assert_eq!(a.as_ref(), b"blah");
    assert_eq!(b.into_bytes(), b"blah".to_vec());

    let set: HashSet<Cid> = [Cid::from_slice(b"x"), Cid::from_slice(b"x"), Cid::from_slice(b"y")]
        .into_iter()
        .collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn multibase_text_form() {
    let cid = Cid::from_slice(b"blah");
    assert_eq!(cid.to_multibase(), "bmjwgc2a");
    assert_eq!(cid.to_string(), "bmjwgc2a");
    assert_eq!(Cid::from_multibase("bmjwgc2a").unwrap(), cid);
    assert_eq!(Cid::from_multibase("bMJWGC2A").unwrap(), cid);
    assert_eq!(Cid::from_multibase("b").unwrap(), Cid::from_slice(&[]));
}

#[test]
fn multibase_roundtrips_all_lengths() {
    let data: Vec<u8> = (0u8..=40).map(|i| i.wrapping_mul(37)).collect();
    for len in 0..data.len() {
        let cid = Cid::from_slice(&data[..len]);
        let text = cid.to_multibase();
        assert!(text.starts_with('b'));
        assert!(!text.contains('='));
        assert_eq!(Cid::from_multibase(&text).unwrap(), cid);
    }
}

#[test]
fn multibase_rejects_bad_input() {
    let err = Cid::from_multibase("zmjwgc2a").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedMultibase);
    assert_eq!(err.kind(), ErrorKind::DomainViolation);

    assert_eq!(Cid::from_multibase("").unwrap_err().code, ErrorCode::UnsupportedMultibase);
    // invalid symbol
    assert_eq!(Cid::from_multibase("bmjwgc1a").unwrap_err().code, ErrorCode::InvalidBase32);
    // impossible length
    assert_eq!(Cid::from_multibase("bmjw").unwrap_err().code, ErrorCode::InvalidBase32);
    // non-zero trailing bits
    assert_eq!(Cid::from_multibase("bmjwgc2b").unwrap_err().code, ErrorCode::InvalidBase32);
}

#[test]
fn debug_is_hex() {
    assert_eq!(format!("{:?}", Cid::from_slice(&[0x01, 0x71, 0xab])), "Cid(0171ab)");
}

#[test]
fn sha256_prefix_checks() {
    let mut dag = vec![0x01, 0x71, 0x12, 0x20];
    dag.extend([0u8; 32]);
    let dag = Cid::from_bytes(dag);
    assert!(dag.is_dag_cbor_sha256());
    assert!(!dag.is_raw_sha256());

    let mut raw = vec![0x01, 0x55, 0x12, 0x20];
    raw.extend([0u8; 32]);
    let raw = Cid::from_bytes(raw);
    assert!(raw.is_raw_sha256());
    assert!(!raw.is_dag_cbor_sha256());

    assert!(!Cid::from_slice(&[0x01, 0x71, 0x12, 0x20]).is_dag_cbor_sha256());
}

#[cfg(feature = "sha2")]
#[test]
fn mints_and_verifies_sha256_cids() {
    use canon_dag_cbor::{encode, Mode, Value};

    let block = encode(&Value::from("hello"), Mode::Plain).unwrap();
    let cid = Cid::dag_cbor_sha256(&block);
    assert!(cid.is_dag_cbor_sha256());
    assert_eq!(cid.as_bytes().len(), 36);
    assert!(cid.verifies(&block));
    assert!(!cid.verifies(b"other"));

    let raw = Cid::raw_sha256(b"");
    assert!(raw.is_raw_sha256());
    // sha256("")
    assert_eq!(
        raw.as_bytes()[4..8],
        [0xe3, 0xb0, 0xc4, 0x42]
    );
    assert!(raw.verifies(b""));

    assert!(!Cid::from_slice(b"blah").verifies(b"blah"));
}
