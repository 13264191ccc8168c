//! Literal head-byte fixtures lifted straight from the format's own byte
//! tables, decoded via [`crate::Slice`] without going through [`crate::Builder`]
//! at all. These pin the tag dispatch table itself rather than anything the
//! Builder chooses to emit.

use crate::Slice;

#[test]
fn null_head_byte() {
    let s = Slice::new(&[0x18]).unwrap();
    assert!(s.is_null());
    assert_eq!(s.byte_size(), 1);
}

#[test]
fn bool_head_bytes() {
    assert!(!Slice::new(&[0x19]).unwrap().get_bool().unwrap());
    assert!(Slice::new(&[0x1a]).unwrap().get_bool().unwrap());
}

#[test]
fn positive_int_head_byte() {
    let s = Slice::new(&[0x21, 0x23, 0x42]).unwrap();
    assert_eq!(s.get_int().unwrap(), 0x4223);
}

#[test]
fn negative_int_head_byte_sign_extends() {
    let s = Slice::new(&[0x21, 0x23, 0xe2]).unwrap();
    assert_eq!(s.get_int().unwrap(), 0xFFFF_FFFF_FFFF_E223_u64 as i64);
}

#[test]
fn uint_head_byte() {
    let s = Slice::new(&[0x29, 0x23, 0x42]).unwrap();
    assert_eq!(s.get_uint().unwrap(), 0x4223);
}

#[test]
fn small_int_head_bytes_cover_both_signs() {
    let expect: [i64; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, -6, -5, -4, -3, -2, -1];
    for (i, &want) in expect.iter().enumerate() {
        let head = 0x30 + i as u8;
        let buf = [head];
        let s = Slice::new(&buf).unwrap();
        assert_eq!(s.get_small_int().unwrap(), want, "head 0x{head:02x}");
    }
}

#[test]
fn short_string_head_byte() {
    let s = Slice::new(&[0x46, b'f', b'o', b'o', b'b', b'a', b'r']).unwrap();
    assert_eq!(s.copy_string().unwrap(), "foobar");
    assert_eq!(s.byte_size(), 7);
}

#[test]
fn long_string_head_byte() {
    let buf = [0xbf, 6, 0, 0, 0, 0, 0, 0, 0, b'f', b'o', b'o', b'b', b'a', b'r'];
    let s = Slice::new(&buf).unwrap();
    assert_eq!(s.copy_string().unwrap(), "foobar");
    assert_eq!(s.byte_size(), 15);
}

#[test]
fn noindex_array_literal() {
    let s = Slice::new(&[0x02, 0x05, 0x31, 0x32, 0x33]).unwrap();
    assert!(s.is_array());
    assert_eq!(s.length().unwrap(), 3);
    assert_eq!(s.at(0).unwrap().get_small_int().unwrap(), 1);
    assert_eq!(s.at(2).unwrap().get_small_int().unwrap(), 3);
}

#[test]
fn sorted_indexed_object_literal() {
    #[rustfmt::skip]
    let buf = [
        0x0b, 15, 3,
        0x41, b'a', 0x31,
        0x41, b'b', 0x32,
        0x41, b'c', 0x33,
        0x03, 0x06, 0x09,
    ];
    let s = Slice::new(&buf).unwrap();
    assert!(s.is_object());
    assert_eq!(s.length().unwrap(), 3);
    assert_eq!(s.get("a").unwrap().unwrap().get_small_int().unwrap(), 1);
    assert_eq!(s.get("b").unwrap().unwrap().get_small_int().unwrap(), 2);
    assert_eq!(s.get("c").unwrap().unwrap().get_small_int().unwrap(), 3);
}

#[test]
fn compact_array_literal() {
    // head(0x13) + total_size(forward LEB128, 1 byte = 6) + payload
    // (SmallInt 1, 2, 3) + count(backward LEB128, 1 byte = 3, read from
    // the end). No index table, per the compact family's own layout.
    let buf = [0x13, 0x06, 0x31, 0x32, 0x33, 0x03];
    let s = Slice::new(&buf).unwrap();
    assert!(s.is_array());
    assert_eq!(s.byte_size(), 6);
    assert_eq!(s.length().unwrap(), 3);
    assert_eq!(s.at(0).unwrap().get_small_int().unwrap(), 1);
    assert_eq!(s.at(1).unwrap().get_small_int().unwrap(), 2);
    assert_eq!(s.at(2).unwrap().get_small_int().unwrap(), 3);
    assert!(s.at(3).is_err());

    let values: Vec<i64> = s.iter_array().unwrap().map(|v| v.get_small_int().unwrap()).collect();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn illegal_head_bytes_are_total() {
    for head in [0x00u8, 0x15, 0x16, 0x17, 0x1c, 0x1d, 0xc0, 0xff] {
        // 0x00 (None) is reserved as a top-level Slice; everything else in
        // this list is outright Illegal. Both are rejected by `Slice::new`.
        let err = Slice::new(&[head]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedInput, "head 0x{head:02x}");
    }
}
