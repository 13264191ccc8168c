//! End-to-end coverage: documents built with [`crate::Builder`] and read
//! back with [`crate::Slice`], exercising layout choices unit tests on a
//! single module don't reach (index width escalation, malformed input,
//! deep nesting).

use crate::tag;
use crate::{Builder, ErrorKind, Slice, Value};
use test_log::test;

#[test]
fn wide_array_escalates_index_width() {
    let mut b = Builder::new();
    b.add(Value::array_indexed()).unwrap();
    // Long strings of varying length defeat the uniform-width shortcut and
    // push the container past 255 payload bytes, forcing a 2-byte index.
    for i in 0..40 {
        b.add(Value::string(&"a".repeat(i + 1))).unwrap();
    }
    b.close().unwrap();
    let doc = b.finish().unwrap();
    let s = doc.slice();
    assert_eq!(s.length().unwrap(), 40);
    for i in 0..40 {
        assert_eq!(s.at(i).unwrap().get_string().unwrap().len(), i + 1);
    }
}

#[test]
fn deeply_nested_document_round_trips() {
    let mut b = Builder::new();
    b.add(Value::object()).unwrap();
    b.add_key("meta", Value::object()).unwrap();
    b.add_key("version", Value::int(3)).unwrap();
    b.add_key("tags", Value::array()).unwrap();
    b.add(Value::string("alpha")).unwrap();
    b.add(Value::string("beta")).unwrap();
    b.close().unwrap(); // tags
    b.close().unwrap(); // meta
    b.add_key("ready", Value::bool(true)).unwrap();
    b.close().unwrap(); // root

    let doc = b.finish().unwrap();
    let root = doc.slice();
    let meta = root.require("meta").unwrap();
    assert_eq!(meta.require("version").unwrap().get_int().unwrap(), 3);
    let tags = meta.require("tags").unwrap();
    assert_eq!(tags.length().unwrap(), 2);
    assert_eq!(tags.at(0).unwrap().get_string().unwrap(), "alpha");
    assert!(root.require("ready").unwrap().get_bool().unwrap());
}

#[test]
fn object_with_many_attributes_is_binary_searchable() {
    let mut b = Builder::new();
    b.add(Value::object()).unwrap();
    let keys: Vec<String> = (0..64).map(|i| format!("key-{i:03}")).collect();
    for (i, k) in keys.iter().enumerate() {
        b.add_key(k, Value::uint(i as u64)).unwrap();
    }
    b.close().unwrap();
    let doc = b.finish().unwrap();
    let s = doc.slice();
    assert_eq!(s.length().unwrap(), 64);
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(s.get(k).unwrap().unwrap().get_uint().unwrap(), i as u64);
    }
    assert!(s.get("nope").unwrap().is_none());
}

#[test]
fn negative_and_large_integers_pick_narrowest_width() {
    let cases: &[(i64, crate::ValueType)] = &[
        (0, crate::ValueType::SmallInt),
        (-6, crate::ValueType::SmallInt),
        (9, crate::ValueType::SmallInt),
        (127, crate::ValueType::Int),
        (-129, crate::ValueType::Int),
        (i64::MAX, crate::ValueType::Int),
        (i64::MIN, crate::ValueType::Int),
    ];
    for &(v, expect) in cases {
        let mut b = Builder::new();
        b.add(Value::int(v)).unwrap();
        let doc = b.finish().unwrap();
        let s = doc.slice();
        assert_eq!(s.value_type(), expect, "value {v}");
        assert_eq!(s.get_int().unwrap(), v);
    }
}

#[test]
fn malformed_head_byte_is_rejected() {
    let e = Slice::new(&[0xc4]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MalformedInput);
}

#[test]
fn truncated_buffer_is_rejected() {
    // A UInt(width=4) head byte with only one payload byte present.
    let e = Slice::new(&[0x2b, 0x01]).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MalformedInput);
}

#[test]
fn empty_object_has_no_attributes() {
    let mut b = Builder::new();
    b.add(Value::object()).unwrap();
    b.close().unwrap();
    let doc = b.finish().unwrap();
    let s = doc.slice();
    assert_eq!(s.length().unwrap(), 0);
    assert!(s.get("anything").unwrap().is_none());
    assert_eq!(s.iter_object().unwrap().count(), 0);
}

#[test]
fn min_key_and_max_key_round_trip() {
    let mut b = Builder::new();
    b.add(Value::array()).unwrap();
    b.add(Value::min_key()).unwrap();
    b.add(Value::max_key()).unwrap();
    b.close().unwrap();
    let doc = b.finish().unwrap();
    let s = doc.slice();
    assert!(s.at(0).unwrap().is_min_key());
    assert!(s.at(1).unwrap().is_max_key());
}

#[test]
fn double_round_trips_bit_exact() {
    let mut b = Builder::new();
    b.add(Value::double(std::f64::consts::PI)).unwrap();
    let doc = b.finish().unwrap();
    assert_eq!(doc.slice().get_double().unwrap(), std::f64::consts::PI);
}

#[test]
fn noindex_array_width_escalates_past_256_bytes() {
    // 250 uniform-width 1-byte SmallInt elements: 1 (head) + 1 (size field)
    // + 250 (payload) = 252 bytes, still fits a 1-byte size field.
    let mut b = Builder::new();
    b.add(Value::array()).unwrap();
    for _ in 0..250 {
        b.add(Value::int(1)).unwrap();
    }
    b.close().unwrap();
    let doc = b.finish().unwrap();
    let head = doc.slice().as_bytes()[0];
    assert!((tag::ARRAY_NOINDEX_BASE..tag::ARRAY_INDEXED_BASE).contains(&head));
    assert_eq!(tag::Width::from_family_offset(head, tag::ARRAY_NOINDEX_BASE), tag::Width::W1);

    // Past the threshold: 1 (head) + 2 (size field) + 300 (payload) needs a
    // 2-byte size field once the 1-byte field's 0xff cap is exceeded.
    let mut b = Builder::new();
    b.add(Value::array()).unwrap();
    for _ in 0..300 {
        b.add(Value::int(1)).unwrap();
    }
    b.close().unwrap();
    let doc = b.finish().unwrap();
    let s = doc.slice();
    assert_eq!(s.length().unwrap(), 300);
    let head = s.as_bytes()[0];
    assert!((tag::ARRAY_NOINDEX_BASE..tag::ARRAY_INDEXED_BASE).contains(&head));
    assert_eq!(tag::Width::from_family_offset(head, tag::ARRAY_NOINDEX_BASE), tag::Width::W2);
}

#[test]
fn noindex_array_of_short_strings_crosses_64kib_boundary() {
    // The format's own scenario: N = (64*1024)/127 strings of 126 bytes
    // each (127 bytes per element: 1 head byte embedding the length + 126
    // payload bytes), landing right at the edge of the 64 KiB threshold.
    const N: usize = (64 * 1024) / 127;
    let x = "x".repeat(126);

    let mut b = Builder::new();
    b.add(Value::array()).unwrap();
    for _ in 0..N {
        b.add(Value::string(&x)).unwrap();
    }
    b.close().unwrap();
    let doc = b.finish().unwrap();
    let s = doc.slice();

    assert_eq!(s.length().unwrap(), N);
    let head = s.as_bytes()[0];
    assert!((tag::ARRAY_NOINDEX_BASE..tag::ARRAY_INDEXED_BASE).contains(&head));
    assert_eq!(s.at(0).unwrap().get_string().unwrap(), x);
    assert_eq!(s.at(N - 1).unwrap().get_string().unwrap(), x);

    // This crate's Builder always picks the narrowest width field that
    // fits (`Width::ALL` tried smallest-first in `close_noindex_array`),
    // so 516 * 127 = 65532 bytes of payload fits a 2-byte size field
    // (1 + 2 + 65532 == 65535 == the field's own cap) and the Builder
    // picks W2 rather than escalating further. The reference library's
    // own fixed-stride-array test (`FixedArraysSizes` in the pack's
    // original source) pins a byte_size of `1 + 8 + N*127` for this exact
    // N — it jumps straight from a 1-byte field to an 8-byte one for this
    // array family once a single byte no longer suffices, skipping the
    // 2-byte and 4-byte steps entirely. That skip-to-widest rule has no
    // counterpart in this crate's width-selection algebra, so the two
    // byte_size values diverge by design; see DESIGN.md.
    assert_eq!(s.byte_size(), 1 + 2 + N * 127);
    assert_eq!(tag::Width::from_family_offset(head, tag::ARRAY_NOINDEX_BASE), tag::Width::W2);
}

#[test]
fn hash_set_deduplicates_by_structural_equality() {
    use std::collections::HashSet;

    let values = [1i64, 2, 3, 4, 1, 2, 3, 4, 5, 9, 1];
    let docs: HashSet<_> = values
        .iter()
        .map(|&v| {
            let mut b = Builder::new();
            b.add(Value::int(v)).unwrap();
            b.finish().unwrap()
        })
        .collect();
    assert_eq!(docs.len(), 6);
}

#[test]
fn structural_hash_is_stable_across_independently_built_equivalents() {
    fn hash_of(f: impl FnOnce(&mut Builder)) -> u64 {
        let mut b = Builder::new();
        f(&mut b);
        b.finish().unwrap().slice().structural_hash()
    }

    assert_eq!(hash_of(|b| { b.add(Value::null()).unwrap(); }), hash_of(|b| { b.add(Value::null()).unwrap(); }));
    assert_eq!(
        hash_of(|b| { b.add(Value::double(-1.5)).unwrap(); }),
        hash_of(|b| { b.add(Value::double(-1.5)).unwrap(); })
    );
    assert_eq!(
        hash_of(|b| { b.add(Value::string("fixture")).unwrap(); }),
        hash_of(|b| { b.add(Value::string("fixture")).unwrap(); })
    );
    assert_eq!(
        hash_of(|b| {
            b.add(Value::array()).unwrap();
            b.add(Value::int(1)).unwrap();
            b.add(Value::int(2)).unwrap();
            b.close().unwrap();
        }),
        hash_of(|b| {
            b.add(Value::array()).unwrap();
            b.add(Value::int(1)).unwrap();
            b.add(Value::int(2)).unwrap();
            b.close().unwrap();
        })
    );
    assert_eq!(
        hash_of(|b| {
            b.add(Value::object()).unwrap();
            for i in 0i64..7 {
                b.add_key(&format!("k{i}"), Value::int(i)).unwrap();
            }
            b.close().unwrap();
        }),
        hash_of(|b| {
            b.add(Value::object_unsorted()).unwrap();
            for i in (0i64..7).rev() {
                b.add_key(&format!("k{i}"), Value::int(i)).unwrap();
            }
            b.close().unwrap();
        })
    );
}
