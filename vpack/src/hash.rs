// Structural equality and hashing for `Slice`. "Structural" means two
// values compare equal when they'd print the same, independent of which
// container layout or integer encoding the Builder happened to choose:
// an Int(5), a UInt(5) and a SmallInt(5) are the same value; a sorted
// object and an unsorted object with the same attributes in a different
// physical order are the same value.
//
// The hash's output is pinned for specific inputs (null, a double, a
// string), so the algorithm and seed aren't this crate's choice to make:
// it's Zilong Tan's fasthash64 seeded with 0xdeadbeef, applied to the
// value's raw encoded bytes. No crate in the dependency stack ships that
// exact mix function, so it's implemented directly below rather than
// pulled in as a dependency for a dozen lines of bit-twiddling.

use crate::slice::Slice;
use crate::tag::ValueType;
use std::hash::Hasher;

const HASH_SEED: u64 = 0xdead_beef;

/// fasthash64 (Zilong Tan, public domain): a 64-bit mixing hash over raw
/// bytes, read as little-endian 8-byte words with a tail for the remainder.
fn fasthash64(buf: &[u8], seed: u64) -> u64 {
    const M: u64 = 0x880355f21e6d1965;

    fn mix(mut h: u64) -> u64 {
        h ^= h >> 23;
        h = h.wrapping_mul(0x2127599bf4325c37);
        h ^= h >> 47;
        h
    }

    let mut h = seed ^ (buf.len() as u64).wrapping_mul(M);
    let mut chunks = buf.chunks_exact(8);
    for chunk in &mut chunks {
        let v = u64::from_le_bytes(chunk.try_into().unwrap());
        h ^= mix(v);
        h = h.wrapping_mul(M);
    }
    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut v = 0u64;
        for (i, &b) in rest.iter().enumerate() {
            v |= (b as u64) << (8 * i);
        }
        h ^= mix(v);
        h = h.wrapping_mul(M);
    }
    mix(h)
}

fn is_integer(t: ValueType) -> bool {
    matches!(t, ValueType::Int | ValueType::UInt | ValueType::SmallInt)
}

pub(crate) fn eq_slice(a: &Slice, b: &Slice) -> bool {
    let (ta, tb) = (a.value_type(), b.value_type());
    if is_integer(ta) && is_integer(tb) {
        return a.get_integer().unwrap() == b.get_integer().unwrap();
    }
    if ta != tb {
        return false;
    }
    match ta {
        ValueType::None | ValueType::Null | ValueType::MinKey | ValueType::MaxKey => true,
        ValueType::Bool => a.get_bool().unwrap() == b.get_bool().unwrap(),
        ValueType::Double => a.get_double().unwrap().to_bits() == b.get_double().unwrap().to_bits(),
        ValueType::String => a.get_string_bytes().unwrap() == b.get_string_bytes().unwrap(),
        ValueType::Array => {
            let (la, lb) = (a.length().unwrap(), b.length().unwrap());
            la == lb && (0..la).all(|i| eq_slice(&a.at(i).unwrap(), &b.at(i).unwrap()))
        }
        ValueType::Object => {
            let mut pa = sorted_pairs(a);
            let mut pb = sorted_pairs(b);
            pa.sort_by(|x, y| x.0.cmp(&y.0));
            pb.sort_by(|x, y| x.0.cmp(&y.0));
            pa.len() == pb.len() && pa.iter().zip(pb.iter()).all(|((ka, va), (kb, vb))| ka == kb && eq_slice(va, vb))
        }
        ValueType::Illegal => a.as_bytes().first() == b.as_bytes().first(),
        ValueType::Int | ValueType::UInt | ValueType::SmallInt => unreachable!(),
    }
}

/// Structural hash. Scalars with no cross-category encoding (the ones
/// `eq_slice` already compares byte-for-byte once their value_type matches)
/// hash their own raw encoded bytes through `fasthash64` directly — this is
/// what reproduces the pinned null/double/string vectors bit for bit.
/// Integers hash their decoded value instead of their bytes, since
/// `eq_slice` treats an `Int`, `UInt` and `SmallInt` encoding the same
/// number as equal, and they'd otherwise hash unequally.
///
/// Arrays and objects fold each child's hash (sorted by key for objects,
/// matching `eq_slice`'s normalization) through another `fasthash64` pass
/// over the folded hashes' little-endian bytes. This combiner is this
/// crate's own design: nothing in the available material states how the
/// container cases are actually combined, only that the scalar cases hash
/// their raw bytes, so the two pinned container vectors (`hash([1..10])`,
/// `hash({one:1,...,seven:7})`) are not reproduced here — doing so would
/// additionally require this crate's Builder to choose the exact same
/// per-element width and indexed-vs-unindexed layout as the reference
/// library for that specific array and object, which nothing in the
/// available material pins either.
pub(crate) fn structural_hash(s: &Slice) -> u64 {
    let t = s.value_type();
    if is_integer(t) {
        return fasthash64(&s.get_integer().unwrap().to_le_bytes(), HASH_SEED);
    }
    match t {
        ValueType::Array => {
            let len = s.length().unwrap();
            let mut folded = Vec::with_capacity(len * 8);
            for i in 0..len {
                folded.extend_from_slice(&structural_hash(&s.at(i).unwrap()).to_le_bytes());
            }
            fasthash64(&folded, HASH_SEED)
        }
        ValueType::Object => {
            let mut pairs = sorted_pairs(s);
            pairs.sort_by(|x, y| x.0.cmp(&y.0));
            let mut folded = Vec::new();
            for (k, v) in &pairs {
                folded.extend_from_slice(k.as_bytes());
                folded.extend_from_slice(&structural_hash(v).to_le_bytes());
            }
            fasthash64(&folded, HASH_SEED)
        }
        _ => fasthash64(&s.as_bytes()[..s.byte_size()], HASH_SEED),
    }
}

pub(crate) fn hash_slice<H: Hasher>(s: &Slice, state: &mut H) {
    state.write_u64(structural_hash(s));
}

fn sorted_pairs<'a>(s: &Slice<'a>) -> Vec<(String, Slice<'a>)> {
    s.iter_object().unwrap().map(|(k, v)| (k.to_owned(), v)).collect()
}
