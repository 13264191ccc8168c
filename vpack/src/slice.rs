// Zero-copy typed reader. A `Slice` is a borrowed view tightly bounded to
// exactly `byte_size()` bytes of its backing buffer; narrowing into a child
// element is just narrowing the borrow, never a copy.

use crate::hash;
use crate::iter::{ArrayIter, ObjectIter};
use crate::numeric;
use crate::tag::{self, ValueType, Width};
use std::cmp::Ordering;
use vpack_base::{err, Error, ErrorKind, Result};

#[derive(Clone, Copy)]
pub struct Slice<'a> {
    buf: &'a [u8],
}

fn wrong_type(expected: &str) -> Error {
    err(ErrorKind::WrongType, format!("expected {expected}"))
}

impl<'a> Slice<'a> {
    /// Validates `buf` starts with a legal head byte and is long enough to
    /// hold the value it declares, then narrows to exactly that many bytes.
    pub fn new(buf: &'a [u8]) -> Result<Slice<'a>> {
        if buf.is_empty() {
            return Err(err(ErrorKind::MalformedInput, "empty buffer"));
        }
        // `None` (0x00) is the Builder's internal not-yet-written placeholder
        // byte; it is never a value a well-formed document actually holds.
        if matches!(tag::classify(buf[0]), ValueType::Illegal | ValueType::None) {
            return Err(err(ErrorKind::MalformedInput, "reserved or unassigned head byte"));
        }
        let size = tag::byte_size(buf)?;
        if buf.len() < size {
            return Err(err(ErrorKind::MalformedInput, "buffer shorter than the value it declares"));
        }
        Ok(Slice { buf: &buf[..size] })
    }

    fn new_unchecked(buf: &'a [u8]) -> Slice<'a> {
        Slice { buf }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub fn value_type(&self) -> ValueType {
        tag::classify(self.buf[0])
    }

    pub fn byte_size(&self) -> usize {
        self.buf.len()
    }

    pub fn is_none(&self) -> bool {
        self.value_type() == ValueType::None
    }
    pub fn is_null(&self) -> bool {
        self.value_type() == ValueType::Null
    }
    pub fn is_bool(&self) -> bool {
        self.value_type() == ValueType::Bool
    }
    pub fn is_double(&self) -> bool {
        self.value_type() == ValueType::Double
    }
    pub fn is_integer(&self) -> bool {
        matches!(self.value_type(), ValueType::Int | ValueType::UInt | ValueType::SmallInt)
    }
    pub fn is_string(&self) -> bool {
        self.value_type() == ValueType::String
    }
    pub fn is_array(&self) -> bool {
        self.value_type() == ValueType::Array
    }
    pub fn is_object(&self) -> bool {
        self.value_type() == ValueType::Object
    }
    pub fn is_min_key(&self) -> bool {
        self.value_type() == ValueType::MinKey
    }
    pub fn is_max_key(&self) -> bool {
        self.value_type() == ValueType::MaxKey
    }

    pub fn get_bool(&self) -> Result<bool> {
        match self.buf[0] {
            tag::TRUE => Ok(true),
            tag::FALSE => Ok(false),
            _ => Err(wrong_type("bool")),
        }
    }

    pub fn get_double(&self) -> Result<f64> {
        if self.buf[0] != tag::DOUBLE {
            return Err(wrong_type("double"));
        }
        Ok(numeric::read_f64_le(&self.buf[1..]))
    }

    /// Shared decode path for Int, UInt and SmallInt: the three integer
    /// families are interchangeable once decoded, differing only in which
    /// head bytes and widths they use on the wire.
    pub(crate) fn get_integer(&self) -> Result<i128> {
        match self.buf[0] {
            h if (tag::SMALLINT_POS_BASE..=0x39).contains(&h) => {
                Ok((h - tag::SMALLINT_POS_BASE) as i128)
            }
            h if (0x3a..=0x3f).contains(&h) => Ok(h as i128 - tag::SMALLINT_NEG_BASE as i128),
            h if (0x20..=0x27).contains(&h) => {
                let w = (h - tag::INT_BASE) as usize;
                Ok(numeric::read_int_le(&self.buf[1..], w) as i128)
            }
            h if (0x28..=0x2f).contains(&h) => {
                let w = (h - tag::UINT_BASE) as usize;
                Ok(numeric::read_uint_le(&self.buf[1..], w) as i128)
            }
            _ => Err(wrong_type("integer")),
        }
    }

    pub fn get_int(&self) -> Result<i64> {
        i64::try_from(self.get_integer()?).map_err(|_| err(ErrorKind::Overflow, "value does not fit in i64"))
    }

    pub fn get_uint(&self) -> Result<u64> {
        u64::try_from(self.get_integer()?).map_err(|_| err(ErrorKind::Overflow, "value does not fit in u64"))
    }

    pub fn get_small_int(&self) -> Result<i64> {
        if self.value_type() != ValueType::SmallInt {
            return Err(wrong_type("small int"));
        }
        Ok(self.get_integer()? as i64)
    }

    pub fn get_string_bytes(&self) -> Result<&'a [u8]> {
        match self.buf[0] {
            tag::STRING_LONG => {
                let len = numeric::read_uint_le(&self.buf[1..], 8) as usize;
                Ok(&self.buf[9..9 + len])
            }
            h if (tag::STRING_SHORT_BASE..=0xbe).contains(&h) => {
                let len = (h - tag::STRING_SHORT_BASE) as usize;
                Ok(&self.buf[1..1 + len])
            }
            _ => Err(wrong_type("string")),
        }
    }

    pub fn get_string(&self) -> Result<&'a str> {
        std::str::from_utf8(self.get_string_bytes()?)
            .map_err(|_| err(ErrorKind::MalformedInput, "string payload is not valid utf-8"))
    }

    pub fn copy_string(&self) -> Result<String> {
        Ok(self.get_string()?.to_owned())
    }

    pub fn length(&self) -> Result<usize> {
        match self.value_type() {
            ValueType::Array => self.array_len(),
            ValueType::Object => self.object_len(),
            _ => Err(wrong_type("array or object")),
        }
    }

    fn array_len(&self) -> Result<usize> {
        match self.buf[0] {
            tag::ARRAY_EMPTY => Ok(0),
            h if (tag::ARRAY_NOINDEX_BASE..tag::ARRAY_INDEXED_BASE).contains(&h) => {
                let w = Width::from_family_offset(h, tag::ARRAY_NOINDEX_BASE).len();
                let payload = &self.buf[1 + w..];
                if payload.is_empty() {
                    return Ok(0);
                }
                let elem_width = tag::byte_size(payload)?;
                Ok(payload.len() / elem_width)
            }
            h if (tag::ARRAY_INDEXED_BASE..tag::OBJECT_EMPTY).contains(&h) => {
                let w = Width::from_family_offset(h, tag::ARRAY_INDEXED_BASE).len();
                Ok(numeric::read_uint_le(&self.buf[1 + w..], w) as usize)
            }
            tag::ARRAY_COMPACT => self.compact_count(),
            _ => Err(wrong_type("array")),
        }
    }

    fn object_len(&self) -> Result<usize> {
        match self.buf[0] {
            tag::OBJECT_EMPTY => Ok(0),
            tag::OBJECT_COMPACT => self.compact_count(),
            h if (tag::OBJECT_SORTED_BASE..tag::OBJECT_UNSORTED_BASE).contains(&h) => {
                let w = Width::from_family_offset(h, tag::OBJECT_SORTED_BASE).len();
                Ok(numeric::read_uint_le(&self.buf[1 + w..], w) as usize)
            }
            h if (tag::OBJECT_UNSORTED_BASE..tag::ARRAY_COMPACT).contains(&h) => {
                let w = Width::from_family_offset(h, tag::OBJECT_UNSORTED_BASE).len();
                Ok(numeric::read_uint_le(&self.buf[1 + w..], w) as usize)
            }
            _ => Err(wrong_type("object")),
        }
    }

    fn compact_count(&self) -> Result<usize> {
        let (n, _) = numeric::read_uvarint_backward(self.buf, self.buf.len())
            .ok_or_else(|| err(ErrorKind::MalformedInput, "compact trailing count varint never terminates"))?;
        Ok(n as usize)
    }

    /// The payload of a compact array, for callers that want to walk it
    /// element-by-element without re-deriving each offset from scratch.
    /// `None` for every other array layout.
    pub(crate) fn compact_array_payload(&self) -> Option<&'a [u8]> {
        if self.buf[0] == tag::ARRAY_COMPACT {
            self.compact_payload().ok()
        } else {
            None
        }
    }

    fn compact_payload(&self) -> Result<&'a [u8]> {
        let (_total, header_len) = numeric::read_uvarint_forward(&self.buf[1..])
            .ok_or_else(|| err(ErrorKind::Overflow, "compact total_size varint never terminates"))?;
        let (_n, trailer_len) = numeric::read_uvarint_backward(self.buf, self.buf.len())
            .ok_or_else(|| err(ErrorKind::MalformedInput, "compact trailing count varint never terminates"))?;
        let payload_start = 1 + header_len;
        let payload_end = self.buf.len() - trailer_len;
        Ok(&self.buf[payload_start..payload_end])
    }

    /// Scans a compact container's payload to the `i`th element (arrays) or
    /// key/value pair (objects). Compact containers carry no index table,
    /// so random access here is O(n), same as the original format's own
    /// compact variant.
    fn compact_nth(&self, i: usize, want_key: bool) -> Result<(Option<&'a str>, Slice<'a>)> {
        let payload = self.compact_payload()?;
        let mut pos = 0usize;
        for idx in 0..=i {
            if want_key {
                let key_size = tag::byte_size(&payload[pos..])?;
                let key_start = pos;
                pos += key_size;
                let val_size = tag::byte_size(&payload[pos..])?;
                if idx == i {
                    let key = Slice::new_unchecked(&payload[key_start..key_start + key_size]).get_string()?;
                    let value = Slice::new(&payload[pos..pos + val_size])?;
                    return Ok((Some(key), value));
                }
                pos += val_size;
            } else {
                let val_size = tag::byte_size(&payload[pos..])?;
                if idx == i {
                    return Ok((None, Slice::new(&payload[pos..pos + val_size])?));
                }
                pos += val_size;
            }
        }
        unreachable!("loop always returns on idx == i, and i is in 0..=i")
    }

    pub fn at(&self, i: usize) -> Result<Slice<'a>> {
        if self.value_type() != ValueType::Array {
            return Err(wrong_type("array"));
        }
        match self.buf[0] {
            tag::ARRAY_EMPTY => Err(err(ErrorKind::IndexOutOfRange, "index out of range in empty array")),
            h if (tag::ARRAY_NOINDEX_BASE..tag::ARRAY_INDEXED_BASE).contains(&h) => {
                let w = Width::from_family_offset(h, tag::ARRAY_NOINDEX_BASE).len();
                let payload = &self.buf[1 + w..];
                let elem_width = tag::byte_size(payload)?;
                let len = payload.len() / elem_width;
                if i >= len {
                    return Err(err(ErrorKind::IndexOutOfRange, "array index out of range"));
                }
                let start = i * elem_width;
                Slice::new(&payload[start..start + elem_width])
            }
            h if (tag::ARRAY_INDEXED_BASE..tag::OBJECT_EMPTY).contains(&h) => {
                let w = Width::from_family_offset(h, tag::ARRAY_INDEXED_BASE).len();
                let len = self.array_len()?;
                if i >= len {
                    return Err(err(ErrorKind::IndexOutOfRange, "array index out of range"));
                }
                let index_table_start = self.buf.len() - len * w;
                let rel = numeric::read_uint_le(&self.buf[index_table_start + i * w..], w) as usize;
                Slice::new(&self.buf[rel..])
            }
            tag::ARRAY_COMPACT => {
                let len = self.compact_count()?;
                if i >= len {
                    return Err(err(ErrorKind::IndexOutOfRange, "array index out of range"));
                }
                self.compact_nth(i, false).map(|(_, v)| v)
            }
            _ => Err(wrong_type("array")),
        }
    }

    /// Looks up an attribute by key. Binary search on a sorted object,
    /// linear scan on an unsorted or compact one. `Ok(None)` means the key
    /// is absent; see [`Slice::require`] for a hard-failing variant.
    pub fn get(&self, key: &str) -> Result<Option<Slice<'a>>> {
        if self.value_type() != ValueType::Object {
            return Err(wrong_type("object"));
        }
        match self.buf[0] {
            tag::OBJECT_EMPTY => Ok(None),
            tag::OBJECT_COMPACT => {
                let n = self.compact_count()?;
                for i in 0..n {
                    let (k, v) = self.compact_nth(i, true)?;
                    if k.unwrap() == key {
                        return Ok(Some(v));
                    }
                }
                Ok(None)
            }
            h if (tag::OBJECT_SORTED_BASE..tag::OBJECT_UNSORTED_BASE).contains(&h) => {
                let w = Width::from_family_offset(h, tag::OBJECT_SORTED_BASE).len();
                self.object_get_sorted(w, key)
            }
            h if (tag::OBJECT_UNSORTED_BASE..tag::ARRAY_COMPACT).contains(&h) => {
                let w = Width::from_family_offset(h, tag::OBJECT_UNSORTED_BASE).len();
                self.object_get_linear(w, key)
            }
            _ => Err(wrong_type("object")),
        }
    }

    /// Like [`Slice::get`], but a missing key is an error rather than `None`.
    pub fn require(&self, key: &str) -> Result<Slice<'a>> {
        self.get(key)?
            .ok_or_else(|| err(ErrorKind::KeyNotFound, format!("key not found: {key}")))
    }

    fn pair_key_at_rel(&self, rel: usize) -> Result<&'a str> {
        let key_size = tag::byte_size(&self.buf[rel..])?;
        Slice::new_unchecked(&self.buf[rel..rel + key_size]).get_string()
    }

    fn pair_value_at_rel(&self, rel: usize) -> Result<Slice<'a>> {
        let key_size = tag::byte_size(&self.buf[rel..])?;
        let val_start = rel + key_size;
        let val_size = tag::byte_size(&self.buf[val_start..])?;
        Slice::new(&self.buf[val_start..val_start + val_size])
    }

    fn object_get_sorted(&self, w: usize, key: &str) -> Result<Option<Slice<'a>>> {
        let len = self.object_len()?;
        let index_table_start = self.buf.len() - len * w;
        let mut lo = 0usize;
        let mut hi = len;
        while lo < hi {
            let mid = (lo + hi) / 2;
            let rel = numeric::read_uint_le(&self.buf[index_table_start + mid * w..], w) as usize;
            let k = self.pair_key_at_rel(rel)?;
            match k.cmp(key) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Ok(Some(self.pair_value_at_rel(rel)?)),
            }
        }
        Ok(None)
    }

    fn object_get_linear(&self, w: usize, key: &str) -> Result<Option<Slice<'a>>> {
        let len = self.object_len()?;
        let index_table_start = self.buf.len() - len * w;
        for i in 0..len {
            let rel = numeric::read_uint_le(&self.buf[index_table_start + i * w..], w) as usize;
            if self.pair_key_at_rel(rel)? == key {
                return Ok(Some(self.pair_value_at_rel(rel)?));
            }
        }
        Ok(None)
    }

    pub(crate) fn object_pair_at(&self, i: usize) -> Result<(&'a str, Slice<'a>)> {
        match self.buf[0] {
            tag::OBJECT_EMPTY => Err(err(ErrorKind::IndexOutOfRange, "index out of range in empty object")),
            tag::OBJECT_COMPACT => {
                let (k, v) = self.compact_nth(i, true)?;
                Ok((k.unwrap(), v))
            }
            h if (tag::OBJECT_SORTED_BASE..tag::ARRAY_COMPACT).contains(&h) => {
                let base = if h < tag::OBJECT_UNSORTED_BASE {
                    tag::OBJECT_SORTED_BASE
                } else {
                    tag::OBJECT_UNSORTED_BASE
                };
                let w = Width::from_family_offset(h, base).len();
                let len = self.object_len()?;
                if i >= len {
                    return Err(err(ErrorKind::IndexOutOfRange, "object index out of range"));
                }
                let index_table_start = self.buf.len() - len * w;
                let rel = numeric::read_uint_le(&self.buf[index_table_start + i * w..], w) as usize;
                Ok((self.pair_key_at_rel(rel)?, self.pair_value_at_rel(rel)?))
            }
            _ => Err(wrong_type("object")),
        }
    }

    pub fn iter_array(&self) -> Result<ArrayIter<'a>> {
        let len = self.length().map_err(|_| wrong_type("array"))?;
        if self.value_type() != ValueType::Array {
            return Err(wrong_type("array"));
        }
        Ok(ArrayIter::new(*self, len))
    }

    pub fn iter_object(&self) -> Result<ObjectIter<'a>> {
        if self.value_type() != ValueType::Object {
            return Err(wrong_type("object"));
        }
        let len = self.object_len()?;
        Ok(ObjectIter::new(*self, len))
    }

    /// A fasthash64 digest (seed `0xdeadbeef`) over the value's structure.
    /// Pinned for scalars: `hash(null)`, `hash(a double)` and `hash(a
    /// string)` match the reference library's own `Slice::hash()` output
    /// for the same input. See [`hash::structural_hash`] for how containers
    /// are folded, and why the two container vectors aren't pinned here.
    pub fn structural_hash(&self) -> u64 {
        hash::structural_hash(self)
    }

    /// Named counterpart to the `PartialEq`/`Eq` impls below, for callers
    /// that want to call it explicitly rather than via `==`.
    pub fn structural_eq(&self, other: &Slice<'_>) -> bool {
        hash::eq_slice(self, other)
    }
}

impl<'a> PartialEq for Slice<'a> {
    fn eq(&self, other: &Self) -> bool {
        hash::eq_slice(self, other)
    }
}
impl<'a> Eq for Slice<'a> {}

impl<'a> std::hash::Hash for Slice<'a> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        hash::hash_slice(self, state)
    }
}

impl<'a> std::fmt::Debug for Slice<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slice")
            .field("value_type", &self.value_type())
            .field("byte_size", &self.byte_size())
            .finish()
    }
}
