// Incremental byte-buffer composer. Containers are opened with a 17-byte
// placeholder header (1 head byte + an 8-byte size field + an 8-byte count
// field, the widest either could ever need), filled with their payload by
// further `add`/`add_key` calls, and narrowed to their final width only at
// `close`, once every element's offset and the payload length are known.
// This mirrors the teacher's write-placeholder-then-rewrite-on-close pattern
// for block and track metadata, generalized from "one footer" to "pick the
// narrowest of four header widths and shift the payload to meet it".

use crate::doc::OwnedDoc;
use crate::numeric;
use crate::slice::Slice;
use crate::tag::{self, Width};
use crate::value::Value;
use vpack_base::{err, ErrorKind, Result};

const PLACEHOLDER_LEN: usize = 1 + 8 + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Array { force_indexed: bool },
    Object { sorted: bool },
}

struct Frame {
    start: usize,
    kind: ContainerKind,
    /// Absolute offsets (into `buf`, pre-shift) of each element, or of each
    /// pair's key for objects.
    offsets: Vec<usize>,
}

/// Builds a single VPack document by incremental appends.
///
/// A Builder holds exactly one top-level value: either one scalar, or one
/// container tree opened with `add`/`add_key` and closed with `close`.
/// Calling anything after the top-level value is complete is a
/// [`ErrorKind::BuilderClosedViolation`].
pub struct Builder {
    buf: Vec<u8>,
    stack: Vec<Frame>,
    top_level_done: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            buf: Vec::new(),
            stack: Vec::new(),
            top_level_done: false,
        }
    }

    pub fn with_capacity(n: usize) -> Builder {
        Builder {
            buf: Vec::with_capacity(n),
            stack: Vec::new(),
            top_level_done: false,
        }
    }

    pub fn reserve(&mut self, n: usize) {
        self.buf.reserve(n);
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn start(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    /// Appends a scalar, or opens a container, as the next array element (or
    /// the sole top-level value). Errors if the currently open container is
    /// an object: objects require `add_key`.
    pub fn add(&mut self, value: Value) -> Result<()> {
        self.begin_element(None)?;
        self.write_value(value)
    }

    /// Appends a scalar, or opens a container, as the value of `key` in the
    /// currently open object. Errors if nothing is open, or the open
    /// container is an array.
    pub fn add_key(&mut self, key: &str, value: Value) -> Result<()> {
        self.begin_element(Some(key))?;
        self.write_value(value)
    }

    /// Closes the innermost open container, choosing its final layout.
    pub fn close(&mut self) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| err(ErrorKind::BuilderClosedViolation, "close called with no open container"))?;

        let n = frame.offsets.len();
        let payload_start = frame.start + PLACEHOLDER_LEN;
        let payload_end = self.buf.len();

        match frame.kind {
            ContainerKind::Array { force_indexed } => {
                if n == 0 {
                    self.buf.truncate(frame.start);
                    self.buf.push(tag::ARRAY_EMPTY);
                } else if !force_indexed && uniform_width(&frame.offsets, payload_end) {
                    self.close_noindex_array(frame.start, payload_start, payload_end);
                } else {
                    self.close_indexed(frame.start, payload_start, payload_end, &frame.offsets, tag::ARRAY_INDEXED_BASE);
                }
            }
            ContainerKind::Object { sorted } => {
                if n == 0 {
                    self.buf.truncate(frame.start);
                    self.buf.push(tag::OBJECT_EMPTY);
                } else if n == 1 {
                    self.close_compact_object(frame.start, payload_start, payload_end);
                } else {
                    let mut offsets = frame.offsets.clone();
                    if sorted {
                        self.sort_offsets_by_key(&mut offsets);
                    }
                    let base = if sorted { tag::OBJECT_SORTED_BASE } else { tag::OBJECT_UNSORTED_BASE };
                    self.close_indexed(frame.start, payload_start, payload_end, &offsets, base);
                }
            }
        }

        if self.stack.is_empty() {
            self.top_level_done = true;
        }
        Ok(())
    }

    /// Consumes the Builder, sealing its buffer into an owned, reference
    /// counted document. Errors if the top-level value was never completed.
    pub fn finish(self) -> Result<OwnedDoc> {
        if !self.top_level_done {
            return Err(err(
                ErrorKind::BuilderClosedViolation,
                "finish called before the top-level value was closed",
            ));
        }
        Ok(OwnedDoc::new(self.buf))
    }

    /// Borrows the bytes written so far as a `Slice`. Only meaningful once
    /// at least one value has been written.
    pub fn slice(&self) -> Result<Slice<'_>> {
        Slice::new(&self.buf)
    }

    fn begin_element(&mut self, key: Option<&str>) -> Result<()> {
        if self.top_level_done {
            return Err(err(ErrorKind::BuilderClosedViolation, "add called after the top-level value was closed"));
        }
        let top_kind = self.stack.last().map(|f| f.kind);
        match top_kind {
            Some(ContainerKind::Array { .. }) => {
                if key.is_some() {
                    return Err(err(
                        ErrorKind::BuilderClosedViolation,
                        "add_key called while the open container is an array",
                    ));
                }
                let offset = self.buf.len();
                self.stack.last_mut().unwrap().offsets.push(offset);
            }
            Some(ContainerKind::Object { .. }) => {
                let key = key.ok_or_else(|| {
                    err(ErrorKind::BuilderClosedViolation, "add called on an object; use add_key")
                })?;
                let offset = self.buf.len();
                self.stack.last_mut().unwrap().offsets.push(offset);
                self.write_string(key);
            }
            None => {
                if key.is_some() {
                    return Err(err(ErrorKind::BuilderClosedViolation, "add_key called with no open object"));
                }
            }
        }
        Ok(())
    }

    fn write_value(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Null => {
                self.buf.push(tag::NULL);
                self.finish_scalar();
            }
            Value::Bool(b) => {
                self.buf.push(if b { tag::TRUE } else { tag::FALSE });
                self.finish_scalar();
            }
            Value::MinKey => {
                self.buf.push(tag::MIN_KEY);
                self.finish_scalar();
            }
            Value::MaxKey => {
                self.buf.push(tag::MAX_KEY);
                self.finish_scalar();
            }
            Value::Double(d) => {
                self.buf.push(tag::DOUBLE);
                numeric::write_f64_le(&mut self.buf, d);
                self.finish_scalar();
            }
            Value::Int(v) => {
                self.write_int(v);
                self.finish_scalar();
            }
            Value::UInt(v) => {
                self.write_uint(v);
                self.finish_scalar();
            }
            Value::String(s) => {
                self.write_string(s);
                self.finish_scalar();
            }
            Value::Array => self.open_container(ContainerKind::Array { force_indexed: false }),
            Value::ArrayIndexed => self.open_container(ContainerKind::Array { force_indexed: true }),
            Value::Object => self.open_container(ContainerKind::Object { sorted: true }),
            Value::ObjectUnsorted => self.open_container(ContainerKind::Object { sorted: false }),
        }
        Ok(())
    }

    fn finish_scalar(&mut self) {
        if self.stack.is_empty() {
            self.top_level_done = true;
        }
    }

    fn open_container(&mut self, kind: ContainerKind) {
        let start = self.buf.len();
        self.buf.resize(start + PLACEHOLDER_LEN, 0);
        self.stack.push(Frame { start, kind, offsets: Vec::new() });
    }

    fn write_int(&mut self, v: i64) {
        if (-6..=9).contains(&v) {
            let head = if v >= 0 {
                tag::SMALLINT_POS_BASE + v as u8
            } else {
                (tag::SMALLINT_NEG_BASE as i64 + v) as u8
            };
            self.buf.push(head);
            return;
        }
        let w = smallest_signed_width(v);
        self.buf.push(tag::INT_BASE + w as u8);
        numeric::write_int_le(&mut self.buf, v, w);
    }

    fn write_uint(&mut self, v: u64) {
        let w = smallest_unsigned_width(v);
        self.buf.push(tag::UINT_BASE + w as u8);
        numeric::write_uint_le(&mut self.buf, v, w);
    }

    fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        if bytes.len() <= 126 {
            self.buf.push(tag::STRING_SHORT_BASE + bytes.len() as u8);
            self.buf.extend_from_slice(bytes);
        } else {
            self.buf.push(tag::STRING_LONG);
            numeric::write_uint_le(&mut self.buf, bytes.len() as u64, 8);
            self.buf.extend_from_slice(bytes);
        }
    }

    fn close_noindex_array(&mut self, start: usize, payload_start: usize, payload_end: usize) {
        let payload_len = payload_end - payload_start;
        for w in Width::ALL {
            let total = 1 + w.len() + payload_len;
            if (total as u64) <= w.cap() {
                let new_payload_start = start + 1 + w.len();
                self.buf.copy_within(payload_start..payload_end, new_payload_start);
                self.buf.truncate(new_payload_start + payload_len);
                self.buf[start] = tag::ARRAY_NOINDEX_BASE + w.family_index();
                numeric::patch_uint_le(&mut self.buf[start + 1..], total as u64, w.len());
                return;
            }
        }
        unreachable!("width 8 always fits a u64 total");
    }

    fn close_indexed(&mut self, start: usize, payload_start: usize, payload_end: usize, offsets: &[usize], base: u8) {
        let n = offsets.len();
        let payload_len = payload_end - payload_start;
        for w in Width::ALL {
            let new_payload_start = start + 1 + w.len() + w.len();
            let shift = payload_start as i64 - new_payload_start as i64;
            let max_rel = offsets
                .iter()
                .map(|&o| (o as i64 - shift) - start as i64)
                .max()
                .unwrap_or(0) as u64;
            let total = 1 + w.len() + w.len() + payload_len + w.len() * n;
            if (total as u64) <= w.cap() && max_rel <= w.cap() {
                self.buf.copy_within(payload_start..payload_end, new_payload_start);
                self.buf.truncate(new_payload_start + payload_len);
                for &o in offsets {
                    let new_abs = (o as i64 - shift) as usize;
                    let rel = (new_abs - start) as u64;
                    numeric::write_uint_le(&mut self.buf, rel, w.len());
                }
                self.buf[start] = base + w.family_index();
                numeric::patch_uint_le(&mut self.buf[start + 1..], total as u64, w.len());
                numeric::patch_uint_le(&mut self.buf[start + 1 + w.len()..], n as u64, w.len());
                return;
            }
        }
        unreachable!("width 8 always fits a u64 total and offset");
    }

    /// Single-attribute object: no index table needed since `at(0)` (the
    /// only valid index) always starts right after the trailing count.
    fn close_compact_object(&mut self, start: usize, payload_start: usize, payload_end: usize) {
        let payload_len = payload_end - payload_start;
        let count_len = numeric::uvarint_forward_len(1);

        let mut w = 1usize;
        loop {
            let total = 1 + w + payload_len + count_len;
            let needed = numeric::uvarint_forward_len(total as u64);
            if needed == w {
                break;
            }
            w = needed;
        }
        let total = 1 + w + payload_len + count_len;
        let new_payload_start = start + 1 + w;

        self.buf.copy_within(payload_start..payload_end, new_payload_start);
        self.buf.truncate(new_payload_start + payload_len);
        self.buf[start] = tag::OBJECT_COMPACT;
        write_uvarint_into(&mut self.buf[start + 1..start + 1 + w], total as u64);
        numeric::write_uvarint_backward(&mut self.buf, 1);
    }

    fn sort_offsets_by_key(&self, offsets: &mut [usize]) {
        offsets.sort_by(|&a, &b| self.key_bytes_at(a).cmp(self.key_bytes_at(b)));
    }

    fn key_bytes_at(&self, offset: usize) -> &[u8] {
        let head = self.buf[offset];
        match head {
            tag::STRING_LONG => {
                let len = numeric::read_uint_le(&self.buf[offset + 1..], 8) as usize;
                &self.buf[offset + 9..offset + 9 + len]
            }
            h if (tag::STRING_SHORT_BASE..=0xbe).contains(&h) => {
                let len = (h - tag::STRING_SHORT_BASE) as usize;
                &self.buf[offset + 1..offset + 1 + len]
            }
            _ => &[],
        }
    }
}

fn write_uvarint_into(slice: &mut [u8], value: u64) {
    let mut v = value;
    let last = slice.len() - 1;
    for (i, slot) in slice.iter_mut().enumerate() {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if i != last {
            byte |= 0x80;
        }
        *slot = byte;
    }
}

fn smallest_signed_width(v: i64) -> usize {
    for w in 1..8 {
        let bits = 8 * w;
        let lo = -(1i64 << (bits - 1));
        let hi = (1i64 << (bits - 1)) - 1;
        if v >= lo && v <= hi {
            return w;
        }
    }
    8
}

fn smallest_unsigned_width(v: u64) -> usize {
    for w in 1..8 {
        if v <= (1u64 << (8 * w)) - 1 {
            return w;
        }
    }
    8
}

/// True if every element (or pair, measured key-start to key-start) spans
/// the same number of bytes, letting the array skip its index table.
fn uniform_width(offsets: &[usize], payload_end: usize) -> bool {
    let n = offsets.len();
    if n == 0 {
        return true;
    }
    let w0 = if n == 1 { payload_end - offsets[0] } else { offsets[1] - offsets[0] };
    for i in 0..n {
        let end = if i + 1 < n { offsets[i + 1] } else { payload_end };
        if end - offsets[i] != w0 {
            return false;
        }
    }
    true
}
