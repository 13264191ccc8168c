// One head byte selects among ~20 scalar encodings and 14 array/object
// layouts. Everything here is pure data: no I/O, no allocation, just the
// dispatch table the rest of the crate builds on.

use crate::numeric;
use vpack_base::{err, ErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    None,
    Illegal,
    Null,
    Bool,
    Double,
    Array,
    Object,
    SmallInt,
    Int,
    UInt,
    String,
    MinKey,
    MaxKey,
}

pub(crate) const ARRAY_EMPTY: u8 = 0x01;
pub(crate) const ARRAY_NOINDEX_BASE: u8 = 0x02; // 0x02..=0x05
pub(crate) const ARRAY_INDEXED_BASE: u8 = 0x06; // 0x06..=0x09
pub(crate) const OBJECT_EMPTY: u8 = 0x0a;
pub(crate) const OBJECT_SORTED_BASE: u8 = 0x0b; // 0x0b..=0x0e
pub(crate) const OBJECT_UNSORTED_BASE: u8 = 0x0f; // 0x0f..=0x12
pub(crate) const ARRAY_COMPACT: u8 = 0x13;
pub(crate) const OBJECT_COMPACT: u8 = 0x14;
pub(crate) const NULL: u8 = 0x18;
pub(crate) const FALSE: u8 = 0x19;
pub(crate) const TRUE: u8 = 0x1a;
pub(crate) const DOUBLE: u8 = 0x1b;
pub(crate) const MIN_KEY: u8 = 0x1e;
pub(crate) const MAX_KEY: u8 = 0x1f;
pub(crate) const INT_BASE: u8 = 0x1f; // width = head - INT_BASE, heads 0x20..=0x27
pub(crate) const UINT_BASE: u8 = 0x27; // width = head - UINT_BASE, heads 0x28..=0x2f
pub(crate) const SMALLINT_POS_BASE: u8 = 0x30; // 0x30..=0x39, value = head - base
pub(crate) const SMALLINT_NEG_BASE: u8 = 0x40; // 0x3a..=0x3f, value = head - base
pub(crate) const STRING_SHORT_BASE: u8 = 0x40; // 0x40..=0xbe, len = head - base
pub(crate) const STRING_LONG: u8 = 0xbf;

/// Width of a length/offset field. One of the four the format allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Width {
    W1 = 1,
    W2 = 2,
    W4 = 4,
    W8 = 8,
}

impl Width {
    pub(crate) fn len(self) -> usize {
        self as usize
    }

    pub(crate) fn from_family_offset(head: u8, base: u8) -> Width {
        match (head - base) & 0b11 {
            0 => Width::W1,
            1 => Width::W2,
            2 => Width::W4,
            3 => Width::W8,
            _ => unreachable!(),
        }
    }

    pub(crate) fn family_index(self) -> u8 {
        match self {
            Width::W1 => 0,
            Width::W2 => 1,
            Width::W4 => 2,
            Width::W8 => 3,
        }
    }

    /// The narrowest width that can represent `max_value`, per the Builder's
    /// layout-selection rule: smallest w in {1,2,4,8} such that every offset
    /// written into a length or index field fits.
    pub(crate) fn smallest_for(max_value: u64) -> Width {
        if max_value <= 0xff {
            Width::W1
        } else if max_value <= 0xffff {
            Width::W2
        } else if max_value <= 0xffff_ffff {
            Width::W4
        } else {
            Width::W8
        }
    }

    /// Largest value that fits in a field of this width.
    pub(crate) fn cap(self) -> u64 {
        match self {
            Width::W1 => 0xff,
            Width::W2 => 0xffff,
            Width::W4 => 0xffff_ffff,
            Width::W8 => u64::MAX,
        }
    }

    pub(crate) const ALL: [Width; 4] = [Width::W1, Width::W2, Width::W4, Width::W8];
}

fn require(buf: &[u8], n: usize) -> Result<()> {
    if buf.len() < n {
        Err(err(ErrorKind::MalformedInput, "buffer shorter than declared header"))
    } else {
        Ok(())
    }
}

/// Classifies a head byte into its `ValueType`. Total over all 256 values:
/// unassigned ranges fall back to `Illegal` so `byte_size` stays a pure,
/// total function of the head byte (invariant 1).
pub fn classify(head: u8) -> ValueType {
    match head {
        0x00 => ValueType::None,
        0x01..=0x09 | ARRAY_COMPACT => ValueType::Array,
        OBJECT_EMPTY..=0x12 | OBJECT_COMPACT => ValueType::Object,
        0x15..=0x17 | 0x1c..=0x1d | 0xc0..=0xff => ValueType::Illegal,
        NULL => ValueType::Null,
        FALSE | TRUE => ValueType::Bool,
        DOUBLE => ValueType::Double,
        MIN_KEY => ValueType::MinKey,
        MAX_KEY => ValueType::MaxKey,
        0x20..=0x27 => ValueType::Int,
        0x28..=0x2f => ValueType::UInt,
        0x30..=0x3f => ValueType::SmallInt,
        0x40..=0xbf => ValueType::String,
    }
}

/// `byte_size(head, buf) -> usize`, dispatched on the head byte. Reads at
/// most the next 8 bytes beyond the head (or the forward varint for a
/// compact container, itself capped at 8 trailing bytes by construction).
pub(crate) fn byte_size(buf: &[u8]) -> Result<usize> {
    require(buf, 1)?;
    let head = buf[0];
    Ok(match head {
        0x00 | ARRAY_EMPTY | OBJECT_EMPTY => 1,
        0x02..=0x05 => {
            let w = Width::from_family_offset(head, ARRAY_NOINDEX_BASE).len();
            require(buf, 1 + w)?;
            numeric::read_uint_le(&buf[1..], w) as usize
        }
        0x06..=0x09 => {
            let w = Width::from_family_offset(head, ARRAY_INDEXED_BASE).len();
            require(buf, 1 + w)?;
            numeric::read_uint_le(&buf[1..], w) as usize
        }
        0x0b..=0x0e => {
            let w = Width::from_family_offset(head, OBJECT_SORTED_BASE).len();
            require(buf, 1 + w)?;
            numeric::read_uint_le(&buf[1..], w) as usize
        }
        0x0f..=0x12 => {
            let w = Width::from_family_offset(head, OBJECT_UNSORTED_BASE).len();
            require(buf, 1 + w)?;
            numeric::read_uint_le(&buf[1..], w) as usize
        }
        ARRAY_COMPACT | OBJECT_COMPACT => {
            require(buf, 2)?;
            let (total, _) = numeric::read_uvarint_forward(&buf[1..])
                .ok_or_else(|| err(ErrorKind::Overflow, "compact total_size varint never terminates"))?;
            total as usize
        }
        0x15..=0x17 | 0x1c..=0x1d | 0xc0..=0xff => 1,
        NULL | FALSE | TRUE | MIN_KEY | MAX_KEY => 1,
        DOUBLE => 9,
        0x20..=0x27 => 1 + (head - INT_BASE) as usize,
        0x28..=0x2f => 1 + (head - UINT_BASE) as usize,
        0x30..=0x3f => 1,
        0x40..=0xbe => 1 + (head - STRING_SHORT_BASE) as usize,
        STRING_LONG => {
            require(buf, 9)?;
            9 + numeric::read_uint_le(&buf[1..], 8) as usize
        }
    })
}
