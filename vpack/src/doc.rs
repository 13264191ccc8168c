// Owned, cheaply-cloneable document storage, mirroring the teacher's
// `Cursor<Arc<[u8]>>` reader: the bytes live once behind an `Arc`, and every
// `Slice` borrowed from them is a plain `&[u8]` view with no further
// indirection.

use crate::slice::Slice;
use std::sync::Arc;

/// A complete VPack document with its own backing storage.
#[derive(Debug, Clone)]
pub struct OwnedDoc {
    bytes: Arc<[u8]>,
}

impl OwnedDoc {
    pub(crate) fn new(buf: Vec<u8>) -> OwnedDoc {
        OwnedDoc { bytes: Arc::from(buf) }
    }

    /// Wraps pre-existing bytes that are already a valid VPack document.
    /// Bounds and head-byte validity are only checked once, by `slice()`.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> OwnedDoc {
        OwnedDoc { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Borrows the document as a `Slice`. Panics if the stored bytes are not
    /// a well-formed single value, which can only happen via `from_bytes`
    /// with bad input; values produced by `Builder::finish` are always well
    /// formed.
    pub fn slice(&self) -> Slice<'_> {
        Slice::new(&self.bytes).expect("OwnedDoc must hold a well-formed value")
    }
}

impl PartialEq for OwnedDoc {
    fn eq(&self, other: &Self) -> bool {
        self.slice() == other.slice()
    }
}
impl Eq for OwnedDoc {}

impl std::hash::Hash for OwnedDoc {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.slice().hash(state)
    }
}
