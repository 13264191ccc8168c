use crate::slice::Slice;

/// Cursor into a compact array's payload, advanced by the previous element's
/// own `byte_size` so sequential iteration never rescans from the start.
#[derive(Clone)]
struct CompactCursor<'a> {
    payload: &'a [u8],
    offset: usize,
}

/// Iterates the elements of an array `Slice` in physical order. Indexed and
/// uniform-width arrays step via `Slice::at`, which is already O(1); compact
/// arrays (no index table) step via a running byte cursor instead, so a full
/// scan stays O(n) rather than O(n^2).
#[derive(Clone)]
pub struct ArrayIter<'a> {
    container: Slice<'a>,
    idx: usize,
    len: usize,
    compact: Option<CompactCursor<'a>>,
}

impl<'a> ArrayIter<'a> {
    pub(crate) fn new(container: Slice<'a>, len: usize) -> ArrayIter<'a> {
        let compact = container.compact_array_payload().map(|payload| CompactCursor { payload, offset: 0 });
        ArrayIter { container, idx: 0, len, compact }
    }
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Slice<'a>;

    fn next(&mut self) -> Option<Slice<'a>> {
        if self.idx >= self.len {
            return None;
        }
        let v = match &mut self.compact {
            Some(cursor) => {
                let v = Slice::new(&cursor.payload[cursor.offset..]).expect("well-formed compact element");
                cursor.offset += v.byte_size();
                v
            }
            None => self.container.at(self.idx).expect("index within bounds established at iterator creation"),
        };
        self.idx += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.len - self.idx;
        (rem, Some(rem))
    }
}

impl<'a> ExactSizeIterator for ArrayIter<'a> {}

/// Iterates the attributes of an object `Slice` in physical (table) order:
/// sorted order for a sorted object, insertion order otherwise.
#[derive(Clone)]
pub struct ObjectIter<'a> {
    container: Slice<'a>,
    idx: usize,
    len: usize,
}

impl<'a> ObjectIter<'a> {
    pub(crate) fn new(container: Slice<'a>, len: usize) -> ObjectIter<'a> {
        ObjectIter { container, idx: 0, len }
    }
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = (&'a str, Slice<'a>);

    fn next(&mut self) -> Option<(&'a str, Slice<'a>)> {
        if self.idx >= self.len {
            return None;
        }
        let pair = self
            .container
            .object_pair_at(self.idx)
            .expect("index within bounds established at iterator creation");
        self.idx += 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.len - self.idx;
        (rem, Some(rem))
    }
}

impl<'a> ExactSizeIterator for ObjectIter<'a> {}
