//! VPack: a compact, self-describing binary document format.
//!
//! A single head byte identifies every value's type and, for scalars, its
//! exact encoded width; containers additionally carry their own byte size
//! so a reader can skip a value without interpreting its contents. See
//! [`Builder`] to compose a document and [`Slice`] to read one back without
//! copying.

mod builder;
mod doc;
mod hash;
mod iter;
mod numeric;
mod slice;
mod tag;
mod value;

pub use builder::Builder;
pub use doc::OwnedDoc;
pub use iter::{ArrayIter, ObjectIter};
pub use slice::Slice;
pub use tag::ValueType;
pub use value::Value;

pub use vpack_base::{err, Error, ErrorKind, Result};

#[cfg(test)]
mod conformance;
#[cfg(test)]
mod test;
