// We want a few things here:
// 1. A way to create a new error with a backtrace
// 2. A typed category (`ErrorKind`) so callers can match on the failure without
//    parsing the message, per the error kinds named in the byte-format contract.
// 3. A single log emission at construction time, routed through `tracing`.

use backtrace_error::DynBacktraceError;
use std::borrow::Cow;
use tracing::error;

#[cfg(test)]
use test_log::test;

/// Category of a VPack failure, surfaced to callers that want to match on it
/// rather than parse `Display` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A typed getter was called on a value whose head byte isn't in its accepted set.
    WrongType,
    /// `at(i)` was called with `i >= length()`.
    IndexOutOfRange,
    /// A hard key lookup found no matching attribute.
    KeyNotFound,
    /// A Builder was used out of its valid sequence (double close, add-after-close,
    /// `add_key` on a non-object, etc).
    BuilderClosedViolation,
    /// A container's byte size or element count exceeds the widest variant's bounds.
    Overflow,
    /// Slice construction over bytes with a reserved/illegal head byte, or a
    /// declared length that runs past the end of the buffer.
    MalformedInput,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::WrongType => "wrong type",
            ErrorKind::IndexOutOfRange => "index out of range",
            ErrorKind::KeyNotFound => "key not found",
            ErrorKind::BuilderClosedViolation => "builder closed violation",
            ErrorKind::Overflow => "overflow",
            ErrorKind::MalformedInput => "malformed input",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    msg: Cow<'static, str>,
    #[allow(dead_code)]
    inner: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

struct KindedMsg(ErrorKind, Cow<'static, str>);
impl std::fmt::Debug for KindedMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0, self.1)
    }
}
impl std::fmt::Display for KindedMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0, self.1)
    }
}
impl std::error::Error for KindedMsg {
    fn description(&self) -> &str {
        &self.1
    }
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<Cow<'static, str>>) -> Error {
        let msg = msg.into();
        let kinded = KindedMsg(kind, msg.clone());
        error!(target: "vpack", "{:?}", kinded);
        Error {
            kind,
            msg,
            inner: DynBacktraceError::from(kinded),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)
    }
}
impl std::error::Error for Error {}

pub fn err(kind: ErrorKind, msg: impl Into<Cow<'static, str>>) -> Error {
    Error::new(kind, msg)
}

#[test]
fn test_error() {
    let e = err(ErrorKind::WrongType, "expected an int");
    assert_eq!(e.kind(), ErrorKind::WrongType);
    assert!(format!("{e}").contains("expected an int"));
}
