use thiserror::Error;

use crate::{oid::ObjectIdError, spec::ElementType};

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Every failure the codec can report.
///
/// Data errors ([`Error::Codec`], [`Error::JsonParse`]) describe malformed
/// input and are never retryable. The remaining kinds describe misuse of the
/// API: asking an element for the wrong type, reading an unset element, or
/// driving a [`Builder`](crate::Builder) out of order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("expected an element of type {expected}, found {actual}")]
    TypeMismatch {
        expected: ElementType,
        actual: ElementType,
    },
    #[error("accessed an unset element")]
    UnsetElement,
    #[error("builder misuse: {0}")]
    BuilderMisuse(#[from] BuilderMisuse),
    #[error(transparent)]
    JsonParse(#[from] JsonParseError),
    #[error("invalid ObjectId: {0}")]
    InvalidObjectId(#[from] ObjectIdError),
    #[error("invalid Decimal128 string")]
    InvalidDecimal128,
}

impl Error {
    /// Returns `true` if the error describes malformed binary input.
    #[must_use]
    pub fn is_codec(&self) -> bool {
        matches!(self, Self::Codec(..))
    }
}

/// Malformed binary input, located by its byte offset.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at byte {offset}")]
pub struct CodecError {
    pub kind: CodecErrorKind,
    /// Offset from the start of the outermost buffer being read.
    pub offset: usize,
}

impl CodecError {
    pub(crate) fn new(kind: CodecErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecErrorKind {
    #[error("unexpected end of buffer")]
    Truncated,
    #[error("length field disagrees with the buffer")]
    LengthMismatch,
    #[error("invalid length {0}")]
    InvalidLength(i64),
    #[error("missing NUL terminator")]
    MissingTerminator,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("unknown element type 0x{0:02X}")]
    UnknownType(u8),
    #[error("invalid boolean byte 0x{0:02X}")]
    InvalidBoolean(u8),
    #[error("maximum nesting depth exceeded")]
    MaxDepthExceeded,
    #[error("trailing bytes after the last element")]
    TrailingBytes,
}

/// Out-of-order use of a [`Builder`](crate::Builder), or construction of a
/// value that cannot be encoded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuilderMisuse {
    #[error("{depth} sub-document or sub-array context(s) still open")]
    OpenContexts { depth: usize },
    #[error("the builder has already been finalized")]
    Finalized,
    #[error("cannot append a key while building an array")]
    KeyInArray,
    #[error("cannot append an indexed value while building a document")]
    ArrayOperationOnDocument,
    #[error("no sub-document is open")]
    NoDocumentToClose,
    #[error("no sub-array is open")]
    NoArrayToClose,
    #[error("cannot close an array while building a document")]
    CloseArrayInDocument,
    #[error("cannot close a document while building an array")]
    CloseDocumentInArray,
    #[error("keys and regular expressions may not contain NUL bytes")]
    InteriorNul,
    #[error("cannot construct a value of type {0} without a payload")]
    InvalidType(ElementType),
    #[error("encoded document exceeds the maximum BSON size")]
    DocumentTooLarge,
    #[error("cannot append a document or array with a malformed header")]
    MalformedDocument,
}

/// Malformed (Extended) JSON text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {line}:{column}")]
pub struct JsonParseError {
    pub kind: JsonErrorKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum JsonErrorKind {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    InvalidUnicodeEscape(u32),
    #[error("invalid number")]
    InvalidNumber,
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("trailing characters after the top-level value")]
    TrailingCharacters,
    #[error("expected a top-level {0}")]
    WrongTopLevel(&'static str),
    #[error("maximum nesting depth exceeded")]
    MaxDepthExceeded,
    #[error("invalid extended JSON: {0}")]
    ExtendedJson(&'static str),
}
