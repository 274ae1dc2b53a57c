//! Wire-level constants: element type tags and binary subtypes.

use core::fmt;

/// The one-byte tag that precedes every element in an encoded document.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ElementType {
    Double = 0x01,
    String = 0x02,
    EmbeddedDocument = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Undefined = 0x06,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    RegularExpression = 0x0B,
    DbPointer = 0x0C,
    JavaScriptCode = 0x0D,
    Symbol = 0x0E,
    JavaScriptCodeWithScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    Decimal128 = 0x13,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl ElementType {
    /// Maps a wire tag back to its type, or `None` for unassigned tags.
    #[must_use]
    pub fn from_u8(tag: u8) -> Option<Self> {
        use ElementType::*;
        Some(match tag {
            0x01 => Double,
            0x02 => String,
            0x03 => EmbeddedDocument,
            0x04 => Array,
            0x05 => Binary,
            0x06 => Undefined,
            0x07 => ObjectId,
            0x08 => Boolean,
            0x09 => DateTime,
            0x0A => Null,
            0x0B => RegularExpression,
            0x0C => DbPointer,
            0x0D => JavaScriptCode,
            0x0E => Symbol,
            0x0F => JavaScriptCodeWithScope,
            0x10 => Int32,
            0x11 => Timestamp,
            0x12 => Int64,
            0x13 => Decimal128,
            0x7F => MaxKey,
            0xFF => MinKey,
            _ => return None,
        })
    }

    /// Size of the payload for fixed-width types.
    pub(crate) fn fixed_size(self) -> Option<usize> {
        use ElementType::*;
        match self {
            Undefined | Null | MaxKey | MinKey => Some(0),
            Boolean => Some(1),
            Int32 => Some(4),
            Double | DateTime | Timestamp | Int64 => Some(8),
            ObjectId => Some(12),
            Decimal128 => Some(16),
            String | EmbeddedDocument | Array | Binary | RegularExpression | DbPointer
            | JavaScriptCode | Symbol | JavaScriptCodeWithScope => None,
        }
    }

    fn name(self) -> &'static str {
        use ElementType::*;
        match self {
            Double => "double",
            String => "string",
            EmbeddedDocument => "document",
            Array => "array",
            Binary => "binary",
            Undefined => "undefined",
            ObjectId => "oid",
            Boolean => "bool",
            DateTime => "date",
            Null => "null",
            RegularExpression => "regex",
            DbPointer => "dbpointer",
            JavaScriptCode => "code",
            Symbol => "symbol",
            JavaScriptCodeWithScope => "codewscope",
            Int32 => "int32",
            Timestamp => "timestamp",
            Int64 => "int64",
            Decimal128 => "decimal128",
            MaxKey => "maxkey",
            MinKey => "minkey",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The subtype byte of a binary element.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinarySubtype {
    Generic,
    Function,
    /// Deprecated subtype 0x02, which repeats the payload length inside the
    /// payload.
    BinaryOld,
    UuidOld,
    Uuid,
    Md5,
    Encrypted,
    Column,
    Sensitive,
    Vector,
    UserDefined(u8),
    Reserved(u8),
}

impl From<u8> for BinarySubtype {
    fn from(byte: u8) -> Self {
        match byte {
            0x00 => Self::Generic,
            0x01 => Self::Function,
            0x02 => Self::BinaryOld,
            0x03 => Self::UuidOld,
            0x04 => Self::Uuid,
            0x05 => Self::Md5,
            0x06 => Self::Encrypted,
            0x07 => Self::Column,
            0x08 => Self::Sensitive,
            0x09 => Self::Vector,
            0x80..=0xFF => Self::UserDefined(byte),
            _ => Self::Reserved(byte),
        }
    }
}

impl From<BinarySubtype> for u8 {
    fn from(subtype: BinarySubtype) -> u8 {
        match subtype {
            BinarySubtype::Generic => 0x00,
            BinarySubtype::Function => 0x01,
            BinarySubtype::BinaryOld => 0x02,
            BinarySubtype::UuidOld => 0x03,
            BinarySubtype::Uuid => 0x04,
            BinarySubtype::Md5 => 0x05,
            BinarySubtype::Encrypted => 0x06,
            BinarySubtype::Column => 0x07,
            BinarySubtype::Sensitive => 0x08,
            BinarySubtype::Vector => 0x09,
            BinarySubtype::UserDefined(b) | BinarySubtype::Reserved(b) => b,
        }
    }
}

/// Largest length an `int32` prefix can describe; builders refuse to grow past it.
pub const MAX_DOCUMENT_SIZE: usize = i32::MAX as usize;

/// Length of the smallest possible document: `05 00 00 00 00`.
pub const MIN_DOCUMENT_SIZE: usize = 5;
