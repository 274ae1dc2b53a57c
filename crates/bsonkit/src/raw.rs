//! Borrowed, decoded element values.

use alloc::{string::ToString, vec::Vec};

use crate::{
    bson::{Bson, Document},
    decimal128::Decimal128,
    error::Result,
    oid::ObjectId,
    options::DecodeOptions,
    spec::{BinarySubtype, ElementType},
    types::{Binary, DateTime, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    view::{ArrayView, DocumentView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryRef<'a> {
    pub subtype: BinarySubtype,
    pub bytes: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexRef<'a> {
    pub pattern: &'a str,
    pub options: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbPointerRef<'a> {
    pub namespace: &'a str,
    pub id: ObjectId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeWithScopeRef<'a> {
    pub code: &'a str,
    pub scope: DocumentView<'a>,
}

/// A single decoded value that borrows strings, binaries and nested
/// documents from the buffer it was read from.
///
/// Nested documents and arrays are returned as views and are validated only
/// when they are themselves iterated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Double(f64),
    String(&'a str),
    Document(DocumentView<'a>),
    Array(ArrayView<'a>),
    Binary(BinaryRef<'a>),
    Undefined,
    ObjectId(ObjectId),
    Boolean(bool),
    DateTime(DateTime),
    Null,
    RegularExpression(RegexRef<'a>),
    DbPointer(DbPointerRef<'a>),
    JavaScriptCode(&'a str),
    Symbol(&'a str),
    JavaScriptCodeWithScope(CodeWithScopeRef<'a>),
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    Decimal128(Decimal128),
    MaxKey,
    MinKey,
}

impl<'a> RawValue<'a> {
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            RawValue::Double(_) => ElementType::Double,
            RawValue::String(_) => ElementType::String,
            RawValue::Document(_) => ElementType::EmbeddedDocument,
            RawValue::Array(_) => ElementType::Array,
            RawValue::Binary(_) => ElementType::Binary,
            RawValue::Undefined => ElementType::Undefined,
            RawValue::ObjectId(_) => ElementType::ObjectId,
            RawValue::Boolean(_) => ElementType::Boolean,
            RawValue::DateTime(_) => ElementType::DateTime,
            RawValue::Null => ElementType::Null,
            RawValue::RegularExpression(_) => ElementType::RegularExpression,
            RawValue::DbPointer(_) => ElementType::DbPointer,
            RawValue::JavaScriptCode(_) => ElementType::JavaScriptCode,
            RawValue::Symbol(_) => ElementType::Symbol,
            RawValue::JavaScriptCodeWithScope(_) => ElementType::JavaScriptCodeWithScope,
            RawValue::Int32(_) => ElementType::Int32,
            RawValue::Timestamp(_) => ElementType::Timestamp,
            RawValue::Int64(_) => ElementType::Int64,
            RawValue::Decimal128(_) => ElementType::Decimal128,
            RawValue::MaxKey => ElementType::MaxKey,
            RawValue::MinKey => ElementType::MinKey,
        }
    }

    /// Copies the value, and everything nested inside it, into an owned
    /// [`Bson`].
    ///
    /// # Errors
    ///
    /// Fails if a nested document is malformed or nested too deeply.
    pub fn to_bson(&self) -> Result<Bson> {
        self.to_bson_with(&DecodeOptions::default(), 0)
    }

    pub(crate) fn to_bson_with(&self, options: &DecodeOptions, depth: usize) -> Result<Bson> {
        Ok(match *self {
            RawValue::Double(v) => Bson::Double(v),
            RawValue::String(s) => Bson::String(s.to_string()),
            RawValue::Document(d) => Bson::Document(Document::decode_nested(d, options, depth + 1)?),
            RawValue::Array(a) => {
                let doc = Document::decode_nested(a.as_document(), options, depth + 1)?;
                Bson::Array(doc.into_iter().map(|(_, v)| v).collect::<Vec<_>>())
            }
            RawValue::Binary(b) => Bson::Binary(Binary {
                subtype: b.subtype,
                bytes: b.bytes.to_vec(),
            }),
            RawValue::Undefined => Bson::Undefined,
            RawValue::ObjectId(oid) => Bson::ObjectId(oid),
            RawValue::Boolean(b) => Bson::Boolean(b),
            RawValue::DateTime(dt) => Bson::DateTime(dt),
            RawValue::Null => Bson::Null,
            RawValue::RegularExpression(re) => Bson::RegularExpression(Regex {
                pattern: re.pattern.to_string(),
                options: re.options.to_string(),
            }),
            RawValue::DbPointer(p) => Bson::DbPointer(DbPointer {
                namespace: p.namespace.to_string(),
                id: p.id,
            }),
            RawValue::JavaScriptCode(s) => Bson::JavaScriptCode(s.to_string()),
            RawValue::Symbol(s) => Bson::Symbol(s.to_string()),
            RawValue::JavaScriptCodeWithScope(cws) => {
                Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                    code: cws.code.to_string(),
                    scope: Document::decode_nested(cws.scope, options, depth + 1)?,
                })
            }
            RawValue::Int32(v) => Bson::Int32(v),
            RawValue::Timestamp(ts) => Bson::Timestamp(ts),
            RawValue::Int64(v) => Bson::Int64(v),
            RawValue::Decimal128(d) => Bson::Decimal128(d),
            RawValue::MaxKey => Bson::MaxKey,
            RawValue::MinKey => Bson::MinKey,
        })
    }
}

macro_rules! impl_from_scalar {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for RawValue<'_> {
                fn from(v: $t) -> Self {
                    RawValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar!(
    f64 => Double,
    bool => Boolean,
    i32 => Int32,
    i64 => Int64,
    ObjectId => ObjectId,
    DateTime => DateTime,
    Timestamp => Timestamp,
    Decimal128 => Decimal128,
);

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(s: &'a str) -> Self {
        RawValue::String(s)
    }
}

impl<'a> From<DocumentView<'a>> for RawValue<'a> {
    fn from(d: DocumentView<'a>) -> Self {
        RawValue::Document(d)
    }
}

impl<'a> From<ArrayView<'a>> for RawValue<'a> {
    fn from(a: ArrayView<'a>) -> Self {
        RawValue::Array(a)
    }
}

impl<'a> From<BinaryRef<'a>> for RawValue<'a> {
    fn from(b: BinaryRef<'a>) -> Self {
        RawValue::Binary(b)
    }
}
