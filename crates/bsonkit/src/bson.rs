//! The owned value model.
//!
//! [`Bson`] and [`Document`] own all of their data and can be freely
//! mutated. They convert to and from the encoded form through
//! [`Document::encode`] and [`Document::decode`].

use alloc::{string::String, vec::Vec};
use core::fmt;

use crate::{
    buffer::ByteBuffer,
    builder::Builder,
    codec::{write_binary, write_cstring, write_string},
    decimal128::Decimal128,
    error::{BuilderMisuse, CodecErrorKind, Error, Result},
    oid::ObjectId,
    options::{DecodeOptions, JsonMode},
    spec::ElementType,
    types::{Binary, DateTime, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    value::DocumentValue,
    view::{DocumentView, IndexKey},
};

/// An owned array.
pub type Array = Vec<Bson>;

/// Any value that can be stored in a document.
#[derive(Debug, Clone)]
pub enum Bson {
    Double(f64),
    String(String),
    Document(Document),
    Array(Array),
    Binary(Binary),
    Undefined,
    ObjectId(ObjectId),
    Boolean(bool),
    DateTime(DateTime),
    Null,
    RegularExpression(Regex),
    DbPointer(DbPointer),
    JavaScriptCode(String),
    Symbol(String),
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    Int32(i32),
    Timestamp(Timestamp),
    Int64(i64),
    Decimal128(Decimal128),
    MaxKey,
    MinKey,
}

impl Bson {
    /// Builds one of the payload-free values from its type tag.
    ///
    /// # Errors
    ///
    /// [`BuilderMisuse::InvalidType`] for every type that carries a payload.
    pub fn from_unit_type(ty: ElementType) -> Result<Self> {
        match ty {
            ElementType::Null => Ok(Bson::Null),
            ElementType::Undefined => Ok(Bson::Undefined),
            ElementType::MinKey => Ok(Bson::MinKey),
            ElementType::MaxKey => Ok(Bson::MaxKey),
            other => Err(Error::BuilderMisuse(BuilderMisuse::InvalidType(other))),
        }
    }

    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Bson::Double(_) => ElementType::Double,
            Bson::String(_) => ElementType::String,
            Bson::Document(_) => ElementType::EmbeddedDocument,
            Bson::Array(_) => ElementType::Array,
            Bson::Binary(_) => ElementType::Binary,
            Bson::Undefined => ElementType::Undefined,
            Bson::ObjectId(_) => ElementType::ObjectId,
            Bson::Boolean(_) => ElementType::Boolean,
            Bson::DateTime(_) => ElementType::DateTime,
            Bson::Null => ElementType::Null,
            Bson::RegularExpression(_) => ElementType::RegularExpression,
            Bson::DbPointer(_) => ElementType::DbPointer,
            Bson::JavaScriptCode(_) => ElementType::JavaScriptCode,
            Bson::Symbol(_) => ElementType::Symbol,
            Bson::JavaScriptCodeWithScope(_) => ElementType::JavaScriptCodeWithScope,
            Bson::Int32(_) => ElementType::Int32,
            Bson::Timestamp(_) => ElementType::Timestamp,
            Bson::Int64(_) => ElementType::Int64,
            Bson::Decimal128(_) => ElementType::Decimal128,
            Bson::MaxKey => ElementType::MaxKey,
            Bson::MinKey => ElementType::MinKey,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Bson::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// Doubles compare by bit pattern so that `NaN` payloads survive a round
/// trip and compare equal to themselves.
impl PartialEq for Bson {
    fn eq(&self, other: &Self) -> bool {
        use Bson::*;
        match (self, other) {
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) | (JavaScriptCode(a), JavaScriptCode(b)) | (Symbol(a), Symbol(b)) => {
                a == b
            }
            (Document(a), Document(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Binary(a), Binary(b)) => a == b,
            (ObjectId(a), ObjectId(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (RegularExpression(a), RegularExpression(b)) => a == b,
            (DbPointer(a), DbPointer(b)) => a == b,
            (JavaScriptCodeWithScope(a), JavaScriptCodeWithScope(b)) => a == b,
            (Int32(a), Int32(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Decimal128(a), Decimal128(b)) => a == b,
            (Undefined, Undefined) | (Null, Null) | (MaxKey, MaxKey) | (MinKey, MinKey) => true,
            _ => false,
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Bson {
                fn from(v: $t) -> Self {
                    Bson::$variant(v)
                }
            }
        )*
    };
}

impl_from!(
    f64 => Double,
    String => String,
    Document => Document,
    Binary => Binary,
    ObjectId => ObjectId,
    bool => Boolean,
    DateTime => DateTime,
    Regex => RegularExpression,
    DbPointer => DbPointer,
    JavaScriptCodeWithScope => JavaScriptCodeWithScope,
    i32 => Int32,
    Timestamp => Timestamp,
    i64 => Int64,
    Decimal128 => Decimal128,
);

impl From<f32> for Bson {
    fn from(v: f32) -> Self {
        Bson::Double(f64::from(v))
    }
}

impl From<&str> for Bson {
    fn from(s: &str) -> Self {
        Bson::String(String::from(s))
    }
}

impl From<&String> for Bson {
    fn from(s: &String) -> Self {
        Bson::String(s.clone())
    }
}

impl<T: Into<Bson>> From<Vec<T>> for Bson {
    fn from(values: Vec<T>) -> Self {
        Bson::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Bson>> From<Option<T>> for Bson {
    fn from(value: Option<T>) -> Self {
        value.map_or(Bson::Null, Into::into)
    }
}

impl From<&Bson> for Bson {
    fn from(value: &Bson) -> Self {
        value.clone()
    }
}

/// An ordered map from keys to [`Bson`] values.
///
/// Keys keep their insertion order. Documents decoded from the wire keep
/// duplicate keys exactly as they appeared; [`Document::get`] returns the
/// first match.
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<(String, Bson)>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. An existing entry is replaced in place and its
    /// old value returned; otherwise the entry is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Appends without checking for an existing entry under `key`.
    pub(crate) fn push(&mut self, key: String, value: Bson) {
        self.entries.push((key, value));
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Bson> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Bson> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes the first entry under `key`, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Bson> {
        let at = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(at).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Bson)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Encodes the document.
    ///
    /// # Errors
    ///
    /// [`Error::BuilderMisuse`] if a key or regex contains a NUL byte, or
    /// the encoding grows past the size limit.
    pub fn encode(&self) -> Result<DocumentValue> {
        let mut builder = Builder::new();
        for (key, value) in &self.entries {
            builder.append(key, value)?;
        }
        builder.finalize()
    }

    /// Decodes a view with default options.
    ///
    /// # Errors
    ///
    /// Any decoding error in the document or its descendants.
    pub fn decode(view: DocumentView<'_>) -> Result<Self> {
        Self::decode_with(view, &DecodeOptions::default())
    }

    /// # Errors
    ///
    /// Any decoding error, or [`CodecErrorKind::MaxDepthExceeded`] when
    /// nesting goes deeper than `options.max_depth`.
    pub fn decode_with(view: DocumentView<'_>, options: &DecodeOptions) -> Result<Self> {
        Self::decode_nested(view, options, 0)
    }

    pub(crate) fn decode_nested(
        view: DocumentView<'_>,
        options: &DecodeOptions,
        depth: usize,
    ) -> Result<Self> {
        if depth > options.max_depth {
            return Err(view.error_here(CodecErrorKind::MaxDepthExceeded).into());
        }
        let mut entries = Vec::new();
        for el in view {
            let el = el?;
            let value = el.value()?.to_bson_with(options, depth)?;
            entries.push((String::from(el.key_unchecked()), value));
        }
        Ok(Self { entries })
    }

    /// Encodes and renders the document as Extended JSON.
    ///
    /// # Errors
    ///
    /// See [`Document::encode`].
    pub fn to_json(&self, mode: JsonMode) -> Result<String> {
        self.encode()?.to_json(mode)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Bson>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl<K: Into<String>, V: Into<Bson>> Extend<(K, V)> for Document {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = alloc::vec::IntoIter<(String, Bson)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl TryFrom<DocumentView<'_>> for Document {
    type Error = Error;

    fn try_from(view: DocumentView<'_>) -> Result<Self> {
        Self::decode(view)
    }
}

impl TryFrom<&DocumentValue> for Document {
    type Error = Error;

    fn try_from(value: &DocumentValue) -> Result<Self> {
        Self::decode(value.view())
    }
}

// ------------------------------------------------------------------------------------------------
// Encoding
// ------------------------------------------------------------------------------------------------

/// Writes the payload of an owned value. Element headers are the caller's
/// concern.
pub(crate) fn write_bson(buf: &mut ByteBuffer, value: &Bson) -> Result<(), BuilderMisuse> {
    match value {
        Bson::Double(v) => buf.push_f64(*v),
        Bson::String(s) | Bson::JavaScriptCode(s) | Bson::Symbol(s) => write_string(buf, s)?,
        Bson::Document(doc) => write_document(buf, doc.iter())?,
        Bson::Array(values) => write_array(buf, values)?,
        Bson::Binary(b) => write_binary(buf, b.subtype, &b.bytes)?,
        Bson::ObjectId(oid) => buf.push_bytes(oid.as_slice()),
        Bson::Boolean(b) => buf.push_u8(u8::from(*b)),
        Bson::DateTime(dt) => buf.push_i64(dt.timestamp_millis()),
        Bson::RegularExpression(re) => {
            write_cstring(buf, &re.pattern)?;
            write_cstring(buf, &re.options)?;
        }
        Bson::DbPointer(p) => {
            write_string(buf, &p.namespace)?;
            buf.push_bytes(p.id.as_slice());
        }
        Bson::JavaScriptCodeWithScope(cws) => {
            let slot = buf.push_length_slot();
            write_string(buf, &cws.code)?;
            write_document(buf, cws.scope.iter())?;
            patch_length(buf, slot)?;
        }
        Bson::Int32(v) => buf.push_i32(*v),
        Bson::Timestamp(ts) => {
            buf.push_u32(ts.increment);
            buf.push_u32(ts.time);
        }
        Bson::Int64(v) => buf.push_i64(*v),
        Bson::Decimal128(d) => buf.push_bytes(&d.bytes()),
        Bson::Undefined | Bson::Null | Bson::MinKey | Bson::MaxKey => {}
    }
    Ok(())
}

pub(crate) fn write_document<'v, K: AsRef<str>>(
    buf: &mut ByteBuffer,
    entries: impl Iterator<Item = (K, &'v Bson)>,
) -> Result<(), BuilderMisuse> {
    let slot = buf.push_length_slot();
    for (key, value) in entries {
        buf.push_u8(value.element_type() as u8);
        write_cstring(buf, key.as_ref())?;
        write_bson(buf, value)?;
    }
    buf.push_u8(0);
    patch_length(buf, slot)
}

fn write_array(buf: &mut ByteBuffer, values: &[Bson]) -> Result<(), BuilderMisuse> {
    let slot = buf.push_length_slot();
    let mut key = IndexKey::new();
    for (index, value) in values.iter().enumerate() {
        buf.push_u8(value.element_type() as u8);
        write_cstring(buf, key.format(index))?;
        write_bson(buf, value)?;
    }
    buf.push_u8(0);
    patch_length(buf, slot)
}

pub(crate) fn patch_length(buf: &mut ByteBuffer, slot: usize) -> Result<(), BuilderMisuse> {
    let len = i32::try_from(buf.len() - slot).map_err(|_| BuilderMisuse::DocumentTooLarge)?;
    buf.patch_i32(slot, len);
    Ok(())
}
