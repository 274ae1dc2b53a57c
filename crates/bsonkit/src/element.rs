use core::fmt;

use bstr::BStr;

use crate::{
    bson::Bson,
    codec::{self, Span},
    decimal128::Decimal128,
    error::{CodecError, Error, Result},
    oid::ObjectId,
    raw::{BinaryRef, CodeWithScopeRef, DbPointerRef, RawValue, RegexRef},
    spec::ElementType,
    types::{DateTime, Timestamp},
    view::{ArrayView, DocumentView},
};

#[derive(Clone, Copy)]
struct RawElement<'a> {
    /// The containing document.
    span: Span<'a>,
    start: usize,
    key: &'a str,
    tag: ElementType,
    value_start: usize,
    value_end: usize,
}

/// One key/value pair inside a [`DocumentView`], or the unset sentinel
/// returned by failed lookups.
///
/// The element only records where its header and payload sit in the parent
/// buffer; the payload is decoded on every accessor call. Every accessor on
/// the unset element fails with [`Error::UnsetElement`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    raw: Option<RawElement<'a>>,
}

macro_rules! typed_getters {
    ($( $name:ident => $expected:ident, $variant:ident, $ty:ty; )*) => {
        $(
            #[doc = concat!("Decodes the value, which must be of type [`ElementType::", stringify!($expected), "`].")]
            ///
            /// # Errors
            ///
            /// [`Error::UnsetElement`], [`Error::TypeMismatch`], or
            /// [`Error::Codec`] if the payload is malformed.
            pub fn $name(&self) -> Result<$ty> {
                match self.typed(ElementType::$expected)? {
                    RawValue::$variant(v) => Ok(v),
                    other => Err(Error::TypeMismatch {
                        expected: ElementType::$expected,
                        actual: other.element_type(),
                    }),
                }
            }
        )*
    };
}

macro_rules! unit_getters {
    ($( $name:ident => $expected:ident; )*) => {
        $(
            #[doc = concat!("Succeeds if the value is of type [`ElementType::", stringify!($expected), "`].")]
            ///
            /// # Errors
            ///
            /// [`Error::UnsetElement`] or [`Error::TypeMismatch`].
            pub fn $name(&self) -> Result<()> {
                self.typed(ElementType::$expected).map(|_| ())
            }
        )*
    };
}

impl<'a> Element<'a> {
    pub(crate) fn new(
        span: Span<'a>,
        start: usize,
        key: &'a str,
        tag: ElementType,
        value_start: usize,
        value_end: usize,
    ) -> Self {
        Self {
            raw: Some(RawElement {
                span,
                start,
                key,
                tag,
                value_start,
                value_end,
            }),
        }
    }

    /// The sentinel for "no such element".
    #[must_use]
    pub const fn unset() -> Self {
        Self { raw: None }
    }

    /// `false` for the unset sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.raw.is_some()
    }

    fn raw(&self) -> Result<&RawElement<'a>> {
        self.raw.as_ref().ok_or(Error::UnsetElement)
    }

    /// Key of an element produced by iteration, which is always set.
    pub(crate) fn key_unchecked(&self) -> &'a str {
        self.raw.as_ref().map_or("", |raw| raw.key)
    }

    /// # Errors
    ///
    /// [`Error::UnsetElement`].
    pub fn key(&self) -> Result<&'a str> {
        self.raw().map(|raw| raw.key)
    }

    /// # Errors
    ///
    /// [`Error::UnsetElement`].
    pub fn key_bytes(&self) -> Result<&'a BStr> {
        self.raw().map(|raw| BStr::new(raw.key))
    }

    /// # Errors
    ///
    /// [`Error::UnsetElement`].
    pub fn element_type(&self) -> Result<ElementType> {
        self.raw().map(|raw| raw.tag)
    }

    /// The encoded element: type tag, key and payload.
    ///
    /// # Errors
    ///
    /// [`Error::UnsetElement`].
    pub fn raw_bytes(&self) -> Result<&'a [u8]> {
        self.raw().map(|raw| &raw.span.bytes[raw.start..raw.value_end])
    }

    /// Just the payload bytes.
    ///
    /// # Errors
    ///
    /// [`Error::UnsetElement`].
    pub fn value_bytes(&self) -> Result<&'a [u8]> {
        self.raw()
            .map(|raw| &raw.span.bytes[raw.value_start..raw.value_end])
    }

    /// Absolute offset of the type tag within the outermost buffer.
    ///
    /// # Errors
    ///
    /// [`Error::UnsetElement`].
    pub fn offset(&self) -> Result<usize> {
        self.raw().map(|raw| raw.span.base + raw.start)
    }

    /// Decodes the payload.
    ///
    /// # Errors
    ///
    /// [`Error::UnsetElement`] or [`Error::Codec`].
    pub fn value(&self) -> Result<RawValue<'a>> {
        let raw = self.raw()?;
        Ok(codec::decode_payload(
            &raw.span,
            raw.tag,
            raw.value_start,
            raw.value_end,
        )?)
    }

    fn typed(&self, expected: ElementType) -> Result<RawValue<'a>> {
        let actual = self.element_type()?;
        if actual != expected {
            return Err(Error::TypeMismatch { expected, actual });
        }
        self.value()
    }

    typed_getters! {
        get_double => Double, Double, f64;
        get_string => String, String, &'a str;
        get_document => EmbeddedDocument, Document, DocumentView<'a>;
        get_array => Array, Array, ArrayView<'a>;
        get_binary => Binary, Binary, BinaryRef<'a>;
        get_oid => ObjectId, ObjectId, ObjectId;
        get_bool => Boolean, Boolean, bool;
        get_date => DateTime, DateTime, DateTime;
        get_regex => RegularExpression, RegularExpression, RegexRef<'a>;
        get_dbpointer => DbPointer, DbPointer, DbPointerRef<'a>;
        get_code => JavaScriptCode, JavaScriptCode, &'a str;
        get_symbol => Symbol, Symbol, &'a str;
        get_codewscope => JavaScriptCodeWithScope, JavaScriptCodeWithScope, CodeWithScopeRef<'a>;
        get_int32 => Int32, Int32, i32;
        get_timestamp => Timestamp, Timestamp, Timestamp;
        get_int64 => Int64, Int64, i64;
        get_decimal128 => Decimal128, Decimal128, Decimal128;
    }

    unit_getters! {
        get_undefined => Undefined;
        get_null => Null;
        get_maxkey => MaxKey;
        get_minkey => MinKey;
    }

    /// Looks up `key` inside this element's embedded document. Yields the
    /// unset element if this element is unset, is not a document or array,
    /// or has no such key.
    #[must_use]
    pub fn get(&self, key: &str) -> Element<'a> {
        match self.value() {
            Ok(RawValue::Document(d)) => d.get(key),
            Ok(RawValue::Array(a)) => a.as_document().get(key),
            _ => Element::unset(),
        }
    }

    /// Looks up `index` inside this element's array (or array-shaped
    /// document).
    #[must_use]
    pub fn at(&self, index: usize) -> Element<'a> {
        match self.value() {
            Ok(RawValue::Array(a)) => a.get(index),
            Ok(RawValue::Document(d)) => ArrayView::from(d).get(index),
            _ => Element::unset(),
        }
    }

    /// Copies the value into the owned model.
    ///
    /// # Errors
    ///
    /// [`Error::UnsetElement`] or any decoding error in the value.
    pub fn to_bson(&self) -> Result<Bson> {
        self.value()?.to_bson()
    }

    /// Checks the payload for full validation and returns any nested
    /// document that still needs walking.
    pub(crate) fn validate_payload(
        &self,
        strict_utf8: bool,
    ) -> Result<Option<DocumentView<'a>>, CodecError> {
        let Some(raw) = self.raw.as_ref() else {
            return Ok(None);
        };
        if !strict_utf8 {
            return codec::check_structure(&raw.span, raw.tag, raw.value_start, raw.value_end);
        }
        Ok(
            match codec::decode_payload(&raw.span, raw.tag, raw.value_start, raw.value_end)? {
                RawValue::Document(d) => Some(d),
                RawValue::Array(a) => Some(a.as_document()),
                RawValue::JavaScriptCodeWithScope(cws) => Some(cws.scope),
                _ => None,
            },
        )
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            None => f.write_str("Element(unset)"),
            Some(raw) => f
                .debug_struct("Element")
                .field("key", &raw.key)
                .field("type", &raw.tag)
                .field("offset", &(raw.span.base + raw.start))
                .finish(),
        }
    }
}
